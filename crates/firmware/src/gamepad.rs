//! Receives button frames from the gamepad co-processor.
//!
//! The co-processor owns pairing and polling of the Bluetooth controller and streams
//! fixed three-byte frames: a sync byte, then the 16-bit little-endian button bitmap.
//! This side only parses and republishes. Staleness is the disconnection signal; the
//! co-processor stops sending when the controller drops off.

use defmt::*;
use embassy_stm32::{mode::Async, usart::UartRx};
use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex,
    watch::{AnonReceiver, Sender, Watch},
};
use embassy_time::{Duration, Instant};
use solfapad_lib::gamepad::ButtonSnapshot;

/// First byte of every link frame.
const FRAME_SYNC: u8 = 0xA5;

/// Frames older than this mean the controller is disconnected.
const LINK_TIMEOUT: Duration = Duration::from_millis(500);

/// The latest button snapshot and when it arrived.
#[derive(Clone, Copy)]
pub struct GamepadFrame {
    pub buttons: ButtonSnapshot,
    pub seen: Instant,
}

impl GamepadFrame {
    /// Whether the frame is fresh enough to treat the controller as connected.
    pub fn is_fresh(&self) -> bool {
        self.seen.elapsed() <= LINK_TIMEOUT
    }
}

const GAMEPAD_RECEIVER_CNT: usize = 0;
/// Syncs the latest gamepad frame across tasks.
pub static GAMEPAD_SYNC: Watch<CriticalSectionRawMutex, GamepadFrame, GAMEPAD_RECEIVER_CNT> =
    Watch::new();
pub type GamepadSender<'a> =
    Sender<'a, CriticalSectionRawMutex, GamepadFrame, GAMEPAD_RECEIVER_CNT>;
pub type GamepadSpy<'a> =
    AnonReceiver<'a, CriticalSectionRawMutex, GamepadFrame, GAMEPAD_RECEIVER_CNT>;

/// Task that parses link frames and publishes fresh snapshots.
#[embassy_executor::task]
pub async fn gamepad_link(mut rx: UartRx<'static, Async>, frames: GamepadSender<'static>) -> ! {
    let mut sync = [0_u8; 1];
    let mut bitmap = [0_u8; 2];
    loop {
        if let Err(_) = rx.read(&mut sync).await {
            warn!("Gamepad link read failed, resynchronizing");
            continue;
        }
        if sync[0] != FRAME_SYNC {
            continue;
        }
        if let Err(_) = rx.read(&mut bitmap).await {
            warn!("Gamepad link dropped a frame body");
            continue;
        }
        frames.send(GamepadFrame {
            buttons: ButtonSnapshot::from_bits(u16::from_le_bytes(bitmap)),
            seen: Instant::now(),
        });
    }
}
