//! Status rendering: a defmt readout of the menu and the sounding note, plus a
//! cursor-position LED.
//!
//! Rendering runs at its own, slower cadence; the control loop never waits on it.

use crate::SettingsAsyncMutex;
use defmt::*;
use embassy_futures::select::{Either, select};
use embassy_stm32::gpio::Output;
use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex,
    watch::{Receiver, Sender, Watch},
};
use embassy_time::{Duration, Timer};
use solfapad_lib::{pitch::octave_color, settings::Cursor, voice::NoteIndicator};

const INDICATOR_RECEIVER_CNT: usize = 1;
/// Publishes the most recent onset summary for rendering.
pub static INDICATOR_SYNC: Watch<CriticalSectionRawMutex, NoteIndicator, INDICATOR_RECEIVER_CNT> =
    Watch::new();
pub type IndicatorSender<'a> =
    Sender<'a, CriticalSectionRawMutex, NoteIndicator, INDICATOR_RECEIVER_CNT>;
pub type IndicatorReceiver<'a> =
    Receiver<'a, CriticalSectionRawMutex, NoteIndicator, INDICATOR_RECEIVER_CNT>;

/// How often the settings readout looks for changes to repaint.
const SETTINGS_REFRESH: Duration = Duration::from_millis(250);

/// Task rendering the menu fields and the colored note indicator to the defmt log.
#[embassy_executor::task]
pub async fn status_display(
    settings: &'static SettingsAsyncMutex,
    mut indicator: IndicatorReceiver<'static>,
) -> ! {
    loop {
        match select(indicator.changed(), Timer::after(SETTINGS_REFRESH)).await {
            Either::First(note) => {
                let color = octave_color(note.octave).dimmed(note.velocity);
                info!(
                    "Note {} O{} color ({}, {}, {})",
                    note.key.name(),
                    note.octave,
                    color.r,
                    color.g,
                    color.b
                );
            }
            Either::Second(_) => {
                let mut live = settings.lock().await;
                if live.take_display_change() {
                    info!(
                        "Tone: {}  Scale: {}  Volume: {}  Cursor: {}",
                        live.tone().name(),
                        live.transpose(),
                        live.volume(),
                        live.cursor()
                    );
                }
            }
        }
    }
}

/// Provides a quick and dirty indicator for the menu cursor position.
///
/// Each cycle is divided in half. The LED remains dark for one half. For the other,
/// it lights up N times, where N is the index of the selected field; while the cursor
/// is hidden the LED stays dark.
#[embassy_executor::task]
pub async fn cursor_led(mut led: Output<'static>, settings: &'static SettingsAsyncMutex) -> ! {
    const HALF_CYCLE_MS: u64 = 1_000;

    loop {
        led.set_low();
        Timer::after_millis(HALF_CYCLE_MS).await;

        let cursor = { settings.lock().await.cursor() };
        if cursor == Cursor::Hidden {
            continue;
        }
        let blink_cnt = cursor as u8;
        // mult by two to account for the "off" periods, sub 1 so the LED always
        // starts and ends lit
        let animation_frames = blink_cnt * 2 - 1;
        let mut counter = animation_frames;
        while counter > 0 {
            led.toggle();
            Timer::after_millis(HALF_CYCLE_MS / u64::from(animation_frames)).await;
            counter -= 1;
        }
    }
}
