//! The control loop: samples the controller, advances the note and settings state
//! machines, and drives the MIDI line.

use crate::SettingsAsyncMutex;
use crate::display::IndicatorSender;
use crate::gamepad::GamepadSpy;
use defmt::*;
use embassy_stm32::{mode::Async, usart::UartTx};
use embassy_time::{Duration, Timer};
use solfapad_lib::{
    gamepad::{ButtonSnapshot, NoteEvent, detect},
    midi::{MAX_WIRE_BYTES, MidiMessage},
    voice::{Command, CommandQueue, VoiceEngine},
};
use wmidi::Channel;

/// Control tick period. Button edges are observed at this rate, so it must stay at
/// or above the co-processor's frame rate.
const TICK: Duration = Duration::from_millis(10);

/// The eVY1 boots well after the microcontroller and ignores MIDI until it is done.
const SYNTH_BOOT_DELAY: Duration = Duration::from_secs(5);

/// Channels that carry instrument programs. All three are primed at startup; tone
/// edits later retarget only the first, where the lead doubling and the chord root
/// live.
const PROGRAM_CHANNELS: [Channel; 3] = [Channel::Ch2, Channel::Ch3, Channel::Ch4];

/// Task running the per-tick control flow.
#[embassy_executor::task]
pub async fn performance(
    mut midi_tx: UartTx<'static, Async>,
    settings: &'static SettingsAsyncMutex,
    mut gamepad: GamepadSpy<'static>,
    indicator: IndicatorSender<'static>,
) -> ! {
    Timer::after(SYNTH_BOOT_DELAY).await;

    let initial_program = { settings.lock().await.tone().program() };
    for channel in PROGRAM_CHANNELS {
        send(
            &mut midi_tx,
            MidiMessage::ProgramChange {
                channel,
                program: initial_program,
            },
        )
        .await;
    }
    info!("Synthesizer primed, entering the control loop");

    let mut engine = VoiceEngine::new();
    let mut previous = ButtonSnapshot::default();

    loop {
        Timer::after(TICK).await;

        let Some(frame) = gamepad.try_get() else {
            continue;
        };
        if !frame.is_fresh() {
            // disconnected: note generation is suspended, nothing is panicked off
            continue;
        }

        let events = detect(&previous, &frame.buttons);
        previous = frame.buttons;

        let mut batch = CommandQueue::new();
        {
            // the lock covers only the in-memory updates, never the UART writes below
            let mut live = settings.lock().await;
            let mut octave_shift = 0;
            let mut semitone_shift = 0;
            for event in events.iter() {
                match *event {
                    NoteEvent::AllNotesOff => batch = engine.all_notes_off(),
                    NoteEvent::OctaveShift(shift) => octave_shift = shift,
                    NoteEvent::SemitoneShift(shift) => semitone_shift = shift,
                    NoteEvent::Trigger(step) => {
                        batch = engine.trigger(step, octave_shift, semitone_shift, &live);
                    }
                    NoteEvent::MenuAdvance => live.advance_cursor(),
                    NoteEvent::ValueIncrement(delta) => live.adjust(delta),
                }
            }
            if let Some(tone) = live.take_program_change() {
                batch.push(Command::Send(MidiMessage::ProgramChange {
                    channel: PROGRAM_CHANNELS[0],
                    program: tone.program(),
                }));
            }
        }

        if let Some(summary) = engine.take_indicator() {
            indicator.send(summary);
        }

        for command in batch.iter() {
            match *command {
                Command::Send(message) => send(&mut midi_tx, message).await,
                Command::Settle(gap) => Timer::after(gap).await,
            }
        }
    }
}

/// Encodes and writes one message. The line is fire-and-forget; failures are logged
/// and dropped.
async fn send(tx: &mut UartTx<'static, Async>, message: MidiMessage) {
    let mut wire = [0_u8; MAX_WIRE_BYTES];
    let len = message.copy_to_slice(&mut wire);
    info!("TX {}", message);
    if let Err(_) = tx.write(&wire[..len]).await {
        error!("MIDI transmit failed");
    }
}
