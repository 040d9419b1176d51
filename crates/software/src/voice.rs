//! The chord engine: owns the sounding triad and turns note events into ordered
//! transport batches.
//!
//! Every onset silences whatever sounded before it, waits out the synthesizer's
//! settling time, hands over the lyric for the new root, waits again, and only then
//! starts the new voices. The engine expresses those gaps as explicit [`Command`]
//! entries so the transport owns the waiting and the logic stays host-testable.

use crate::gamepad::ScaleStep;
use crate::midi::MidiMessage;
use crate::pitch::{self, KeyClass};
use crate::settings::Settings;
use embassy_time::Duration;
use tinyvec::ArrayVec;
use wmidi::{Channel, Note, U7};

/// Minimum gap the synthesizer needs between a silence batch and the bytes that
/// follow it, and between the lyric SysEx and the note-on batch.
pub const SETTLE_GAP: Duration = Duration::from_millis(10);

/// Largest batch one operation emits: four note-offs, two settle gaps, the lyric,
/// and up to four note-ons.
pub const COMMAND_QUEUE_DEPTH: usize = 12;

/// The channel the eVY1 sings on.
const VOCAL_CHANNEL: Channel = Channel::Ch1;

/// The instrument channels carrying the triad: root, third, fifth.
const CHORD_CHANNELS: [Channel; 3] = [Channel::Ch2, Channel::Ch3, Channel::Ch4];

/// Untransposed tonic of the button layout.
const TONIC: i16 = Note::C4 as i16;

const MAJOR_THIRD: u8 = 4;
const PERFECT_FIFTH: u8 = 7;

/// Release velocity of the silence batch that precedes a retrigger.
const RETRIGGER_RELEASE: U7 = U7::from_u8_lossy(0);

/// Release velocity of a panic.
const PANIC_RELEASE: U7 = U7::from_u8_lossy(0x7F);

/// Display velocity reported for a fresh onset.
const DISPLAY_VELOCITY: u8 = 0x7F;

/// One entry of an ordered transport batch.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Command {
    /// Encode and write a message.
    Send(MidiMessage),
    /// Hold the line idle for at least this long before the next entry.
    Settle(Duration),
}

// tinyvec requires that items implement `Default`; a zero-length settle is inert if
// a default value ever leaks into a batch.
impl Default for Command {
    fn default() -> Self {
        Self::Settle(Duration::from_ticks(0))
    }
}

/// The ordered output of one engine operation.
pub type CommandQueue = ArrayVec<[Command; COMMAND_QUEUE_DEPTH]>;

/// Display summary of the most recent onset.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NoteIndicator {
    /// Pitch class of the sounding root.
    pub key: KeyClass,
    /// Scientific octave of the root, selecting the indicator color.
    pub octave: i8,
    /// Display velocity: full while sounding, zero after a panic.
    pub velocity: u8,
}

/// The sounding triad. Replaced whole on every onset, never edited in place: the old
/// notes are explicitly silenced before the new ones are stored.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct ActiveChord {
    root: Note,
    third: Note,
    fifth: Note,
}

impl ActiveChord {
    /// The per-channel silence batch for this chord.
    ///
    /// All four output channels are released regardless of which the onset's timbre
    /// actually routed to; releasing a silent channel is harmless and keeps the
    /// batch independent of tone edits made while the chord rang.
    fn note_offs(self, velocity: U7) -> [MidiMessage; 4] {
        [
            MidiMessage::NoteOff {
                channel: VOCAL_CHANNEL,
                note: self.root,
                velocity,
            },
            MidiMessage::NoteOff {
                channel: CHORD_CHANNELS[0],
                note: self.root,
                velocity,
            },
            MidiMessage::NoteOff {
                channel: CHORD_CHANNELS[1],
                note: self.third,
                velocity,
            },
            MidiMessage::NoteOff {
                channel: CHORD_CHANNELS[2],
                note: self.fifth,
                velocity,
            },
        ]
    }
}

/// The note state machine. One instance lives on the control task; nothing else
/// touches the sounding chord.
#[derive(Debug, Default)]
pub struct VoiceEngine {
    chord: Option<ActiveChord>,
    indicator: Option<NoteIndicator>,
    indicator_stale: bool,
}

impl VoiceEngine {
    /// An engine with nothing sounding and nothing to display.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles a note trigger: silences the previous chord, then sounds the new one
    /// according to the live settings.
    ///
    /// A trigger whose chord would leave the MIDI note range is dropped whole: no
    /// messages, no state change. The caller may simply play on.
    pub fn trigger(
        &mut self,
        step: ScaleStep,
        octave_shift: i8,
        semitone_shift: i8,
        settings: &Settings,
    ) -> CommandQueue {
        let mut batch = CommandQueue::new();

        let root = TONIC
            + i16::from(step.semitones())
            + i16::from(semitone_shift)
            + 12 * i16::from(octave_shift)
            + i16::from(settings.transpose());
        if root < 0 || root + i16::from(PERFECT_FIFTH) > 0x7F {
            #[cfg(feature = "defmt")]
            defmt::warn!("chord on root {} leaves the MIDI note range, dropped", root);
            return batch;
        }
        let root = root as u8;

        if let Some(previous) = self.chord {
            for message in previous.note_offs(RETRIGGER_RELEASE) {
                batch.push(Command::Send(message));
            }
            batch.push(Command::Settle(SETTLE_GAP));
        }

        let chord = ActiveChord {
            root: Note::from(U7::from_u8_lossy(root)),
            third: Note::from(U7::from_u8_lossy(root + MAJOR_THIRD)),
            fifth: Note::from(U7::from_u8_lossy(root + PERFECT_FIFTH)),
        };
        let key = KeyClass::of(chord.root);

        batch.push(Command::Send(MidiMessage::Lyric(key)));
        batch.push(Command::Settle(SETTLE_GAP));

        let lead = settings.lead_velocity();
        let backing = U7::from_u8_lossy((u16::from(lead) * 3 / 4) as u8);
        let lead = U7::from_u8_lossy(lead);
        let tone = settings.tone();
        if tone.vocal_lead() {
            batch.push(Command::Send(MidiMessage::NoteOn {
                channel: VOCAL_CHANNEL,
                note: chord.root,
                velocity: lead,
            }));
        }
        if tone.chord_backing() {
            for (channel, note) in CHORD_CHANNELS
                .into_iter()
                .zip([chord.root, chord.third, chord.fifth])
            {
                batch.push(Command::Send(MidiMessage::NoteOn {
                    channel,
                    note,
                    velocity: backing,
                }));
            }
        }
        if tone.instrument_lead() {
            batch.push(Command::Send(MidiMessage::NoteOn {
                channel: CHORD_CHANNELS[0],
                note: chord.root,
                velocity: lead,
            }));
        }

        self.chord = Some(chord);
        self.indicator = Some(NoteIndicator {
            key,
            octave: pitch::display_octave(chord.root),
            velocity: DISPLAY_VELOCITY,
        });
        self.indicator_stale = true;

        batch
    }

    /// Handles a panic: releases every voice of the sounding chord at full velocity.
    ///
    /// With nothing sounding this is a no-op, so holding the panic chord across many
    /// ticks emits the release batch exactly once.
    pub fn all_notes_off(&mut self) -> CommandQueue {
        let mut batch = CommandQueue::new();
        let Some(previous) = self.chord.take() else {
            return batch;
        };
        for message in previous.note_offs(PANIC_RELEASE) {
            batch.push(Command::Send(message));
        }
        if let Some(indicator) = &mut self.indicator {
            indicator.velocity = 0;
            self.indicator_stale = true;
        }
        batch
    }

    /// Consumes the display summary if it changed since the last call.
    pub fn take_indicator(&mut self) -> Option<NoteIndicator> {
        if self.indicator_stale {
            self.indicator_stale = false;
            self.indicator
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ToneSelect;

    fn note(number: u8) -> Note {
        Note::from(U7::from_u8_lossy(number))
    }

    fn on(channel: Channel, number: u8, velocity: u8) -> Command {
        Command::Send(MidiMessage::NoteOn {
            channel,
            note: note(number),
            velocity: U7::from_u8_lossy(velocity),
        })
    }

    fn off(channel: Channel, number: u8, velocity: u8) -> Command {
        Command::Send(MidiMessage::NoteOff {
            channel,
            note: note(number),
            velocity: U7::from_u8_lossy(velocity),
        })
    }

    fn lyric(key: KeyClass) -> Command {
        Command::Send(MidiMessage::Lyric(key))
    }

    fn settle() -> Command {
        Command::Settle(SETTLE_GAP)
    }

    /// Builds settings through the public mutation path: cursor to the tone field,
    /// then step `tone_index` times.
    fn settings_with_tone(tone_index: i8) -> Settings {
        let mut settings = Settings::default();
        settings.advance_cursor();
        for _ in 0..tone_index {
            settings.adjust(1);
        }
        settings
    }

    #[test]
    fn first_trigger_skips_the_silence_batch() {
        let mut engine = VoiceEngine::new();
        let batch = engine.trigger(ScaleStep::Do, 0, 0, &Settings::default());
        assert_eq!(
            &[
                lyric(KeyClass::C),
                settle(),
                on(Channel::Ch1, 60, 127),
            ],
            batch.as_slice()
        );
    }

    #[test]
    fn retrigger_silences_all_four_channels_first() {
        let settings = Settings::default();
        let mut engine = VoiceEngine::new();
        engine.trigger(ScaleStep::Do, 0, 0, &settings);

        let batch = engine.trigger(ScaleStep::Re, 0, 0, &settings);
        assert_eq!(
            &[
                off(Channel::Ch1, 60, 0),
                off(Channel::Ch2, 60, 0),
                off(Channel::Ch3, 64, 0),
                off(Channel::Ch4, 67, 0),
                settle(),
                lyric(KeyClass::D),
                settle(),
                on(Channel::Ch1, 62, 127),
            ],
            batch.as_slice()
        );
    }

    #[test]
    fn retrigger_re_articulates_the_same_pitch() {
        let settings = Settings::default();
        let mut engine = VoiceEngine::new();
        engine.trigger(ScaleStep::Sol, 0, 0, &settings);

        let batch = engine.trigger(ScaleStep::Sol, 0, 0, &settings);
        assert_eq!(off(Channel::Ch1, 67, 0), batch[0]);
        assert_eq!(on(Channel::Ch1, 67, 127), batch[batch.len() - 1]);
    }

    #[test]
    fn chord_is_always_a_major_triad() {
        let settings = settings_with_tone(1);
        let mut engine = VoiceEngine::new();

        let batch = engine.trigger(ScaleStep::Mi, 0, 0, &settings);
        assert_eq!(
            &[
                lyric(KeyClass::E),
                settle(),
                on(Channel::Ch1, 64, 127),
                on(Channel::Ch2, 64, 95),
                on(Channel::Ch3, 68, 95),
                on(Channel::Ch4, 71, 95),
            ],
            batch.as_slice()
        );
    }

    #[test]
    fn chord_only_timbre_skips_the_vocal_channel() {
        let settings = settings_with_tone(2);
        assert_eq!(ToneSelect::PianoChord, settings.tone());
        let mut engine = VoiceEngine::new();

        let batch = engine.trigger(ScaleStep::Do, 0, 0, &settings);
        assert_eq!(
            &[
                lyric(KeyClass::C),
                settle(),
                on(Channel::Ch2, 60, 95),
                on(Channel::Ch3, 64, 95),
                on(Channel::Ch4, 67, 95),
            ],
            batch.as_slice()
        );
    }

    #[test]
    fn instrument_timbres_double_the_lead_onto_the_chord_channel() {
        for tone_index in 3..=5 {
            let settings = settings_with_tone(tone_index);
            let mut engine = VoiceEngine::new();

            let batch = engine.trigger(ScaleStep::La, 0, 0, &settings);
            assert_eq!(
                &[
                    lyric(KeyClass::A),
                    settle(),
                    on(Channel::Ch2, 69, 127),
                ],
                batch.as_slice()
            );
        }
    }

    #[test]
    fn shifts_and_transposition_stack_onto_the_root() {
        let mut settings = Settings::default();
        settings.advance_cursor();
        settings.advance_cursor();
        settings.adjust(1);
        settings.adjust(1);
        assert_eq!(2, settings.transpose());

        let mut engine = VoiceEngine::new();
        // 60 + 0 - 1 - 12 + 2
        let batch = engine.trigger(ScaleStep::Do, -1, -1, &settings);
        assert_eq!(
            &[
                lyric(KeyClass::Cs),
                settle(),
                on(Channel::Ch1, 49, 127),
            ],
            batch.as_slice()
        );
    }

    #[test]
    fn zero_volume_triggers_are_silent_but_complete() {
        let mut settings = Settings::default();
        for _ in 0..3 {
            settings.advance_cursor();
        }
        for _ in 0..40 {
            settings.adjust(-1);
        }
        assert_eq!(0, settings.volume());

        let settings = {
            let mut toned = settings;
            // back around to the tone field for a lead-plus-chord routing
            toned.advance_cursor();
            toned.advance_cursor();
            toned.adjust(1);
            toned
        };

        let mut engine = VoiceEngine::new();
        let batch = engine.trigger(ScaleStep::Do, 0, 0, &settings);
        assert_eq!(
            &[
                lyric(KeyClass::C),
                settle(),
                on(Channel::Ch1, 60, 0),
                on(Channel::Ch2, 60, 0),
                on(Channel::Ch3, 64, 0),
                on(Channel::Ch4, 67, 0),
            ],
            batch.as_slice()
        );
    }

    #[test]
    fn panic_releases_at_full_velocity_exactly_once() {
        let mut engine = VoiceEngine::new();
        engine.trigger(ScaleStep::Ti, 0, 0, &Settings::default());

        let batch = engine.all_notes_off();
        assert_eq!(
            &[
                off(Channel::Ch1, 71, 0x7F),
                off(Channel::Ch2, 71, 0x7F),
                off(Channel::Ch3, 75, 0x7F),
                off(Channel::Ch4, 78, 0x7F),
            ],
            batch.as_slice()
        );

        assert!(engine.all_notes_off().is_empty());
    }

    #[test]
    fn panic_with_nothing_sounding_is_a_no_op() {
        let mut engine = VoiceEngine::new();
        assert!(engine.all_notes_off().is_empty());
        assert_eq!(None, engine.take_indicator());
    }

    #[test]
    fn out_of_range_chord_is_dropped_whole() {
        let settings = Settings::default();
        let mut engine = VoiceEngine::new();
        engine.trigger(ScaleStep::Do, 0, 0, &settings);

        // 60 + 12 + 72 puts the fifth past the top of the note range
        assert!(
            engine
                .trigger(ScaleStep::HighDo, 6, 0, &settings)
                .is_empty()
        );
        // far below zero
        assert!(engine.trigger(ScaleStep::Do, -8, 0, &settings).is_empty());

        // the previous chord still rings: the next onset silences it
        let batch = engine.trigger(ScaleStep::Re, 0, 0, &settings);
        assert_eq!(off(Channel::Ch1, 60, 0), batch[0]);
    }

    #[test]
    fn indicator_tracks_the_latest_onset() {
        let mut engine = VoiceEngine::new();
        assert_eq!(None, engine.take_indicator());

        engine.trigger(ScaleStep::Do, 1, 0, &Settings::default());
        assert_eq!(
            Some(NoteIndicator {
                key: KeyClass::C,
                octave: 5,
                velocity: 0x7F,
            }),
            engine.take_indicator()
        );
        assert_eq!(None, engine.take_indicator());

        engine.all_notes_off();
        assert_eq!(
            Some(NoteIndicator {
                key: KeyClass::C,
                octave: 5,
                velocity: 0,
            }),
            engine.take_indicator()
        );
    }
}
