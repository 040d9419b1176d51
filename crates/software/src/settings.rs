//! The operator-adjustable settings store and its menu state machine.
//!
//! All four fields live behind a single mutation point so the range invariants hold
//! everywhere else by construction: the tone index stays in its table, transposition
//! within plus or minus one octave, volume within the fader range. Consumers that
//! render or forward settings pull change flags rather than diffing values.

mod cursor;
pub use cursor::*;

mod tone;
pub use tone::*;

use num_traits::{FromPrimitive, ToPrimitive};

/// A trait which allows infinite cycling of an enum's variants.
///
/// Useful for pushbutton user interfaces, allowing presses to advance from the current
/// to the next variant, cycling back to the beginning when all variants have been
/// exhausted.
pub trait CycleConfig {
    /// Return the next variant, cycling back to the beginning as needed.
    fn cycle(self) -> Self
    where
        Self: FromPrimitive + ToPrimitive + Sized,
    {
        let index = self
            .to_u8()
            .expect("enum variants should be castable to u8");
        match <Self as FromPrimitive>::from_u8(index + 1) {
            Some(new_selection) => new_selection,
            None => FromPrimitive::from_u8(0).expect("enum should not be empty"),
        }
    }
}

/// Transposition never exceeds one octave in either direction.
pub const TRANSPOSE_MAX: i8 = 12;

/// Top of the master volume fader. Maps to the full MIDI velocity range
/// (`32 * 4 - 1 == 127`).
pub const VOLUME_MAX: u8 = 32;

/// The live performance settings.
///
/// Written only through [`advance_cursor`][Self::advance_cursor] and
/// [`adjust`][Self::adjust]; the chord engine and the display read it. Two
/// independent change flags track what has to leave the store: a display repaint,
/// and a program change for the synthesizer. Each is consumed by exactly one sink.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    tone: ToneSelect,
    transpose: i8,
    volume: u8,
    cursor: Cursor,
    changed_display: bool,
    changed_program: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tone: ToneSelect::Vocal,
            transpose: 0,
            volume: VOLUME_MAX,
            cursor: Cursor::Hidden,
            // the first paint renders the defaults
            changed_display: true,
            changed_program: false,
        }
    }
}

impl Settings {
    /// The selected timbre.
    pub fn tone(&self) -> ToneSelect {
        self.tone
    }

    /// Transposition in semitones, within `[-TRANSPOSE_MAX, TRANSPOSE_MAX]`.
    pub fn transpose(&self) -> i8 {
        self.transpose
    }

    /// Master volume, within `[0, VOLUME_MAX]`.
    pub fn volume(&self) -> u8 {
        self.volume
    }

    /// The menu cursor position.
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// MIDI velocity of the lead voice at the current master volume.
    pub fn lead_velocity(&self) -> u8 {
        if self.volume > 0 { self.volume * 4 - 1 } else { 0 }
    }

    /// Advances the menu cursor to the next field, wrapping to hidden after volume.
    pub fn advance_cursor(&mut self) {
        self.cursor = self.cursor.cycle();
        self.changed_display = true;
    }

    /// Nudges the field under the cursor by `delta`, clamping to the field's range.
    ///
    /// Ignored while the cursor is hidden. A tone edit additionally queues a program
    /// change for the synthesizer.
    pub fn adjust(&mut self, delta: i8) {
        match self.cursor {
            Cursor::Hidden => {}
            Cursor::Tone => {
                let stepped = self.tone.stepped(delta);
                if stepped != self.tone {
                    self.tone = stepped;
                    self.changed_display = true;
                    self.changed_program = true;
                }
            }
            Cursor::Scale => {
                let clamped = self
                    .transpose
                    .saturating_add(delta)
                    .clamp(-TRANSPOSE_MAX, TRANSPOSE_MAX);
                if clamped != self.transpose {
                    self.transpose = clamped;
                    self.changed_display = true;
                }
            }
            Cursor::Volume => {
                let clamped = self.volume.saturating_add_signed(delta).min(VOLUME_MAX);
                if clamped != self.volume {
                    self.volume = clamped;
                    self.changed_display = true;
                }
            }
        }
    }

    /// Consumes the display change flag; `true` means a repaint is due.
    pub fn take_display_change(&mut self) -> bool {
        core::mem::take(&mut self.changed_display)
    }

    /// Consumes the pending program change, if a tone edit queued one.
    pub fn take_program_change(&mut self) -> Option<ToneSelect> {
        if self.changed_program {
            self.changed_program = false;
            Some(self.tone)
        } else {
            None
        }
    }
}
