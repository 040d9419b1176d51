//! Pure lookup tables keyed by pitch class and octave.
//!
//! The eVY1 sings whatever phoneme string the most recent lyric SysEx carried, so each
//! of the twelve pitch classes is paired with the solmization syllable a singer would
//! use for it, spelled in the synthesizer's phonetic alphabet. The octave-to-color
//! table feeds the note indicator on the display collaborator and has no effect on the
//! MIDI output.

use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive as _;
use wmidi::Note;
#[cfg(test)]
use wmidi::U7;

/// The twelve pitch classes of the chromatic scale, C through B.
#[derive(Debug, Copy, Clone, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum KeyClass {
    C,
    Cs,
    D,
    Ds,
    E,
    F,
    Fs,
    G,
    Gs,
    A,
    As,
    B,
}

/// Solmization syllables in the eVY1 phonetic alphabet, one per pitch class.
///
/// Chromatic neighbors borrow the vowel of the syllable below them ("d e" is a raised
/// "d o"), which keeps accidentals singable without a second table.
const LYRICS: [&str; 12] = [
    "d o", "d e", "4 e", "4' i", "m' i", "p\\ a", "p\\' i", "s o", "s a", "4 a", "tS i", "S i",
];

/// Display spellings, one per pitch class.
const NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

impl KeyClass {
    /// The pitch class of an absolute note.
    pub fn of(note: Note) -> Self {
        Self::from_u8(note as u8 % 12).expect("a twelve-tone remainder is always a pitch class")
    }

    /// The phoneme string sung for this pitch class.
    pub fn lyric(self) -> &'static str {
        LYRICS[self as usize]
    }

    /// The display spelling of this pitch class.
    pub fn name(self) -> &'static str {
        NAMES[self as usize]
    }
}

/// The scientific octave a note is displayed in (middle C is octave 4).
pub fn display_octave(note: Note) -> i8 {
    (note as u8 / 12) as i8 - 1
}

/// An RGB color triple for the note indicator.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rgb {
    /// Red component.
    pub r: u8,
    /// Green component.
    pub g: u8,
    /// Blue component.
    pub b: u8,
}

impl Rgb {
    /// Scales brightness linearly with a display velocity, saturating at
    /// [`VELOCITY_SATURATION`] so an ordinary onset already renders at full brightness.
    pub fn dimmed(self, velocity: u8) -> Self {
        let v = u16::from(velocity.min(VELOCITY_SATURATION));
        let scale = |component: u8| (u16::from(component) * v / u16::from(VELOCITY_SATURATION)) as u8;
        Self {
            r: scale(self.r),
            g: scale(self.g),
            b: scale(self.b),
        }
    }
}

/// Display velocities at or above this value render at full brightness.
pub const VELOCITY_SATURATION: u8 = 16;

/// Indicator colors for octaves 3 through 6: orange, yellow, green, cyan.
const OCTAVE_COLORS: [Rgb; 4] = [
    Rgb { r: 0xFF, g: 0xA5, b: 0x00 },
    Rgb { r: 0xFF, g: 0xFF, b: 0x00 },
    Rgb { r: 0x00, g: 0xFF, b: 0x00 },
    Rgb { r: 0x00, g: 0xFF, b: 0xFF },
];

/// The indicator color for an octave.
///
/// Octaves outside the charted 3..=6 span clamp to the nearest end of the table;
/// transposition can push the root a full octave past the untransposed range.
pub fn octave_color(octave: i8) -> Rgb {
    let index = (i16::from(octave) - 3).clamp(0, OCTAVE_COLORS.len() as i16 - 1);
    OCTAVE_COLORS[index as usize]
}
