//! Wire encoding for the MIDI messages the device emits.
//!
//! The encoder is stateless: each message knows its own exact byte sequence. The
//! lyric SysEx framing is a compatibility contract with the eVY1 and must not change.

use crate::pitch::KeyClass;
use wmidi::{Channel, Note, U7};

/// The messages this device puts on the wire.
///
/// Messages are immutable once constructed and consumed exactly once by the
/// transport.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MidiMessage {
    /// Starts a voice sounding.
    NoteOn {
        /// Output channel.
        channel: Channel,
        /// Absolute note number.
        note: Note,
        /// Onset velocity.
        velocity: U7,
    },
    /// Stops a sounding voice.
    NoteOff {
        /// Output channel.
        channel: Channel,
        /// Absolute note number.
        note: Note,
        /// Release velocity.
        velocity: U7,
    },
    /// Loads a synthesizer program onto a channel.
    ProgramChange {
        /// Output channel.
        channel: Channel,
        /// Program number.
        program: U7,
    },
    /// Hands the singing synthesizer the phoneme for the next onset.
    Lyric(KeyClass),
}

/// Largest encoded message: the SysEx framing plus the longest phoneme payload.
pub const MAX_WIRE_BYTES: usize = 16;

/// Vendor header of the lyric SysEx, through the phonetic-lyric function code.
const LYRIC_HEADER: [u8; 7] = [0xF0, 0x43, 0x79, 0x09, 0x00, 0x50, 0x10];

/// Payload terminator and end-of-exclusive.
const LYRIC_FOOTER: [u8; 2] = [0x00, 0xF7];

impl MidiMessage {
    /// Encodes the message into `buf`, returning the number of bytes written.
    pub fn copy_to_slice(&self, buf: &mut [u8; MAX_WIRE_BYTES]) -> usize {
        match *self {
            Self::NoteOn {
                channel,
                note,
                velocity,
            } => {
                buf[0] = 0x90 | channel.index();
                buf[1] = note as u8;
                buf[2] = u8::from(velocity);
                3
            }
            Self::NoteOff {
                channel,
                note,
                velocity,
            } => {
                buf[0] = 0x80 | channel.index();
                buf[1] = note as u8;
                buf[2] = u8::from(velocity);
                3
            }
            Self::ProgramChange { channel, program } => {
                buf[0] = 0xC0 | channel.index();
                buf[1] = u8::from(program);
                2
            }
            Self::Lyric(key) => {
                let phoneme = key.lyric().as_bytes();
                let end = LYRIC_HEADER.len() + phoneme.len();
                buf[..LYRIC_HEADER.len()].copy_from_slice(&LYRIC_HEADER);
                buf[LYRIC_HEADER.len()..end].copy_from_slice(phoneme);
                buf[end..end + LYRIC_FOOTER.len()].copy_from_slice(&LYRIC_FOOTER);
                end + LYRIC_FOOTER.len()
            }
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for MidiMessage {
    fn format(&self, fmt: defmt::Formatter) {
        match *self {
            Self::NoteOn {
                channel,
                note,
                velocity,
            } => defmt::write!(
                fmt,
                "NoteOn ch{} {} vel {}",
                channel.number(),
                note.to_str(),
                u8::from(velocity)
            ),
            Self::NoteOff {
                channel,
                note,
                velocity,
            } => defmt::write!(
                fmt,
                "NoteOff ch{} {} vel {}",
                channel.number(),
                note.to_str(),
                u8::from(velocity)
            ),
            Self::ProgramChange { channel, program } => defmt::write!(
                fmt,
                "ProgramChange ch{} program {}",
                channel.number(),
                u8::from(program)
            ),
            Self::Lyric(key) => defmt::write!(fmt, "Lyric \"{}\"", key.lyric()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::FromPrimitive as _;

    fn encoded(message: MidiMessage) -> ([u8; MAX_WIRE_BYTES], usize) {
        let mut buf = [0; MAX_WIRE_BYTES];
        let len = message.copy_to_slice(&mut buf);
        (buf, len)
    }

    #[test]
    fn note_on_is_three_bytes() {
        let (buf, len) = encoded(MidiMessage::NoteOn {
            channel: Channel::Ch1,
            note: Note::C4,
            velocity: U7::from_u8_lossy(0x7F),
        });
        assert_eq!(&[0x90, 60, 0x7F], &buf[..len]);
    }

    #[test]
    fn note_off_carries_the_channel_in_the_status_byte() {
        let (buf, len) = encoded(MidiMessage::NoteOff {
            channel: Channel::Ch4,
            note: Note::G4,
            velocity: U7::from_u8_lossy(0),
        });
        assert_eq!(&[0x83, 67, 0x00], &buf[..len]);
    }

    #[test]
    fn program_change_is_two_bytes() {
        let (buf, len) = encoded(MidiMessage::ProgramChange {
            channel: Channel::Ch2,
            program: U7::from_u8_lossy(19),
        });
        assert_eq!(&[0xC1, 19], &buf[..len]);
    }

    #[test]
    fn lyric_sysex_frames_the_phoneme() {
        let (buf, len) = encoded(MidiMessage::Lyric(KeyClass::C));
        assert_eq!(
            &[0xF0, 0x43, 0x79, 0x09, 0x00, 0x50, 0x10, b'd', b' ', b'o', 0x00, 0xF7],
            &buf[..len]
        );
    }

    #[test]
    fn every_phoneme_fits_the_wire_buffer() {
        for index in 0..12 {
            let key = KeyClass::from_u8(index).unwrap();
            let (_, len) = encoded(MidiMessage::Lyric(key));
            assert!(len <= MAX_WIRE_BYTES, "{} overflows", key.lyric());
        }
    }
}
