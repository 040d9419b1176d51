use num_derive::{FromPrimitive, ToPrimitive};

/// The menu cursor, advanced one field per menu press.
///
/// While hidden, value events are ignored and the display renders no highlight.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, ToPrimitive, FromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Cursor {
    /// No field selected; the performer is playing, not editing.
    #[default]
    Hidden,
    /// Editing the timbre selection.
    Tone,
    /// Editing the transposition, named for the key change it produces.
    Scale,
    /// Editing the master volume.
    Volume,
}

impl super::CycleConfig for Cursor {}
