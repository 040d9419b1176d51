use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::{FromPrimitive as _, ToPrimitive as _};
use wmidi::U7;

/// The selectable timbres, in fader order.
///
/// The selection decides both the synthesizer program and how onsets are routed
/// across the output channels: the vocal timbres sing the lead on channel 1, the
/// chord timbres add (or substitute) the triad on channels 2 through 4, and the
/// single-voice instrument timbres double the lead onto channel 2, where their
/// program is loaded.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, ToPrimitive, FromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ToneSelect {
    /// Solo voice.
    #[default]
    Vocal,
    /// Voice with a piano triad behind it.
    VocalChord,
    /// Piano triad only.
    PianoChord,
    /// Solo piano.
    Piano,
    /// Solo church organ.
    ChurchOrgan,
    /// Solo synth lead.
    Synthesizer,
}

impl ToneSelect {
    /// Index of the last variant; the fader clamps here.
    const LAST: i16 = 5;

    /// Moves the selection by `delta`, clamping at the ends of the list.
    pub fn stepped(self, delta: i8) -> Self {
        let index = self
            .to_i16()
            .expect("enum variants should be castable to i16")
            .saturating_add(i16::from(delta))
            .clamp(0, Self::LAST);
        Self::from_i16(index).expect("a clamped index is always a variant")
    }

    /// The operator-facing name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Vocal => "Vocal",
            Self::VocalChord => "Vocal+Chord",
            Self::PianoChord => "Piano Chord",
            Self::Piano => "Piano",
            Self::ChurchOrgan => "Church Organ",
            Self::Synthesizer => "Synthesizer",
        }
    }

    /// The synthesizer program behind this selection.
    ///
    /// The vocal and piano timbres all sit on program 0; the organ and synth lead
    /// use their General MIDI numbers.
    pub fn program(self) -> U7 {
        U7::from_u8_lossy(match self {
            Self::Vocal | Self::VocalChord | Self::PianoChord | Self::Piano => 0,
            Self::ChurchOrgan => 19,
            Self::Synthesizer => 81,
        })
    }

    /// Whether onsets sing the lead on the vocal channel.
    pub fn vocal_lead(self) -> bool {
        matches!(self, Self::Vocal | Self::VocalChord)
    }

    /// Whether onsets play the backing triad on the chord channels.
    pub fn chord_backing(self) -> bool {
        matches!(self, Self::VocalChord | Self::PianoChord)
    }

    /// Whether onsets double the lead onto the first chord channel instead of
    /// singing it.
    pub fn instrument_lead(self) -> bool {
        matches!(self, Self::Piano | Self::ChurchOrgan | Self::Synthesizer)
    }
}
