//! Button snapshots from the gamepad link and the per-tick edge detector.
//!
//! The detector is a pure function of two consecutive [`ButtonSnapshot`]s, so the whole
//! input layer is testable without a controller attached. The caller is expected to
//! sample snapshots no faster than the link delivers frames; there is no debounce
//! beyond the single-snapshot edge comparison.

use tinyvec::ArrayVec;

/// The button state of the gamepad, captured once per control tick.
///
/// Snapshots are compared pairwise by [`detect`]; they are plain value types and are
/// never mutated after capture.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub struct ButtonSnapshot {
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub cross: bool,
    pub square: bool,
    pub circle: bool,
    pub triangle: bool,
    pub l1: bool,
    pub r1: bool,
    pub l3: bool,
    pub r3: bool,
    pub menu: bool,
}

impl ButtonSnapshot {
    /// Decodes the 16-bit button bitmap carried by a link frame.
    ///
    /// Bit order matches [`to_bits`][Self::to_bits]; the three unused high bits are
    /// ignored.
    pub fn from_bits(bits: u16) -> Self {
        let bit = |n: u8| bits & (1 << n) != 0;
        Self {
            down: bit(0),
            left: bit(1),
            right: bit(2),
            up: bit(3),
            cross: bit(4),
            square: bit(5),
            circle: bit(6),
            triangle: bit(7),
            l1: bit(8),
            r1: bit(9),
            l3: bit(10),
            r3: bit(11),
            menu: bit(12),
        }
    }

    /// Encodes the snapshot as the link's 16-bit button bitmap.
    pub fn to_bits(self) -> u16 {
        let buttons = [
            self.down,
            self.left,
            self.right,
            self.up,
            self.cross,
            self.square,
            self.circle,
            self.triangle,
            self.l1,
            self.r1,
            self.l3,
            self.r3,
            self.menu,
        ];
        let mut bits = 0;
        for (n, held) in buttons.into_iter().enumerate() {
            if held {
                bits |= 1 << n;
            }
        }
        bits
    }
}

/// A solmization step of the playing layout, one per note button.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScaleStep {
    /// The tonic, on the down button.
    Do,
    /// A major second up, on the left button.
    Re,
    /// A major third up, on the right button.
    Mi,
    /// A perfect fourth up, on the up button.
    Fa,
    /// A perfect fifth up, on the cross button.
    Sol,
    /// A major sixth up, on the square button.
    La,
    /// A major seventh up, on the circle button.
    Ti,
    /// The octave, on the triangle button.
    HighDo,
}

impl ScaleStep {
    /// Semitone offset of this step from the tonic.
    pub fn semitones(self) -> u8 {
        match self {
            Self::Do => 0,
            Self::Re => 2,
            Self::Mi => 4,
            Self::Fa => 5,
            Self::Sol => 7,
            Self::La => 9,
            Self::Ti => 11,
            Self::HighDo => 12,
        }
    }
}

/// A discrete input event produced by [`detect`] and consumed within the same tick.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NoteEvent {
    /// A note button's rising edge; at most one per tick.
    Trigger(ScaleStep),
    /// The panic chord is held: silence everything.
    AllNotesOff,
    /// A shoulder button is held at trigger time; shift the onset by whole octaves.
    OctaveShift(i8),
    /// A stick-click button is held at trigger time; shift the onset by semitones.
    SemitoneShift(i8),
    /// The menu button's rising edge; advance the settings cursor.
    MenuAdvance,
    /// A shoulder button's rising edge; nudge the selected settings field.
    ValueIncrement(i8),
}

// tinyvec requires that items implement `Default`. `AllNotesOff` is harmless if a
// default value ever leaks into a queue, but `detect` never pushes one implicitly.
impl Default for NoteEvent {
    fn default() -> Self {
        Self::AllNotesOff
    }
}

/// Upper bound on events a single tick can produce.
pub const EVENT_QUEUE_DEPTH: usize = 6;

/// The ordered events of one tick.
pub type EventQueue = ArrayVec<[NoteEvent; EVENT_QUEUE_DEPTH]>;

/// Compares two consecutive snapshots and returns the tick's events, in the order a
/// consumer must apply them: modifiers before the trigger they attach to.
///
/// The panic chord (menu plus both shoulders, level-sensitive) outranks everything
/// else in the same tick, including a coinciding trigger. When several note buttons
/// land on the same tick, the last mapping in layout order (down, left, right, up,
/// cross, square, circle, triangle) wins.
pub fn detect(prev: &ButtonSnapshot, curr: &ButtonSnapshot) -> EventQueue {
    let mut events = EventQueue::new();

    if curr.menu && curr.l1 && curr.r1 {
        events.push(NoteEvent::AllNotesOff);
        return events;
    }

    let rising = |was: bool, is: bool| !was && is;

    let mut step = None;
    if rising(prev.down, curr.down) {
        step = Some(ScaleStep::Do);
    }
    if rising(prev.left, curr.left) {
        step = Some(ScaleStep::Re);
    }
    if rising(prev.right, curr.right) {
        step = Some(ScaleStep::Mi);
    }
    if rising(prev.up, curr.up) {
        step = Some(ScaleStep::Fa);
    }
    if rising(prev.cross, curr.cross) {
        step = Some(ScaleStep::Sol);
    }
    if rising(prev.square, curr.square) {
        step = Some(ScaleStep::La);
    }
    if rising(prev.circle, curr.circle) {
        step = Some(ScaleStep::Ti);
    }
    if rising(prev.triangle, curr.triangle) {
        step = Some(ScaleStep::HighDo);
    }

    if let Some(step) = step {
        // The modifiers are levels, not edges: whatever is held right now applies to
        // this onset. The positive direction wins when both buttons of a pair are down.
        let octave = if curr.r1 {
            1
        } else if curr.l1 {
            -1
        } else {
            0
        };
        if octave != 0 {
            events.push(NoteEvent::OctaveShift(octave));
        }
        let semitone = if curr.r3 {
            1
        } else if curr.l3 {
            -1
        } else {
            0
        };
        if semitone != 0 {
            events.push(NoteEvent::SemitoneShift(semitone));
        }
        events.push(NoteEvent::Trigger(step));
    }

    // A menu edge with a shoulder already down reads as the start of a panic chord,
    // not as navigation.
    if rising(prev.menu, curr.menu) && !curr.l1 && !curr.r1 {
        events.push(NoteEvent::MenuAdvance);
    }

    if rising(prev.r1, curr.r1) {
        events.push(NoteEvent::ValueIncrement(1));
    } else if rising(prev.l1, curr.l1) {
        events.push(NoteEvent::ValueIncrement(-1));
    }

    events
}
