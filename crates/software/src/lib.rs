//! This crate contains architecture-agnostic logic for the Solfapad, a device which turns
//! game-controller button presses into song by driving an eVY1 singing voice synthesizer
//! module over serial MIDI. Button edges become solmization notes backed by a major
//! triad; a small on-device menu adjusts timbre, transposition, and master volume.

#![deny(missing_docs)]
#![no_std]

/// Button snapshots and the per-tick edge detector.
pub mod gamepad;

/// Wire encoding for the MIDI messages the device emits.
pub mod midi;

/// Fixed pitch-class lookup tables: lyric phonemes, note names, indicator colors.
pub mod pitch;

pub mod settings;

/// The chord engine turning note events into ordered transport batches.
pub mod voice;
