//! This crate contains all of the logic for a button-operated chord
//! synthesizer.  Seven buttons select a diatonic scale degree, and the engine
//! plays the corresponding triad in the current key using direct digital
//! synthesis (DDS), mixing every sounding voice into a single 8-bit sample.
//!
//! The crate is `no_std` and performs no allocation.  All state is sized by
//! the compile-time constants below, and the only thing shared between the
//! foreground control loop and the audio interrupt is a bank of atomics (see
//! [dds::VoiceControls]).
//!
//! The processing chain, from the leaves up:
//!
//! - [input::Debouncer] turns raw button bitmasks into press edges
//! - [theory::compute_voicing] turns (key, degree, swap, inversion) into a
//!   [theory::Voicing]
//! - [queue::ChordQueue] tracks sounding chords and steps their envelopes
//! - [dds::VoiceBank] renders and mixes the voices once per sample tick
//!
//! [controller::Controller] ties the first three together once per control
//! cycle, and [engine::Engine] owns the shared state and hands out both halves.
//!
//! All pitches in this crate are expressed as phase increments for a 16 bit
//! accumulator clocked at [SAMPLE_RATE_HZ], not as Hz.  See
//! [util::jump_to_hz] for a conversion.

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

pub mod context;
pub mod controller;
pub mod dds;
pub mod engine;
pub mod input;
pub mod io;
pub mod queue;
pub mod theory;
pub mod util;

pub use context::Context;
pub use controller::Controller;
pub use dds::{VoiceBank, VoiceControls, Waveform};
pub use engine::Engine;
pub use queue::{Chord, ChordQueue, EnvParams};
pub use theory::{compute_voicing, Degree, Voicing};

/// An unsigned 16 bit fixed point number in the interval `[0, 1)`, used to
/// scale envelope levels.
pub type ScalarFxP = fixed::types::U0F16;

/// The maximum number of chords that may sound at once
pub const MAX_CHORDS: usize = 4;
/// Each chord is a triad
pub const VOICES_PER_CHORD: usize = 3;
/// One DDS voice per (chord slot, chord tone) pair
pub const VOICE_COUNT: usize = MAX_CHORDS * VOICES_PER_CHORD;

/// The audio sample rate, in Hz.  The sample timer runs from a 1MHz clock and
/// divides by 122.
pub const SAMPLE_RATE_HZ: u32 = 8197;
