//! Debouncing for the button/switch inputs.
//!
//! Mechanical contacts bounce for a few poll cycles when pressed, so a press
//! is only reported once its input has been seen for [START_THRESHOLD]
//! consecutive polls.  A channel's press counter saturates at
//! [PRESS_SATURATION], so it passes through the threshold exactly once per
//! press and the start edge cannot fire twice.

/// The number of input channels read each poll (one bit each)
pub const CHANNEL_COUNT: usize = 16;
/// Press durations stop counting here
pub const PRESS_SATURATION: u8 = 16;
/// A press is reported as started when its duration reaches this value
pub const START_THRESHOLD: u8 = 10;

const _: () = assert!(START_THRESHOLD > 0 && START_THRESHOLD <= PRESS_SATURATION);
const _: () = assert!(CHANNEL_COUNT <= u16::BITS as usize);

/// Channel assignments within the raw input mask.
pub mod channel {
    /// Scale degree buttons occupy channels `DEGREE_BASE..DEGREE_BASE + 7`
    pub const DEGREE_BASE: u8 = 0;
    /// Swaps the quality of the third (major <-> minor) while held
    pub const MAJ_MIN_SWAP: u8 = 7;
    /// Moves the key up a semitone
    pub const KEY_UP: u8 = 8;
    /// Moves the key down a semitone
    pub const KEY_DOWN: u8 = 9;
    /// High bit of the waveform selection
    pub const WAVE1: u8 = 10;
    /// Low bit of the waveform selection
    pub const WAVE0: u8 = 11;
    /// While held, released chords keep sounding
    pub const SUSTAIN: u8 = 12;
}

/// The debounced state of a single channel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelState {
    /// Not pressed
    Idle,
    /// Pressed, and this is the poll on which the press was recognized
    JustStarted,
    /// Pressed
    Held,
}

/// Tracks how long each channel has been continuously active.
#[derive(Clone, Default)]
pub struct Debouncer {
    durations: [u8; CHANNEL_COUNT],
}

impl Debouncer {
    /// Constructor.  All channels start idle.
    pub const fn new() -> Self {
        Self {
            durations: [0; CHANNEL_COUNT],
        }
    }
    /// Process one poll of the raw input.  Bit `i` of `raw` is channel `i`.
    pub fn tick(&mut self, raw: u16) {
        for (i, duration) in self.durations.iter_mut().enumerate() {
            if raw & (1u16 << i) != 0 {
                if *duration < PRESS_SATURATION {
                    *duration += 1;
                }
            } else {
                *duration = 0;
            }
        }
    }
    /// The number of consecutive polls (saturating) that `ch` has been active.
    /// Unknown channels read as 0.
    pub fn duration(&self, ch: u8) -> u8 {
        self.durations.get(ch as usize).copied().unwrap_or(0)
    }
    /// True while `ch` is active, from the first active poll
    pub fn is_held(&self, ch: u8) -> bool {
        self.duration(ch) > 0
    }
    /// True only on the poll where `ch` has been active for [START_THRESHOLD]
    /// polls
    pub fn just_started(&self, ch: u8) -> bool {
        self.duration(ch) == START_THRESHOLD
    }
    /// The debounced state of `ch`
    pub fn state(&self, ch: u8) -> ChannelState {
        if self.just_started(ch) {
            ChannelState::JustStarted
        } else if self.is_held(ch) {
            ChannelState::Held
        } else {
            ChannelState::Idle
        }
    }
}
