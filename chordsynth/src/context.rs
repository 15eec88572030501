//! This module provides the runtime configuration of the control loop.
//! Anything that sizes memory is a compile-time constant in the crate root
//! instead.

use crate::queue::EnvParams;
use crate::SAMPLE_RATE_HZ;

/// Settings used by the [crate::Controller] each control cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Context {
    /// The audio sample rate, in Hz.  Only used for diagnostics; pitches are
    /// tuned for [SAMPLE_RATE_HZ].
    pub sample_rate: u32,
    /// Envelope shape shared by every chord
    pub env: EnvParams,
    /// The analog inversion reading is divided by this to get the number of
    /// inversion steps.  A divisor of 0 disables inversion.
    pub inversion_divisor: u8,
}

impl Context {
    /// Create a context with the default settings: an inversion divisor of 24
    /// gives 11 inversion steps over the full analog range.
    pub const fn new() -> Self {
        Self {
            sample_rate: SAMPLE_RATE_HZ,
            env: EnvParams::new(),
            inversion_divisor: 24,
        }
    }
    /// Replace the envelope parameters
    pub const fn with_env(mut self, env: EnvParams) -> Self {
        self.env = env;
        self
    }
    /// Replace the inversion divisor
    pub const fn with_inversion_divisor(mut self, divisor: u8) -> Self {
        self.inversion_divisor = divisor;
        self
    }
    /// Convert an analog reading into a number of inversion steps
    pub fn inversion(&self, analog: u8) -> u8 {
        analog.checked_div(self.inversion_divisor).unwrap_or(0)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
