//! The top-level synthesizer state.
//!
//! An [Engine] is intended to live in a `static` so that both execution
//! contexts can reach it: the main loop drives a [Controller] and the sample
//! timer's interrupt handler drives a [VoiceBank].  A typical board support
//! crate looks something like:
//!
//! ```ignore
//! static ENGINE: Engine = Engine::new();
//!
//! fn main_loop(buttons: &mut ShiftRegister, knob: &mut Adc) -> ! {
//!     let mut controller = ENGINE.controller(Context::new());
//!     loop {
//!         controller.poll(buttons, knob);
//!     }
//! }
//!
//! // Runs once per sample, with the VoiceBank stashed where the handler can
//! // reach it
//! fn sample_timer(bank: &mut VoiceBank<'static>, pwm: &mut Pwm) {
//!     bank.tick(pwm);
//! }
//! ```

use crate::context::Context;
use crate::controller::Controller;
use crate::dds::{VoiceBank, VoiceControls};

/// Owns the state shared between the control loop and the sample interrupt
pub struct Engine {
    controls: VoiceControls,
}

impl Engine {
    /// Constructor.  The engine starts silent.
    pub const fn new() -> Self {
        Self {
            controls: VoiceControls::new(),
        }
    }
    /// The shared voice parameters
    pub fn controls(&self) -> &VoiceControls {
        &self.controls
    }
    /// Create the control loop half of the synthesizer.  Only one should be
    /// active at a time, since each will overwrite the other's voices.
    pub fn controller(&self, context: Context) -> Controller<'_> {
        log::debug!(
            "Starting controller at {} Hz with {:?}",
            context.sample_rate,
            context.env
        );
        Controller::new(context, &self.controls)
    }
    /// Create the sample-rate half of the synthesizer
    pub fn voice_bank(&self) -> VoiceBank<'_> {
        VoiceBank::new(&self.controls)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
