//! Traits for the hardware the engine talks to.  Board support code
//! implements these on top of its shift register, ADC and PWM drivers.

/// A source of raw (undebounced) digital input
pub trait InputSource {
    /// Sample every input channel at once.  Bit `i` is set if channel `i` is
    /// active.
    fn raw_input_sample(&mut self) -> u16;
}

/// A source of the analog inversion control
pub trait AnalogSource {
    /// The most recent 8 bit reading
    fn analog_value(&mut self) -> u8;
}

/// The audio output, typically a PWM channel followed by a low pass filter
pub trait DutyCycleOutput {
    /// Set the output level for the current sample period
    fn set_duty_cycle(&mut self, duty: u8);
}
