//! Various utility functions

/// Convert a phase increment for a 16 bit accumulator into a frequency in Hz
/// at the given sample rate
pub fn jump_to_hz(jump: u16, sample_rate: u32) -> f32 {
    f32::from(jump) * sample_rate as f32 / 65536.0
}
