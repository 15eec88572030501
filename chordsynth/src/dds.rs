//! Direct digital synthesis of the voice bank.
//!
//! Each voice is a 16 bit phase accumulator advanced by its "jump" once per
//! sample; the top byte of the accumulator indexes one cycle of the selected
//! waveform.  Every voice is scaled by its own amplitude and the results are
//! averaged into a single unsigned 8 bit sample, suitable for a PWM duty
//! cycle.
//!
//! The parameters ([VoiceControls]) are written by the control loop and read
//! by the sample interrupt, so they are kept in atomics that only ever see
//! plain loads and stores.  The accumulators are only touched by the renderer
//! ([VoiceBank]) and are not shared.  Because the control loop updates
//! several atomics in turn, the renderer may see a half-applied update for a
//! single sample.  The next sample always sees the settled values.

use core::sync::atomic::{AtomicU16, AtomicU8, Ordering};

use crate::io::DutyCycleOutput;
use crate::VOICE_COUNT;

/// Voice amplitudes are fractions of this value
pub const MAX_AMPLITUDE: u16 = 256;

const _: () = assert!(VOICE_COUNT * (u8::MAX as usize) <= u16::MAX as usize);

/// The waveform rendered by every voice
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum Waveform {
    /// A sine wave.  This is phase-aligned with [Waveform::Triangle], starting
    /// at its minimum and peaking half way through the cycle.
    #[default]
    Sine = 0b00,
    /// Full scale for the first half of the cycle, zero for the second
    Square = 0b01,
    /// Rises linearly for the first half of the cycle, then falls
    Triangle = 0b10,
    /// Rises linearly across the whole cycle
    Saw = 0b11,
}

impl Waveform {
    /// Decode the two waveform selection bits.  Higher bits are ignored.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Waveform::Sine,
            0b01 => Waveform::Square,
            0b10 => Waveform::Triangle,
            _ => Waveform::Saw,
        }
    }
    /// The two bit encoding of this waveform
    pub const fn bits(self) -> u8 {
        self as u8
    }
    /// Evaluate this waveform at `phase`, where a full cycle is 0..=255
    pub fn sample(self, phase: u8) -> u8 {
        match self {
            Waveform::Sine => sine(phase),
            Waveform::Square => {
                if phase < 128 {
                    u8::MAX
                } else {
                    0
                }
            }
            Waveform::Triangle => {
                if phase < 128 {
                    phase * 2
                } else {
                    (u8::MAX - phase) * 2
                }
            }
            Waveform::Saw => phase,
        }
    }
}

// First quarter of round(127.5 - 127.5 * cos(2 * pi * (p + 0.5) / 256)).  The
// half-sample offset makes the wave exactly symmetric about both the quarter
// and half cycle, so the rest is reflections of this table.
const SINE_QUARTER: [u8; 64] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 5, 6, 7, 8, 9, //
    10, 12, 13, 14, 16, 17, 19, 21, 22, 24, 26, 28, 30, 32, 34, 36, //
    38, 41, 43, 45, 48, 50, 53, 55, 58, 61, 63, 66, 69, 72, 74, 77, //
    80, 83, 86, 89, 92, 95, 98, 101, 104, 107, 110, 113, 117, 120, 123, 126,
];

fn sine(phase: u8) -> u8 {
    let half = if phase < 128 { phase } else { u8::MAX - phase };
    if half < 64 {
        SINE_QUARTER[half as usize]
    } else {
        u8::MAX - SINE_QUARTER[(127 - half) as usize]
    }
}

/// The per-voice parameters shared between the control loop and the sample
/// interrupt, plus the waveform selection.
///
/// Indices outside `0..VOICE_COUNT` are ignored on write and read as 0.
pub struct VoiceControls {
    jumps: [AtomicU16; VOICE_COUNT],
    amplitudes: [AtomicU8; VOICE_COUNT],
    waveform: AtomicU8,
}

impl VoiceControls {
    /// Constructor.  Every voice starts silent.
    pub const fn new() -> Self {
        Self {
            jumps: [const { AtomicU16::new(0) }; VOICE_COUNT],
            amplitudes: [const { AtomicU8::new(0) }; VOICE_COUNT],
            waveform: AtomicU8::new(Waveform::Sine.bits()),
        }
    }
    /// Set the phase increment of `voice`
    pub fn set_frequency(&self, voice: usize, jump: u16) {
        if let Some(j) = self.jumps.get(voice) {
            j.store(jump, Ordering::Relaxed);
        }
    }
    /// The phase increment of `voice`
    pub fn frequency(&self, voice: usize) -> u16 {
        self.jumps
            .get(voice)
            .map_or(0, |j| j.load(Ordering::Relaxed))
    }
    /// Set the amplitude of `voice`, as a fraction of [MAX_AMPLITUDE].  An
    /// amplitude of 0 is the only way a voice is silenced.
    pub fn set_amplitude(&self, voice: usize, level: u8) {
        if let Some(a) = self.amplitudes.get(voice) {
            a.store(level, Ordering::Relaxed);
        }
    }
    /// The amplitude of `voice`
    pub fn amplitude(&self, voice: usize) -> u8 {
        self.amplitudes
            .get(voice)
            .map_or(0, |a| a.load(Ordering::Relaxed))
    }
    /// Select the waveform used by the renderer
    pub fn set_waveform(&self, waveform: Waveform) {
        self.waveform.store(waveform.bits(), Ordering::Relaxed);
    }
    /// The currently selected waveform
    pub fn waveform(&self) -> Waveform {
        Waveform::from_bits(self.waveform.load(Ordering::Relaxed))
    }
}

impl Default for VoiceControls {
    fn default() -> Self {
        Self::new()
    }
}

/// The sample-rate half of the synthesizer: owns the phase accumulators and
/// renders from the shared [VoiceControls].
pub struct VoiceBank<'a> {
    controls: &'a VoiceControls,
    accumulators: [u16; VOICE_COUNT],
}

impl<'a> VoiceBank<'a> {
    /// Constructor.  All accumulators start at phase 0.
    pub const fn new(controls: &'a VoiceControls) -> Self {
        Self {
            controls,
            accumulators: [0; VOICE_COUNT],
        }
    }
    /// Advance every voice by one sample and return the mix of all voices
    /// rendered as `waveform`.
    pub fn render_sample(&mut self, waveform: Waveform) -> u8 {
        let mut total = 0u16;
        let params = self.controls.jumps.iter().zip(self.controls.amplitudes.iter());
        for (acc, (jump, amp)) in self.accumulators.iter_mut().zip(params) {
            *acc = acc.wrapping_add(jump.load(Ordering::Relaxed));
            let raw = u16::from(waveform.sample((*acc >> 8) as u8));
            total += raw * u16::from(amp.load(Ordering::Relaxed)) / MAX_AMPLITUDE;
        }
        (total / VOICE_COUNT as u16) as u8
    }
    /// Render one sample with the currently selected waveform and send it to
    /// `out`.  Call this once per sample period.
    pub fn tick<O: DutyCycleOutput>(&mut self, out: &mut O) {
        let sample = self.render_sample(self.controls.waveform());
        out.set_duty_cycle(sample);
    }
}
