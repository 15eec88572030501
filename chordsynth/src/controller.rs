//! The foreground control loop.
//!
//! Each call to [Controller::update] is one control cycle: it debounces the
//! inputs, handles key and waveform changes, starts and releases chords,
//! steps their envelopes, and finally publishes every voice's pitch and level
//! to the shared [VoiceControls].  None of this blocks, so the sample
//! interrupt may preempt it at any point.

use crate::context::Context;
use crate::dds::{VoiceControls, Waveform};
use crate::input::{channel, Debouncer};
use crate::io::{AnalogSource, InputSource};
use crate::queue::ChordQueue;
use crate::theory::{compute_voicing, Degree, TONIC_TABLE};
use crate::{util, MAX_CHORDS, VOICES_PER_CHORD};

const _: () = assert!(VOICES_PER_CHORD == 3);

const KEY_COUNT: u8 = TONIC_TABLE.len() as u8;

/// Owns all of the control-rate state of the instrument
pub struct Controller<'a> {
    context: Context,
    controls: &'a VoiceControls,
    debouncer: Debouncer,
    queue: ChordQueue,
    key: u8,
    waveform: Waveform,
}

impl<'a> Controller<'a> {
    /// Create a controller publishing to `controls`.  This silences every
    /// voice and selects the default waveform.
    pub fn new(context: Context, controls: &'a VoiceControls) -> Self {
        let ret = Self {
            context,
            controls,
            debouncer: Debouncer::new(),
            queue: ChordQueue::new(),
            key: 0,
            waveform: Waveform::default(),
        };
        controls.set_waveform(ret.waveform);
        ret.push_voices();
        ret
    }
    /// The settings in use
    pub fn context(&self) -> &Context {
        &self.context
    }
    /// The current key, in semitones above A
    pub fn key(&self) -> u8 {
        self.key
    }
    /// Change the key.  Takes effect for chords started afterwards.
    pub fn set_key(&mut self, key: u8) {
        self.key = key % KEY_COUNT;
    }
    /// The currently selected waveform
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }
    /// The chords currently tracked
    pub fn queue(&self) -> &ChordQueue {
        &self.queue
    }
    /// The debounced inputs as of the last cycle
    pub fn debouncer(&self) -> &Debouncer {
        &self.debouncer
    }
    /// Read the hardware and run one control cycle
    pub fn poll<I: InputSource, A: AnalogSource>(&mut self, input: &mut I, analog: &mut A) {
        let raw = input.raw_input_sample();
        let analog = analog.analog_value();
        self.update(raw, analog);
    }
    /// Run one control cycle given a raw input mask and an analog reading
    pub fn update(&mut self, raw: u16, analog: u8) {
        self.debouncer.tick(raw);
        self.update_key();
        self.update_waveform();
        self.update_chords(analog);
        self.queue.tick(&self.context.env);
        self.push_voices();
    }
    fn update_key(&mut self) {
        let up = self.debouncer.just_started(channel::KEY_UP);
        let down = self.debouncer.just_started(channel::KEY_DOWN);
        if up {
            self.key = (self.key + 1) % KEY_COUNT;
        }
        if down {
            self.key = (self.key + KEY_COUNT - 1) % KEY_COUNT;
        }
        if up || down {
            log::debug!("Key changed to {}", self.key);
        }
    }
    fn update_waveform(&mut self) {
        let bits = (u8::from(self.debouncer.is_held(channel::WAVE1)) << 1)
            | u8::from(self.debouncer.is_held(channel::WAVE0));
        let waveform = Waveform::from_bits(bits);
        if waveform != self.waveform {
            log::debug!("Waveform changed to {:?}", waveform);
            self.waveform = waveform;
            self.controls.set_waveform(waveform);
        }
    }
    fn update_chords(&mut self, analog: u8) {
        let swap = self.debouncer.is_held(channel::MAJ_MIN_SWAP);
        let sustain = self.debouncer.is_held(channel::SUSTAIN);
        let inversion = self.context.inversion(analog);
        for degree in Degree::ALL {
            let button = channel::DEGREE_BASE + degree.index();
            if self.debouncer.just_started(button) {
                let voicing = compute_voicing(self.key, degree, swap, inversion);
                let slot = self.queue.insert(voicing, button);
                log::debug!(
                    "Playing {:?} (key {}, swap {}, inversion {}) in slot {}: {:.1}/{:.1}/{:.1} Hz",
                    degree,
                    self.key,
                    swap,
                    inversion,
                    slot,
                    util::jump_to_hz(voicing.low, self.context.sample_rate),
                    util::jump_to_hz(voicing.mid, self.context.sample_rate),
                    util::jump_to_hz(voicing.high, self.context.sample_rate),
                );
            } else if !sustain && !self.debouncer.is_held(button) {
                let released = self.queue.release(button);
                if released > 0 {
                    log::trace!("Released {} {:?} chord(s)", released, degree);
                }
            }
        }
    }
    fn push_voices(&self) {
        for slot in 0..MAX_CHORDS {
            let base = slot * VOICES_PER_CHORD;
            match self.queue.get(slot) {
                Some(chord) => {
                    let jumps = chord.voicing().to_array();
                    for (i, jump) in jumps.into_iter().enumerate() {
                        self.controls.set_frequency(base + i, jump);
                        self.controls.set_amplitude(base + i, chord.amplitude());
                    }
                }
                None => {
                    for i in 0..VOICES_PER_CHORD {
                        self.controls.set_amplitude(base + i, 0);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::START_THRESHOLD;
    use crate::queue::ENV_FLOOR;
    use crate::VOICE_COUNT;

    fn bit(ch: u8) -> u16 {
        1 << ch
    }

    fn hold(ctrl: &mut Controller, raw: u16, analog: u8, cycles: u8) {
        for _ in 0..cycles {
            ctrl.update(raw, analog);
        }
    }

    fn voice_jumps(controls: &VoiceControls, slot: usize) -> [u16; 3] {
        let base = slot * VOICES_PER_CHORD;
        [0, 1, 2].map(|i| controls.frequency(base + i))
    }

    #[test]
    fn starts_silent() {
        let controls = VoiceControls::new();
        let ctrl = Controller::new(Context::new(), &controls);
        assert!(ctrl.queue().is_empty());
        for voice in 0..VOICE_COUNT {
            assert_eq!(controls.amplitude(voice), 0);
        }
    }

    #[test]
    fn press_plays_chord_after_debounce() {
        let controls = VoiceControls::new();
        let mut ctrl = Controller::new(Context::new(), &controls);
        hold(&mut ctrl, bit(0), 0, START_THRESHOLD - 1);
        assert!(ctrl.queue().is_empty());
        ctrl.update(bit(0), 0);
        assert_eq!(ctrl.queue().count(), 1);
        assert_eq!(voice_jumps(&controls, 0), [3520, 4400, 5280]);
        let attack = ctrl.context().env.attack_step;
        assert_eq!(controls.amplitude(0), ENV_FLOOR + attack);
        assert_eq!(controls.amplitude(VOICES_PER_CHORD), 0);
        // Holding longer ramps but never retriggers
        hold(&mut ctrl, bit(0), 0, 100);
        assert_eq!(ctrl.queue().count(), 1);
        assert_eq!(controls.amplitude(2), u8::MAX);
    }

    #[test]
    fn release_decays() {
        let controls = VoiceControls::new();
        let mut ctrl = Controller::new(Context::new(), &controls);
        hold(&mut ctrl, bit(4), 0, 100);
        ctrl.update(0, 0);
        let chord = ctrl.queue().get(0).copied().unwrap();
        assert!(!chord.is_held());
        assert!(controls.amplitude(0) < u8::MAX);
        hold(&mut ctrl, 0, 0, 255);
        assert_eq!(controls.amplitude(0), ENV_FLOOR);
    }

    #[test]
    fn sustain_defers_release() {
        let controls = VoiceControls::new();
        let mut ctrl = Controller::new(Context::new(), &controls);
        let sustain = bit(channel::SUSTAIN);
        hold(&mut ctrl, bit(1) | sustain, 0, 20);
        hold(&mut ctrl, sustain, 0, 20);
        assert!(ctrl.queue().get(0).unwrap().is_held());
        ctrl.update(0, 0);
        assert!(!ctrl.queue().get(0).unwrap().is_held());
    }

    #[test]
    fn key_buttons_wrap() {
        let controls = VoiceControls::new();
        let mut ctrl = Controller::new(Context::new(), &controls);
        hold(&mut ctrl, bit(channel::KEY_DOWN), 0, 20);
        assert_eq!(ctrl.key(), 11);
        ctrl.update(0, 0);
        hold(&mut ctrl, bit(channel::KEY_UP), 0, 20);
        assert_eq!(ctrl.key(), 0);
        ctrl.update(0, 0);
        hold(&mut ctrl, bit(channel::KEY_UP), 0, 20);
        ctrl.update(0, 0);
        hold(&mut ctrl, bit(0), 0, START_THRESHOLD);
        let want = compute_voicing(1, Degree::Tonic, false, 0).to_array();
        assert_eq!(voice_jumps(&controls, 0), want);
        ctrl.set_key(25);
        assert_eq!(ctrl.key(), 1);
    }

    #[test]
    fn swap_and_inversion_shape_the_chord() {
        let controls = VoiceControls::new();
        let mut ctrl = Controller::new(Context::new(), &controls);
        let swap = bit(channel::MAJ_MIN_SWAP);
        hold(&mut ctrl, bit(0) | swap, 24, START_THRESHOLD);
        // Minor tonic, first inversion
        assert_eq!(voice_jumps(&controls, 0), [3520, 4224, 2640]);
    }

    #[test]
    fn waveform_bits_select_waveform() {
        let controls = VoiceControls::new();
        let mut ctrl = Controller::new(Context::new(), &controls);
        assert_eq!(controls.waveform(), Waveform::Sine);
        ctrl.update(bit(channel::WAVE1) | bit(channel::WAVE0), 0);
        assert_eq!(controls.waveform(), Waveform::Saw);
        ctrl.update(bit(channel::WAVE1), 0);
        assert_eq!(controls.waveform(), Waveform::Triangle);
        ctrl.update(bit(channel::WAVE0), 0);
        assert_eq!(ctrl.waveform(), Waveform::Square);
        assert_eq!(controls.waveform(), Waveform::Square);
    }

    #[test]
    fn extra_chords_evict_the_oldest() {
        let controls = VoiceControls::new();
        let mut ctrl = Controller::new(Context::new(), &controls);
        let mut raw = 0;
        for degree in 0..=MAX_CHORDS as u8 {
            raw |= bit(degree);
            hold(&mut ctrl, raw, 0, START_THRESHOLD);
        }
        assert_eq!(ctrl.queue().count(), MAX_CHORDS);
        assert_eq!(ctrl.queue().get(0).unwrap().button(), 1);
        let want = compute_voicing(0, Degree::Supertonic, false, 0).to_array();
        assert_eq!(voice_jumps(&controls, 0), want);
    }

    #[test]
    fn poll_reads_hardware() {
        struct Buttons(u16);
        impl InputSource for Buttons {
            fn raw_input_sample(&mut self) -> u16 {
                self.0
            }
        }
        struct Knob(u8);
        impl AnalogSource for Knob {
            fn analog_value(&mut self) -> u8 {
                self.0
            }
        }
        let controls = VoiceControls::new();
        let mut ctrl = Controller::new(Context::new(), &controls);
        let (mut buttons, mut knob) = (Buttons(bit(6)), Knob(48));
        for _ in 0..START_THRESHOLD {
            ctrl.poll(&mut buttons, &mut knob);
        }
        let want = compute_voicing(0, Degree::LeadingTone, false, 2).to_array();
        assert_eq!(voice_jumps(&controls, 0), want);
    }
}
