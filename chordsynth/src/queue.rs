//! The chord queue: a fixed-size table of the chords currently sounding,
//! each with its own attack/release envelope.

use arrayvec::ArrayVec;
use fixed::types::U16F0;

use crate::theory::Voicing;
use crate::{ScalarFxP, MAX_CHORDS};

/// The lowest level a chord's envelope decays to.  It is never driven all the
/// way to zero; at this level the scaled output of a voice truncates to 0.
pub const ENV_FLOOR: u8 = 1;
/// The highest level a chord's envelope attacks to
pub const ENV_CEILING: u8 = u8::MAX;

/// Parameters for chord envelopes.  Both apply once per control cycle, not
/// once per audio sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnvParams {
    /// Linear increase in level per cycle while the chord is held
    pub attack_step: u8,
    /// Fraction of the level retained per cycle after release
    pub release: ScalarFxP,
}

impl EnvParams {
    /// The default envelope: a 64 cycle attack and a release that loses about
    /// 3% per cycle
    pub const fn new() -> Self {
        Self {
            attack_step: 4,
            release: ScalarFxP::lit("0.97"),
        }
    }
}

impl Default for EnvParams {
    fn default() -> Self {
        Self::new()
    }
}

/// A chord occupying one slot of the [ChordQueue]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Chord {
    button: u8,
    voicing: Voicing,
    amplitude: u8,
    held: bool,
}

impl Chord {
    fn new(voicing: Voicing, button: u8) -> Self {
        Self {
            button,
            voicing,
            amplitude: ENV_FLOOR,
            held: true,
        }
    }
    /// The button that started this chord
    pub fn button(&self) -> u8 {
        self.button
    }
    /// The pitches of this chord's three voices
    pub fn voicing(&self) -> Voicing {
        self.voicing
    }
    /// The current envelope level, shared by all three voices
    pub fn amplitude(&self) -> u8 {
        self.amplitude
    }
    /// True until the chord's button is released
    pub fn is_held(&self) -> bool {
        self.held
    }
    /// A slot may be reused once its chord is released and has decayed to
    /// [ENV_FLOOR], i.e. once it is inaudible.
    pub fn is_reclaimable(&self) -> bool {
        !self.held && self.amplitude <= ENV_FLOOR
    }
    fn step(&mut self, params: &EnvParams) {
        self.amplitude = if self.held {
            self.amplitude
                .saturating_add(params.attack_step)
                .min(ENV_CEILING)
        } else {
            let decayed = U16F0::from_num(self.amplitude).wide_mul(params.release);
            decayed.to_num::<u8>().max(ENV_FLOOR)
        };
    }
}

/// A bounded table of sounding chords.
///
/// New chords reuse the first reclaimable slot.  Failing that, the table
/// grows until it holds [MAX_CHORDS] entries, after which the oldest slot
/// (index 0) is evicted and everything shifts down, so a newly pressed chord
/// is always heard.
#[derive(Clone, Default)]
pub struct ChordQueue {
    slots: ArrayVec<Chord, MAX_CHORDS>,
}

impl ChordQueue {
    /// Constructor.  The queue starts empty.
    pub const fn new() -> Self {
        Self {
            slots: ArrayVec::new_const(),
        }
    }
    /// Start a new chord for `button`, returning the slot it was placed in.
    pub fn insert(&mut self, voicing: Voicing, button: u8) -> usize {
        let chord = Chord::new(voicing, button);
        if let Some(i) = self.slots.iter().position(Chord::is_reclaimable) {
            self.slots[i] = chord;
            return i;
        }
        if self.slots.is_full() {
            let evicted = self.slots.remove(0);
            log::debug!(
                "Evicting chord from button {} at level {}",
                evicted.button,
                evicted.amplitude
            );
        }
        self.slots.push(chord);
        self.slots.len() - 1
    }
    /// Release every chord started by `button`.  Released chords keep
    /// sounding while their envelopes decay.  Returns the number of chords
    /// that were still held.
    pub fn release(&mut self, button: u8) -> usize {
        let mut released = 0;
        for chord in self.slots.iter_mut().filter(|c| c.button == button && c.held) {
            chord.held = false;
            released += 1;
        }
        released
    }
    /// Advance every chord's envelope by one control cycle
    pub fn tick(&mut self, params: &EnvParams) {
        for chord in self.slots.iter_mut() {
            chord.step(params);
        }
    }
    /// The number of populated slots
    pub fn count(&self) -> usize {
        self.slots.len()
    }
    /// True if no chord has been played yet
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
    /// The chord in slot `i`, if that slot is populated
    pub fn get(&self, i: usize) -> Option<&Chord> {
        self.slots.get(i)
    }
    /// Iterate over populated slots, oldest slot first
    pub fn iter(&self) -> impl Iterator<Item = &Chord> {
        self.slots.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voicing(n: u16) -> Voicing {
        Voicing {
            low: n,
            mid: n + 1,
            high: n + 2,
        }
    }

    #[test]
    fn fifo_eviction_keeps_latest() {
        let mut queue = ChordQueue::new();
        for i in 0..=MAX_CHORDS as u8 {
            queue.insert(voicing(u16::from(i) * 100), i);
        }
        assert_eq!(queue.count(), MAX_CHORDS);
        let buttons: ArrayVec<u8, MAX_CHORDS> = queue.iter().map(Chord::button).collect();
        let want: ArrayVec<u8, MAX_CHORDS> = (1..=MAX_CHORDS as u8).collect();
        assert_eq!(buttons, want);
        assert_eq!(queue.get(0).map(|c| c.voicing()), Some(voicing(100)));
    }

    #[test]
    fn new_chords_start_held_at_floor() {
        let mut queue = ChordQueue::new();
        let slot = queue.insert(voicing(10), 2);
        let chord = queue.get(slot).copied().unwrap();
        assert!(chord.is_held());
        assert_eq!(chord.amplitude(), ENV_FLOOR);
        assert!(!chord.is_reclaimable());
    }

    #[test]
    fn attack_is_monotonic_to_ceiling() {
        let params = EnvParams::default();
        let mut queue = ChordQueue::new();
        queue.insert(voicing(10), 0);
        let mut last = ENV_FLOOR;
        for _ in 0..100 {
            queue.tick(&params);
            let level = queue.get(0).unwrap().amplitude();
            assert!(level >= last);
            last = level;
        }
        assert_eq!(last, ENV_CEILING);
    }

    #[test]
    fn release_decays_to_floor_and_stops() {
        let params = EnvParams::default();
        let mut queue = ChordQueue::new();
        queue.insert(voicing(10), 5);
        for _ in 0..100 {
            queue.tick(&params);
        }
        queue.release(5);
        assert!(!queue.get(0).unwrap().is_held());
        let mut last = ENV_CEILING;
        for _ in 0..1000 {
            queue.tick(&params);
            let level = queue.get(0).unwrap().amplitude();
            assert!(level <= last);
            assert!(level >= ENV_FLOOR);
            last = level;
        }
        assert_eq!(last, ENV_FLOOR);
        assert!(queue.get(0).unwrap().is_reclaimable());
    }

    #[test]
    fn release_is_exponential() {
        let params = EnvParams::default();
        let mut chord = Chord::new(voicing(10), 0);
        chord.amplitude = 200;
        chord.held = false;
        chord.step(&params);
        // 200 * 0.97 = 194
        assert_eq!(chord.amplitude(), 194);
    }

    #[test]
    fn release_only_matches_button() {
        let mut queue = ChordQueue::new();
        queue.insert(voicing(10), 1);
        queue.insert(voicing(20), 2);
        queue.insert(voicing(30), 1);
        assert_eq!(queue.release(1), 2);
        assert_eq!(queue.release(1), 0);
        let held: ArrayVec<bool, MAX_CHORDS> = queue.iter().map(Chord::is_held).collect();
        assert_eq!(held.as_slice(), &[false, true, false]);
    }

    #[test]
    fn silent_slots_are_reused_in_place() {
        let params = EnvParams::default();
        let mut queue = ChordQueue::new();
        for i in 0..MAX_CHORDS as u8 {
            queue.insert(voicing(10), i);
        }
        for _ in 0..100 {
            queue.tick(&params);
        }
        queue.release(1);
        queue.release(2);
        for _ in 0..1000 {
            queue.tick(&params);
        }
        let slot = queue.insert(voicing(50), 9);
        assert_eq!(slot, 1);
        assert_eq!(queue.count(), MAX_CHORDS);
        assert_eq!(queue.get(0).unwrap().button(), 0);
        assert_eq!(queue.get(1).unwrap().button(), 9);
    }

    #[test]
    fn audible_releases_are_evicted_fifo() {
        let params = EnvParams::default();
        let mut queue = ChordQueue::new();
        for i in 0..MAX_CHORDS as u8 {
            queue.insert(voicing(10), i);
        }
        for _ in 0..100 {
            queue.tick(&params);
        }
        queue.release(3);
        queue.tick(&params);
        let slot = queue.insert(voicing(50), 7);
        assert_eq!(slot, MAX_CHORDS - 1);
        assert_eq!(queue.get(0).unwrap().button(), 1);
        assert_eq!(queue.get(MAX_CHORDS - 2).unwrap().button(), 3);
    }

    #[test]
    fn empty_queue() {
        let mut queue = ChordQueue::new();
        queue.tick(&EnvParams::default());
        assert!(queue.is_empty());
        assert_eq!(queue.count(), 0);
        assert!(queue.get(0).is_none());
    }
}
