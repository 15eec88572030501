//! Music theory: turning a scale degree in a key into the three pitches of a
//! triad.
//!
//! All arithmetic here is integer multiply-then-divide on just-intonation
//! ratios, truncating at every step, so results are bit-reproducible.

/// Tonic pitches (as phase increments) for each of the 12 keys, starting
/// from A.  At [crate::SAMPLE_RATE_HZ], 3520 is A440.
pub const TONIC_TABLE: [u16; 12] = [
    3520, 3729, 3951, 4186, //
    4435, 4699, 4978, 5274, //
    5588, 5920, 6272, 6645,
];

/// One of the seven degrees of a major scale, each harmonized into a triad.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Degree {
    /// I
    Tonic,
    /// ii
    Supertonic,
    /// iii
    Mediant,
    /// IV
    Subdominant,
    /// V
    Dominant,
    /// vi
    Submediant,
    /// vii°
    LeadingTone,
}

impl Degree {
    /// All degrees, in scale order
    pub const ALL: [Degree; 7] = [
        Degree::Tonic,
        Degree::Supertonic,
        Degree::Mediant,
        Degree::Subdominant,
        Degree::Dominant,
        Degree::Submediant,
        Degree::LeadingTone,
    ];
    /// Zero-based position in the scale
    pub const fn index(self) -> u8 {
        self as u8
    }
    /// The (numerator, denominator) ratio of this degree's root to the tonic
    pub const fn ratio(self) -> (u32, u32) {
        match self {
            Degree::Tonic => (1, 1),
            Degree::Supertonic => (9, 8),
            Degree::Mediant => (5, 4),
            Degree::Subdominant => (4, 3),
            Degree::Dominant => (3, 2),
            Degree::Submediant => (5, 3),
            Degree::LeadingTone => (15, 8),
        }
    }
    /// True if the diatonic triad on this degree has a minor third
    pub const fn minor_third(self) -> bool {
        matches!(
            self,
            Degree::Supertonic | Degree::Mediant | Degree::Submediant | Degree::LeadingTone
        )
    }
    /// True if the diatonic triad on this degree has a diminished fifth
    pub const fn diminished_fifth(self) -> bool {
        matches!(self, Degree::LeadingTone)
    }
}

impl TryFrom<u8> for Degree {
    type Error = &'static str;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Degree::ALL
            .get(value as usize)
            .copied()
            .ok_or("Scale degree out of range")
    }
}

/// The three pitches of a chord, sorted from lowest to highest before any
/// inversion is applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Voicing {
    /// Lowest voice
    pub low: u16,
    /// Middle voice
    pub mid: u16,
    /// Highest voice
    pub high: u16,
}

impl Voicing {
    /// The voices as `[low, mid, high]`
    pub const fn to_array(self) -> [u16; 3] {
        [self.low, self.mid, self.high]
    }
}

/// Root, third and fifth of a triad before octave reduction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Triad {
    pub root: u32,
    pub third: u32,
    pub fifth: u32,
}

fn scale(x: u32, (num, den): (u32, u32)) -> u32 {
    x * num / den
}

pub(crate) fn tonic(key: u8) -> u16 {
    TONIC_TABLE[key as usize % TONIC_TABLE.len()]
}

pub(crate) fn triad(tonic: u16, degree: Degree, swap_major_minor: bool) -> Triad {
    let root = scale(tonic.into(), degree.ratio());
    let third = if degree.minor_third() != swap_major_minor {
        scale(root, (6, 5))
    } else {
        scale(root, (5, 4))
    };
    let fifth = if degree.diminished_fifth() {
        scale(root, (45, 32))
    } else {
        scale(root, (3, 2))
    };
    Triad { root, third, fifth }
}

/// Drop a pitch by an octave if it is (approximately) an octave or more above
/// the tonic.  The threshold is 1.95x rather than 2x since truncating division
/// can land slightly under an exact octave.
fn octave_reduce(x: u32, tonic: u16) -> u32 {
    if x * 20 >= u32::from(tonic) * 39 {
        x / 2
    } else {
        x
    }
}

/// Calculate the voicing of the triad built on `degree` in the key
/// `key` (taken modulo 12, counting semitones up from A).
///
/// If `swap_major_minor` is set, the quality of the third is inverted.  All
/// three tones are brought within an octave of the tonic and sorted, then
/// `inversion` successive octave drops are applied, walking high, mid, low,
/// high, ... so each step lowers the voice that was on top.
pub fn compute_voicing(key: u8, degree: Degree, swap_major_minor: bool, inversion: u8) -> Voicing {
    let tonic = tonic(key);
    let Triad { root, third, fifth } = triad(tonic, degree, swap_major_minor);
    let root = octave_reduce(root, tonic);
    let third = octave_reduce(third, tonic);
    let fifth = octave_reduce(fifth, tonic);

    let low = root.min(third).min(fifth);
    let high = root.max(third).max(fifth);
    let mid = if root > low && root < high {
        root
    } else if third > low && third < high {
        third
    } else {
        fifth
    };

    // Every reduced tone is below 2x the largest tonic, so this can't truncate
    let mut ret = Voicing {
        low: low as u16,
        mid: mid as u16,
        high: high as u16,
    };
    for i in 0..inversion {
        match i % 3 {
            0 => ret.high /= 2,
            1 => ret.mid /= 2,
            _ => ret.low /= 2,
        }
    }
    ret
}
