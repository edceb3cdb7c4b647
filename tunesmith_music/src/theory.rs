// Scale, progression, and consonance tables.
//
// Everything here is a pure lookup or derivation over fixed tables. The only
// non-determinism is the caller's RNG, which is passed in explicitly so that
// a seeded generator reproduces the same choices.
//
// Scales are absolute pitch lists built by adding an interval table to a
// root. Every table carries the octave as a trailing entry, so the lengths
// (8, 8, 6, 7 for major, minor, pentatonic, blues) differ from the
// conventional note counts. Chord progressions index into
// these lists by position, so which chord roots a progression can reach
// depends on the active scale type.
//
// Used by generator.rs for every theory-level choice.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pitch-class names with sharp spelling, indexed by `pitch % 12`.
pub const PITCH_CLASS_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Scale-degree progressions. Degrees are positions in the scale list.
pub const PROGRESSIONS: [[usize; 4]; 8] = [
    [0, 4, 5, 3], // I-IV-V-vi
    [0, 5, 3, 4], // I-V-vi-IV
    [0, 3, 4, 0], // I-vi-IV-I
    [0, 4, 0, 5], // I-IV-I-V
    [0, 5, 0, 3], // I-V-I-vi
    [0, 6, 4, 5], // I-vi-IV-V
    [0, 4, 5, 0], // I-IV-V-I
    [0, 3, 6, 4], // I-vi-ii-IV
];

/// Interval classes (mod 12) that count as consonant.
const CONSONANT_INTERVALS: [u8; 7] = [0, 3, 4, 5, 7, 8, 9];

/// The four scale families the generator can work in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScaleType {
    Major,
    Minor,
    Pentatonic,
    Blues,
}

impl ScaleType {
    pub const ALL: [ScaleType; 4] = [
        ScaleType::Major,
        ScaleType::Minor,
        ScaleType::Pentatonic,
        ScaleType::Blues,
    ];

    /// Semitone offsets from the root, including the trailing octave where
    /// the table has one.
    pub fn intervals(self) -> &'static [u8] {
        match self {
            ScaleType::Major => &[0, 2, 4, 5, 7, 9, 11, 12],
            ScaleType::Minor => &[0, 2, 3, 5, 7, 8, 10, 12],
            ScaleType::Pentatonic => &[0, 2, 4, 7, 9, 12],
            ScaleType::Blues => &[0, 3, 5, 6, 7, 10, 12],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ScaleType::Major => "Major",
            ScaleType::Minor => "Minor",
            ScaleType::Pentatonic => "Pentatonic",
            ScaleType::Blues => "Blues",
        }
    }
}

impl fmt::Display for ScaleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScaleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScaleType::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown scale type '{s}' (major, minor, pentatonic, blues)"))
    }
}

/// Absolute pitches of a scale built on `root`.
///
/// The output has one entry per interval in the table, so its length depends
/// on the scale type. Entry `i` is `root + intervals[i]` while that fits in a
/// `u8`; past 255 the entry saturates at 255. Any entry over 127 is already
/// outside MIDI range and the encoder rejects it (midi.rs).
pub fn scale_for(scale_type: ScaleType, root: u8) -> Vec<u8> {
    scale_type
        .intervals()
        .iter()
        .map(|&iv| root.saturating_add(iv))
        .collect()
}

/// Pick one of the fixed progressions uniformly.
pub fn random_chord_progression(rng: &mut impl Rng) -> &'static [usize; 4] {
    &PROGRESSIONS[rng.random_range(0..PROGRESSIONS.len())]
}

/// Look up the pitch at a progression degree.
///
/// Degrees past the end of a short scale (degree 6 on the pentatonic table)
/// wrap around, so every progression is playable in every scale.
pub fn degree_pitch(scale: &[u8], degree: usize) -> u8 {
    scale[degree % scale.len()]
}

/// Two pitches are consonant if their interval mod 12 is a unison, third,
/// fourth, fifth, or sixth.
pub fn is_consonant(pitch1: u8, pitch2: u8) -> bool {
    let interval = pitch1.abs_diff(pitch2) % 12;
    CONSONANT_INTERVALS.contains(&interval)
}

/// Random root: C4, C5, or C6 plus a random 0-11 semitone offset (pitches 60-95).
pub fn random_root_note(rng: &mut impl Rng) -> u8 {
    60 + rng.random_range(0..3u8) * 12 + rng.random_range(0..12u8)
}

pub fn random_scale_type(rng: &mut impl Rng) -> ScaleType {
    ScaleType::ALL[rng.random_range(0..ScaleType::ALL.len())]
}

/// Step `direction` entries through the scale from the entry sharing
/// `current`'s pitch class, wrapping at either end. If no entry shares the
/// pitch class, return a random scale pitch instead.
pub fn harmonic_neighbor(current: u8, scale: &[u8], direction: i32, rng: &mut impl Rng) -> u8 {
    let Some(index) = scale.iter().position(|&p| p % 12 == current % 12) else {
        return scale[rng.random_range(0..scale.len())];
    };
    let len = scale.len() as i32;
    let next = (index as i32 + direction).rem_euclid(len);
    scale[next as usize]
}

/// Pitch-class name of a MIDI pitch, e.g. "F#".
pub fn pitch_class_name(pitch: u8) -> &'static str {
    PITCH_CLASS_NAMES[(pitch % 12) as usize]
}

/// Octave number with middle C (60) in octave 4.
pub fn octave_of(pitch: u8) -> i8 {
    (pitch / 12) as i8 - 1
}
