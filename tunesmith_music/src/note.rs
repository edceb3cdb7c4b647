// Note and chord value types.
//
// A `Note` is a pitch held for some number of ticks starting at an absolute
// tick offset. A `Chord` groups notes that start together; its duration is
// the longest of its notes and only ever grows as notes are added.
//
// Both are created during generation (generator.rs) and read afterwards by
// the piece statistics (piece.rs) and the MIDI encoder (midi.rs).

use crate::theory::{octave_of, pitch_class_name};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Velocity given to every chord tone built by the triad constructors.
pub const CHORD_VELOCITY: u8 = 100;

/// A single sounding note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// MIDI pitch number. Generated pitches stay within 21-108.
    pub pitch: u8,
    /// Length in ticks.
    pub duration: u32,
    /// MIDI velocity (0-127).
    pub velocity: u8,
    /// Absolute start tick.
    pub start_time: u64,
}

impl Note {
    pub fn new(pitch: u8, duration: u32, velocity: u8, start_time: u64) -> Self {
        Note {
            pitch,
            duration,
            velocity,
            start_time,
        }
    }

    pub fn end_time(&self) -> u64 {
        self.start_time + self.duration as u64
    }

    pub fn note_name(&self) -> &'static str {
        pitch_class_name(self.pitch)
    }

    pub fn octave(&self) -> i8 {
        octave_of(self.pitch)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.note_name(), self.octave())
    }
}

/// Triad shapes, as semitone offsets from the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
}

impl ChordQuality {
    pub fn offsets(self) -> [u8; 3] {
        match self {
            ChordQuality::Major => [0, 4, 7],
            ChordQuality::Minor => [0, 3, 7],
            ChordQuality::Diminished => [0, 3, 6],
        }
    }
}

/// Notes sharing a nominal start tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chord {
    notes: Vec<Note>,
    duration: u32,
    start_time: u64,
}

impl Chord {
    /// An empty chord at `start_time`. Its duration is zero until a note is added.
    pub fn new(start_time: u64) -> Self {
        Chord {
            notes: Vec::new(),
            duration: 0,
            start_time,
        }
    }

    /// Build a three-note chord on `root`, every tone at velocity 100.
    ///
    /// Tones above 255 saturate at 255, like `theory::scale_for`; the
    /// encoder rejects anything over 127.
    pub fn triad(quality: ChordQuality, root: u8, duration: u32, start_time: u64) -> Self {
        let mut chord = Chord::new(start_time);
        chord.duration = duration;
        for offset in quality.offsets() {
            chord.add_note(Note::new(
                root.saturating_add(offset),
                duration,
                CHORD_VELOCITY,
                start_time,
            ));
        }
        chord
    }

    pub fn major(root: u8, duration: u32, start_time: u64) -> Self {
        Chord::triad(ChordQuality::Major, root, duration, start_time)
    }

    pub fn minor(root: u8, duration: u32, start_time: u64) -> Self {
        Chord::triad(ChordQuality::Minor, root, duration, start_time)
    }

    pub fn diminished(root: u8, duration: u32, start_time: u64) -> Self {
        Chord::triad(ChordQuality::Diminished, root, duration, start_time)
    }

    /// Append a note, widening the chord's duration if the note is longer.
    pub fn add_note(&mut self, note: Note) {
        self.duration = self.duration.max(note.duration);
        self.notes.push(note);
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    /// Pitch of the first note added, which the triad constructors make the root.
    pub fn root_pitch(&self) -> Option<u8> {
        self.notes.first().map(|n| n.pitch)
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn start_time(&self) -> u64 {
        self.start_time
    }

    pub fn end_time(&self) -> u64 {
        self.start_time + self.duration as u64
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.notes.iter().map(|n| n.note_name()).collect();
        write!(
            f,
            "[{}] dur={} start={}",
            names.join(" "),
            self.duration,
            self.start_time
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_name_and_octave() {
        let c4 = Note::new(60, 480, 100, 0);
        assert_eq!(c4.note_name(), "C");
        assert_eq!(c4.octave(), 4);
        assert_eq!(c4.to_string(), "C4");
        assert_eq!(Note::new(61, 1, 1, 0).to_string(), "C#4");
        assert_eq!(Note::new(21, 1, 1, 0).to_string(), "A0");
        assert_eq!(Note::new(108, 1, 1, 0).to_string(), "C8");
    }

    #[test]
    fn test_major_chord() {
        let chord = Chord::major(60, 480, 960);
        let pitches: Vec<u8> = chord.notes().iter().map(|n| n.pitch).collect();
        assert_eq!(pitches, vec![60, 64, 67]);
        for note in chord.notes() {
            assert_eq!(note.duration, 480);
            assert_eq!(note.start_time, 960);
            assert_eq!(note.velocity, CHORD_VELOCITY);
        }
        assert_eq!(chord.duration(), 480);
        assert_eq!(chord.start_time(), 960);
        assert_eq!(chord.root_pitch(), Some(60));
    }

    #[test]
    fn test_minor_and_diminished_shapes() {
        let minor: Vec<u8> = Chord::minor(57, 1, 0).notes().iter().map(|n| n.pitch).collect();
        assert_eq!(minor, vec![57, 60, 64]);
        let dim: Vec<u8> = Chord::diminished(59, 1, 0).notes().iter().map(|n| n.pitch).collect();
        assert_eq!(dim, vec![59, 62, 65]);
    }

    #[test]
    fn test_triad_saturates_past_u8() {
        let pitches: Vec<u8> = Chord::major(250, 1, 0).notes().iter().map(|n| n.pitch).collect();
        assert_eq!(pitches, vec![250, 254, 255]);
    }

    #[test]
    fn test_duration_only_grows() {
        let mut chord = Chord::new(0);
        assert_eq!(chord.duration(), 0);
        assert_eq!(chord.root_pitch(), None);
        chord.add_note(Note::new(60, 240, 100, 0));
        assert_eq!(chord.duration(), 240);
        chord.add_note(Note::new(64, 480, 100, 0));
        assert_eq!(chord.duration(), 480);
        chord.add_note(Note::new(67, 120, 100, 0));
        assert_eq!(chord.duration(), 480);
        assert_eq!(chord.note_count(), 3);
        assert_eq!(chord.end_time(), 480);
    }

    #[test]
    fn test_chord_display() {
        let chord = Chord::major(62, 480, 0);
        assert_eq!(chord.to_string(), "[D F# A] dur=480 start=0");
    }
}
