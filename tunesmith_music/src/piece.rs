// A generated piece: melody, chords, and bass line plus playback metadata.
//
// The piece owns its three tracks. Callers read them through borrowed
// slices and add to them only through the `add_*` methods, so nothing
// outside can rewrite a track in place. Length is never stored; it is
// derived on demand as the latest end tick across all tracks.

use crate::error::{Error, Result};
use crate::note::{Chord, Note};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicalPiece {
    melody: Vec<Note>,
    chords: Vec<Chord>,
    bass_line: Vec<Note>,
    /// Quarter notes per minute.
    pub tempo: u16,
    /// Beats per measure. The beat unit is always a quarter note.
    pub time_signature: u8,
    /// MIDI resolution (ticks per quarter note).
    pub ticks_per_beat: u16,
    pub title: String,
    pub composer: String,
}

impl Default for MusicalPiece {
    fn default() -> Self {
        MusicalPiece {
            melody: Vec::new(),
            chords: Vec::new(),
            bass_line: Vec::new(),
            tempo: 120,
            time_signature: 4,
            ticks_per_beat: 480,
            title: "AI Generated Music".to_string(),
            composer: "Random Music Generator".to_string(),
        }
    }
}

impl MusicalPiece {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn melody(&self) -> &[Note] {
        &self.melody
    }

    pub fn chords(&self) -> &[Chord] {
        &self.chords
    }

    pub fn bass_line(&self) -> &[Note] {
        &self.bass_line
    }

    pub fn set_melody(&mut self, melody: Vec<Note>) {
        self.melody = melody;
    }

    pub fn set_chords(&mut self, chords: Vec<Chord>) {
        self.chords = chords;
    }

    pub fn set_bass_line(&mut self, bass_line: Vec<Note>) {
        self.bass_line = bass_line;
    }

    pub fn add_melody_note(&mut self, note: Note) {
        self.melody.push(note);
    }

    pub fn add_chord(&mut self, chord: Chord) {
        self.chords.push(chord);
    }

    pub fn add_bass_note(&mut self, note: Note) {
        self.bass_line.push(note);
    }

    pub fn clear(&mut self) {
        self.melody.clear();
        self.chords.clear();
        self.bass_line.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.melody.is_empty() && self.chords.is_empty() && self.bass_line.is_empty()
    }

    /// Every note in the piece: melody, then bass, then chord tones.
    pub fn all_notes(&self) -> Vec<Note> {
        self.melody
            .iter()
            .chain(&self.bass_line)
            .copied()
            .chain(self.chords.iter().flat_map(|c| c.notes().iter().copied()))
            .collect()
    }

    /// Latest end tick over all melody notes, chords, and bass notes.
    pub fn total_duration(&self) -> u64 {
        let melody_end = self.melody.iter().map(Note::end_time);
        let chord_end = self.chords.iter().map(Chord::end_time);
        let bass_end = self.bass_line.iter().map(Note::end_time);
        melody_end.chain(chord_end).chain(bass_end).max().unwrap_or(0)
    }

    /// Wall-clock length at the piece's tempo.
    pub fn duration_seconds(&self) -> f64 {
        let ticks_per_second = self.tempo as f64 * self.ticks_per_beat as f64 / 60.0;
        if ticks_per_second <= 0.0 {
            return 0.0;
        }
        self.total_duration() as f64 / ticks_per_second
    }

    /// Pretty-printed JSON of the whole piece.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(Error::PieceJson)
    }

    pub fn statistics(&self) -> PieceStats {
        PieceStats {
            title: self.title.clone(),
            composer: self.composer.clone(),
            tempo: self.tempo,
            time_signature: self.time_signature,
            duration_seconds: self.duration_seconds(),
            melody_notes: self.melody.len(),
            chords: self.chords.len(),
            bass_notes: self.bass_line.len(),
            total_ticks: self.total_duration(),
        }
    }
}

impl fmt::Display for MusicalPiece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' ({:.2}s, {} melody notes, {} chords, {} bass notes)",
            self.title,
            self.duration_seconds(),
            self.melody.len(),
            self.chords.len(),
            self.bass_line.len()
        )
    }
}

/// Summary numbers for a piece, printed after generation.
#[derive(Debug, Clone, PartialEq)]
pub struct PieceStats {
    pub title: String,
    pub composer: String,
    pub tempo: u16,
    pub time_signature: u8,
    pub duration_seconds: f64,
    pub melody_notes: usize,
    pub chords: usize,
    pub bass_notes: usize,
    pub total_ticks: u64,
}

impl fmt::Display for PieceStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Music Piece Statistics ===")?;
        writeln!(f, "Title: {}", self.title)?;
        writeln!(f, "Composer: {}", self.composer)?;
        writeln!(f, "Tempo: {} BPM", self.tempo)?;
        writeln!(f, "Time Signature: {}/4", self.time_signature)?;
        writeln!(f, "Duration: {:.2} seconds", self.duration_seconds)?;
        writeln!(f, "Melody Notes: {}", self.melody_notes)?;
        writeln!(f, "Chords: {}", self.chords)?;
        writeln!(f, "Bass Notes: {}", self.bass_notes)?;
        writeln!(f, "Total Ticks: {}", self.total_ticks)
    }
}
