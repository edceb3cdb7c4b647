// Tunesmith Music Generator
//
// Generates short pieces (melody, per-beat chord progression, bass line)
// from a handful of stochastic rules over fixed scale and progression
// tables, then writes them out as multi-track Standard MIDI Files. Three
// complexity knobs in [0, 1] steer how adventurous the melody, harmony, and
// rhythm get; nothing here tries to judge aesthetic quality.
//
// Architecture:
// - theory.rs: Scale interval tables, progressions, consonance, random roots
// - note.rs: Note and Chord value types (triad constructors)
// - piece.rs: MusicalPiece container, derived duration and statistics
// - config.rs: GeneratorConfig session settings, JSON loading
// - generator.rs: MusicGenerator session: chords, melody, bass passes
// - midi.rs: SMF Format 1 encoding with event validation, simple melody path
// - instruments.rs: General MIDI program names
// - error.rs: Error type for encoding, config, and I/O failures
//
// The generator is deterministic given a seeded RNG, supporting reproducible
// output.

pub mod config;
pub mod error;
pub mod generator;
pub mod instruments;
pub mod midi;
pub mod note;
pub mod piece;
pub mod theory;

pub use config::GeneratorConfig;
pub use error::{Error, Result};
pub use generator::MusicGenerator;
pub use note::{Chord, ChordQuality, Note};
pub use piece::MusicalPiece;
pub use theory::ScaleType;
