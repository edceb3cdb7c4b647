// MIDI output from generated pieces.
//
// Converts a MusicalPiece into a Standard MIDI File (SMF), Format 1:
//
// - Track 0: tempo, time signature (n/4, 24 clocks per click, 8 32nds per
//   quarter), and end-of-track at the piece's total duration.
// - Track 1: melody on channel 0, Acoustic Grand Piano.
// - Track 2: chords on channel 1, String Ensemble 1.
// - Track 3: bass on channel 2, Acoustic Bass.
//
// Each track is first collected as absolute-tick events, then sorted by
// tick (NOTE_OFF before NOTE_ON within a tick) and converted to delta
// times. Every event is validated during that conversion;
// anything the format cannot carry is an error, never clamped, since it
// means the generator produced bad data.
//
// There is also a single-track path for fixed demonstration melodies given
// as parallel pitch/duration slices (see `simple_melody_smf`).
//
// Uses the `midly` crate for the chunk framing and variable-length encoding.
// Files are encoded fully in memory before a single write.

use crate::error::{Error, Result};
use crate::instruments::{ACOUSTIC_BASS, ACOUSTIC_GRAND_PIANO, STRING_ENSEMBLE_1};
use crate::note::Note;
use crate::piece::MusicalPiece;
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::path::Path;
use tracing::{debug, info};

pub const MELODY_CHANNEL: u8 = 0;
pub const CHORD_CHANNEL: u8 = 1;
pub const BASS_CHANNEL: u8 = 2;

/// Resolution of the single-track demonstration path.
pub const SIMPLE_RESOLUTION: u16 = 480;
/// Tempo of the single-track demonstration path.
pub const SIMPLE_TEMPO: u16 = 120;
/// Velocity of every note in the single-track demonstration path.
pub const SIMPLE_VELOCITY: u8 = 100;

/// Time signature denominator as a power of two (2 = quarter note).
const TIME_SIG_DENOMINATOR_POW2: u8 = 2;
const TIME_SIG_CLOCKS_PER_CLICK: u8 = 24;
const TIME_SIG_32NDS_PER_QUARTER: u8 = 8;

const MAX_DELTA: u64 = 0x0FFF_FFFF;
const MAX_TEMPO_MICROS: u32 = 0x00FF_FFFF;
const MAX_TICKS_PER_BEAT: u16 = 0x7FFF;

/// One event in a track, before delta conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    NoteOn { channel: u8, key: u8, vel: u8 },
    NoteOff { channel: u8, key: u8 },
    ProgramChange { channel: u8, program: u8 },
    Tempo { micros_per_quarter: u32 },
    TimeSignature { numerator: u8 },
    EndOfTrack,
}

impl EventKind {
    /// Order among events sharing a tick: releases, then setup and meta
    /// events, then new notes, then the end of the track. A note that ends
    /// where the next one on the same key starts is released before it is
    /// struck again.
    pub fn tick_rank(&self) -> u8 {
        match self {
            EventKind::NoteOff { .. } => 0,
            EventKind::ProgramChange { .. }
            | EventKind::Tempo { .. }
            | EventKind::TimeSignature { .. } => 1,
            EventKind::NoteOn { .. } => 2,
            EventKind::EndOfTrack => 3,
        }
    }
}

/// An event at an absolute tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedEvent {
    pub tick: u64,
    pub kind: EventKind,
}

/// Collects one track's events at absolute ticks, in any order.
#[derive(Debug, Default)]
pub struct TrackBuilder {
    events: Vec<TimedEvent>,
}

impl TrackBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tick: u64, kind: EventKind) {
        self.events.push(TimedEvent { tick, kind });
    }

    pub fn program_change(&mut self, channel: u8, program: u8) {
        self.push(0, EventKind::ProgramChange { channel, program });
    }

    /// NOTE_ON at the note's start, NOTE_OFF (velocity 0) at its end.
    pub fn note(&mut self, channel: u8, note: &Note) {
        self.push(
            note.start_time,
            EventKind::NoteOn {
                channel,
                key: note.pitch,
                vel: note.velocity,
            },
        );
        self.push(
            note.end_time(),
            EventKind::NoteOff {
                channel,
                key: note.pitch,
            },
        );
    }

    /// Sort by tick, close the track with an end-of-track if it lacks one,
    /// and encode. Within a tick, note-offs come first and notes-on last
    /// (see `EventKind::tick_rank`), whatever order the notes were added in.
    pub fn finish(mut self) -> Result<Track<'static>> {
        self.events.sort_by_key(|e| (e.tick, e.kind.tick_rank()));
        let last = self.events.last().copied();
        if !matches!(last, Some(TimedEvent { kind: EventKind::EndOfTrack, .. })) {
            let tick = last.map_or(0, |e| e.tick);
            self.push(tick, EventKind::EndOfTrack);
        }
        encode_events(&self.events)
    }
}

/// Convert absolute-tick events to a delta-timed midly track.
///
/// Ticks must already be non-decreasing. Fails on the first event whose
/// data a MIDI file cannot represent.
pub fn encode_events(events: &[TimedEvent]) -> Result<Track<'static>> {
    let mut track: Track<'static> = Vec::with_capacity(events.len());
    let mut previous: u64 = 0;

    for event in events {
        if event.tick < previous {
            return Err(Error::NonMonotonicTick {
                previous,
                tick: event.tick,
            });
        }
        let delta = event.tick - previous;
        if delta > MAX_DELTA {
            return Err(Error::DeltaOverflow(delta));
        }
        track.push(TrackEvent {
            delta: u28::new(delta as u32),
            kind: event_kind(event)?,
        });
        previous = event.tick;
    }
    Ok(track)
}

fn event_kind(event: &TimedEvent) -> Result<TrackEventKind<'static>> {
    let kind = match event.kind {
        EventKind::NoteOn { channel, key, vel } => TrackEventKind::Midi {
            channel: check_channel(channel)?,
            message: MidiMessage::NoteOn {
                key: check_pitch(key, event.tick)?,
                vel: check_velocity(vel, event.tick)?,
            },
        },
        EventKind::NoteOff { channel, key } => TrackEventKind::Midi {
            channel: check_channel(channel)?,
            message: MidiMessage::NoteOff {
                key: check_pitch(key, event.tick)?,
                vel: u7::new(0),
            },
        },
        EventKind::ProgramChange { channel, program } => {
            if program > 127 {
                return Err(Error::InvalidProgram(program));
            }
            TrackEventKind::Midi {
                channel: check_channel(channel)?,
                message: MidiMessage::ProgramChange {
                    program: u7::new(program),
                },
            }
        }
        EventKind::Tempo { micros_per_quarter } => {
            TrackEventKind::Meta(MetaMessage::Tempo(u24::new(micros_per_quarter)))
        }
        EventKind::TimeSignature { numerator } => TrackEventKind::Meta(MetaMessage::TimeSignature(
            numerator,
            TIME_SIG_DENOMINATOR_POW2,
            TIME_SIG_CLOCKS_PER_CLICK,
            TIME_SIG_32NDS_PER_QUARTER,
        )),
        EventKind::EndOfTrack => TrackEventKind::Meta(MetaMessage::EndOfTrack),
    };
    Ok(kind)
}

fn check_channel(channel: u8) -> Result<u4> {
    if channel > 15 {
        return Err(Error::InvalidChannel(channel));
    }
    Ok(u4::new(channel))
}

fn check_pitch(pitch: u8, tick: u64) -> Result<u7> {
    if pitch > 127 {
        return Err(Error::InvalidPitch { pitch, tick });
    }
    Ok(u7::new(pitch))
}

fn check_velocity(velocity: u8, tick: u64) -> Result<u7> {
    if velocity > 127 {
        return Err(Error::InvalidVelocity { velocity, tick });
    }
    Ok(u7::new(velocity))
}

/// Microseconds per quarter note for a tempo in BPM.
pub fn tempo_micros(bpm: u16) -> Result<u32> {
    if bpm == 0 {
        return Err(Error::InvalidTempo(bpm));
    }
    let micros = 60_000_000 / bpm as u32;
    if micros > MAX_TEMPO_MICROS {
        return Err(Error::InvalidTempo(bpm));
    }
    Ok(micros)
}

fn metrical_header(ticks_per_beat: u16) -> Result<Header> {
    if ticks_per_beat == 0 || ticks_per_beat > MAX_TICKS_PER_BEAT {
        return Err(Error::InvalidResolution(ticks_per_beat));
    }
    Ok(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(ticks_per_beat)),
    ))
}

/// Convert a piece to an in-memory four-track SMF.
pub fn piece_to_smf(piece: &MusicalPiece) -> Result<Smf<'static>> {
    let mut smf = Smf::new(metrical_header(piece.ticks_per_beat)?);

    // Track 0: tempo track
    let mut meta = TrackBuilder::new();
    meta.push(
        0,
        EventKind::Tempo {
            micros_per_quarter: tempo_micros(piece.tempo)?,
        },
    );
    meta.push(
        0,
        EventKind::TimeSignature {
            numerator: piece.time_signature,
        },
    );
    meta.push(piece.total_duration(), EventKind::EndOfTrack);
    smf.tracks.push(meta.finish()?);

    let mut melody = TrackBuilder::new();
    melody.program_change(MELODY_CHANNEL, ACOUSTIC_GRAND_PIANO);
    for note in piece.melody() {
        melody.note(MELODY_CHANNEL, note);
    }
    smf.tracks.push(melody.finish()?);

    let mut chords = TrackBuilder::new();
    chords.program_change(CHORD_CHANNEL, STRING_ENSEMBLE_1);
    for note in piece.chords().iter().flat_map(|c| c.notes()) {
        chords.note(CHORD_CHANNEL, note);
    }
    smf.tracks.push(chords.finish()?);

    let mut bass = TrackBuilder::new();
    bass.program_change(BASS_CHANNEL, ACOUSTIC_BASS);
    for note in piece.bass_line() {
        bass.note(BASS_CHANNEL, note);
    }
    smf.tracks.push(bass.finish()?);

    Ok(smf)
}

fn smf_to_bytes(smf: &Smf<'_>) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    smf.write_std(&mut buf)?;
    Ok(buf)
}

/// Encode a piece to SMF bytes without touching the filesystem.
pub fn piece_to_smf_bytes(piece: &MusicalPiece) -> Result<Vec<u8>> {
    let bytes = smf_to_bytes(&piece_to_smf(piece)?)?;
    debug!(bytes = bytes.len(), ticks = piece.total_duration(), "encoded piece");
    Ok(bytes)
}

/// Encode a piece and write it to `path`.
///
/// Encoding finishes before the file is opened, so an encoding error leaves
/// nothing on disk.
pub fn export(piece: &MusicalPiece, path: &Path) -> Result<()> {
    let bytes = piece_to_smf_bytes(piece)?;
    std::fs::write(path, &bytes)?;
    info!(path = %path.display(), bytes = bytes.len(), "wrote MIDI file");
    Ok(())
}

/// Build a one-track SMF from parallel pitch and duration slices.
///
/// Durations are in units of a quarter of a beat (`d * 480 / 4` ticks).
/// Pitch 0 is a rest: the cursor advances but nothing sounds.
pub fn simple_melody_smf(pitches: &[u8], durations: &[u32]) -> Result<Smf<'static>> {
    if pitches.len() != durations.len() {
        return Err(Error::LengthMismatch {
            pitches: pitches.len(),
            durations: durations.len(),
        });
    }
    let mut smf = Smf::new(metrical_header(SIMPLE_RESOLUTION)?);

    let mut track = TrackBuilder::new();
    track.push(
        0,
        EventKind::Tempo {
            micros_per_quarter: tempo_micros(SIMPLE_TEMPO)?,
        },
    );
    let mut cursor: u64 = 0;
    for (&pitch, &duration) in pitches.iter().zip(durations) {
        let ticks = duration as u64 * SIMPLE_RESOLUTION as u64 / 4;
        if pitch > 0 {
            let length = u32::try_from(ticks).map_err(|_| Error::DeltaOverflow(ticks))?;
            let note = Note::new(pitch, length, SIMPLE_VELOCITY, cursor);
            track.note(MELODY_CHANNEL, &note);
        }
        cursor += ticks;
    }
    track.push(cursor, EventKind::EndOfTrack);
    smf.tracks.push(track.finish()?);
    Ok(smf)
}

pub fn simple_melody_bytes(pitches: &[u8], durations: &[u32]) -> Result<Vec<u8>> {
    smf_to_bytes(&simple_melody_smf(pitches, durations)?)
}

pub fn write_simple_midi(path: &Path, pitches: &[u8], durations: &[u32]) -> Result<()> {
    let bytes = simple_melody_bytes(pitches, durations)?;
    std::fs::write(path, &bytes)?;
    info!(path = %path.display(), notes = pitches.len(), "wrote simple melody");
    Ok(())
}
