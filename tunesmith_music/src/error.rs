// Error types for piece encoding and configuration loading.
//
// Generation itself has no failure path: every knob is clamped on entry and
// every table lookup is total. What can fail is turning a piece into SMF
// bytes (event data the format cannot carry), reading a config file,
// dumping a piece as JSON, and writing the output file.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("piece JSON encode error: {0}")]
    PieceJson(serde_json::Error),

    #[error("MIDI channel {0} out of range (0-15)")]
    InvalidChannel(u8),

    #[error("pitch {pitch} out of range (0-127) at tick {tick}")]
    InvalidPitch { pitch: u8, tick: u64 },

    #[error("velocity {velocity} out of range (0-127) at tick {tick}")]
    InvalidVelocity { velocity: u8, tick: u64 },

    #[error("program {0} out of range (0-127)")]
    InvalidProgram(u8),

    #[error("tempo {0} BPM cannot be encoded as microseconds per quarter note")]
    InvalidTempo(u16),

    #[error("ticks per beat {0} out of range (1-32767)")]
    InvalidResolution(u16),

    #[error("event at tick {tick} follows an event at tick {previous}")]
    NonMonotonicTick { previous: u64, tick: u64 },

    #[error("delta of {0} ticks does not fit in a MIDI variable-length quantity")]
    DeltaOverflow(u64),

    #[error("{pitches} pitches but {durations} durations")]
    LengthMismatch { pitches: usize, durations: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
