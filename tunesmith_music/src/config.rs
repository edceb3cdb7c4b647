// Generation session configuration.
//
// `GeneratorConfig` carries everything a `MusicGenerator` needs to start a
// session: scale choice, tempo, resolution, and the three complexity knobs.
// It is plain serde data so it can be loaded from a JSON file and then
// overridden field by field from the command line.
//
// Scale type and root are optional. Whichever is missing gets randomized
// when the generator is built (see generator.rs).

use crate::error::Result;
use crate::theory::ScaleType;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub scale_type: Option<ScaleType>,
    pub root_note: Option<u8>,
    /// Quarter notes per minute.
    pub tempo: u16,
    /// MIDI resolution written into the file header.
    pub ticks_per_beat: u16,
    /// Chance (0.0-1.0) of an octave shift per melody note; also sets melody velocity.
    pub melody_complexity: f64,
    /// Chance (0.0-1.0) that a chord may come out minor instead of major.
    pub harmony_complexity: f64,
    /// Chance (0.0-1.0) that a melody beat gets a shortened duration.
    pub rhythm_variety: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            scale_type: None,
            root_note: None,
            tempo: 120,
            ticks_per_beat: 480,
            melody_complexity: 0.7,
            harmony_complexity: 0.6,
            rhythm_variety: 0.5,
        }
    }
}

impl GeneratorConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: GeneratorConfig = serde_json::from_str(&data)?;
        Ok(config)
    }
}

/// Clamp a knob into [0, 1]. NaN counts as 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
