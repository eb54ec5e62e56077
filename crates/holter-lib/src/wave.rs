use serde::{Deserialize, Serialize};

/// Wave classification as delivered by the delineation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WaveType {
    P,
    Qrs,
    T,
    Inv,
}

impl WaveType {
    /// Map the record label ("P", "QRS", "T", "INV") onto a variant.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "P" => Some(WaveType::P),
            "QRS" => Some(WaveType::Qrs),
            "T" => Some(WaveType::T),
            "INV" => Some(WaveType::Inv),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WaveType::P => "P",
            WaveType::Qrs => "QRS",
            WaveType::T => "T",
            WaveType::Inv => "INV",
        }
    }
}

/// Clinical qualifier attached to a wave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WaveTag {
    Aberration,
    Ectopic,
    Junctional,
    Manual,
    NonConducted,
    Paced,
    Premature,
}

impl WaveTag {
    /// Map the lowercase-hyphenated record label onto a variant.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "aberration" => Some(WaveTag::Aberration),
            "ectopic" => Some(WaveTag::Ectopic),
            "junctional" => Some(WaveTag::Junctional),
            "manual" => Some(WaveTag::Manual),
            "non-conducted" => Some(WaveTag::NonConducted),
            "paced" => Some(WaveTag::Paced),
            "premature" => Some(WaveTag::Premature),
            _ => None,
        }
    }
}

/// Onset/offset of a pulse, in milliseconds from the record start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveTiming {
    pub onset: f64,
    pub offset: f64,
}

/// One delineated wave: type, pulse timing, and optional qualifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wave {
    pub kind: WaveType,
    pub timing: WaveTiming,
    pub tags: Vec<WaveTag>,
}

impl Wave {
    pub fn new(kind: WaveType, timing: WaveTiming, tags: Vec<WaveTag>) -> Self {
        Self { kind, timing, tags }
    }

    pub fn has_tag(&self, tag: WaveTag) -> bool {
        self.tags.contains(&tag)
    }
}
