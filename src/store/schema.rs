use serde::{Deserialize, Serialize};

use crate::generator::speech::VoiceEngine;
use crate::library::{SavedItem, ScenarioHistoryItem};

pub const SCHEMA_VERSION: u32 = 1;

/// How readings are shown next to Japanese text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Notation {
    Furigana,
    Romaji,
}

impl Notation {
    pub fn label(self) -> &'static str {
        match self {
            Notation::Furigana => "furigana",
            Notation::Romaji => "romaji",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Notation::Furigana => Notation::Romaji,
            Notation::Romaji => Notation::Furigana,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FavoritesData {
    pub schema_version: u32,
    pub favorites: Vec<SavedItem>,
}

impl Default for FavoritesData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            favorites: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryData {
    pub schema_version: u32,
    pub history: Vec<ScenarioHistoryItem>,
}

impl Default for HistoryData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            history: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Preferences {
    pub schema_version: u32,
    #[serde(default = "default_notation")]
    pub notation: Notation,
    #[serde(default = "default_voice_engine")]
    pub voice_engine: VoiceEngine,
}

fn default_notation() -> Notation {
    Notation::Furigana
}

fn default_voice_engine() -> VoiceEngine {
    VoiceEngine::Native
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            notation: default_notation(),
            voice_engine: default_voice_engine(),
        }
    }
}

/// Stale schema versions are discarded rather than migrated.
pub trait Versioned {
    fn schema_version(&self) -> u32;

    fn needs_reset(&self) -> bool {
        self.schema_version() != SCHEMA_VERSION
    }
}

impl Versioned for FavoritesData {
    fn schema_version(&self) -> u32 {
        self.schema_version
    }
}

impl Versioned for HistoryData {
    fn schema_version(&self) -> u32 {
        self.schema_version
    }
}

impl Versioned for Preferences {
    fn schema_version(&self) -> u32 {
        self.schema_version
    }
}
