pub mod merge;
pub mod versions;

use serde::{Deserialize, Serialize};

/// Maximum number of versions kept per scenario. Inserting past this evicts
/// the oldest version.
pub const MAX_VERSIONS: usize = 5;

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker {
    A,
    B,
}

impl Speaker {
    pub fn label(self) -> &'static str {
        match self {
            Speaker::A => "A",
            Speaker::B => "B",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabItem {
    pub word: String,
    #[serde(default)]
    pub reading: String,
    #[serde(default)]
    pub romaji: String,
    pub meaning: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expression {
    pub phrase: String,
    #[serde(default)]
    pub reading: String,
    #[serde(default)]
    pub romaji: String,
    pub meaning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueLine {
    pub speaker: Speaker,
    pub text: String,
    #[serde(default)]
    pub reading: String,
    #[serde(default)]
    pub romaji: String,
    #[serde(default)]
    pub translation: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueSection {
    pub title: String,
    pub lines: Vec<DialogueLine>,
}

/// One generated study-guide snapshot. Never edited after creation; a new
/// generation produces a new value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioContent {
    pub scenario: String,
    pub vocabulary: Vec<VocabItem>,
    pub expressions: Vec<Expression>,
    pub dialogue: Vec<DialogueSection>,
    pub created_at: i64,
}

/// All known versions of one named scenario, newest first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioHistoryItem {
    pub id: String,
    pub name: String,
    pub versions: Vec<ScenarioContent>,
    pub last_accessed: i64,
}

impl ScenarioHistoryItem {
    pub fn new(id: &str, content: ScenarioContent, now: i64) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            versions: vec![content],
            last_accessed: now,
        }
    }

    /// Insert at the front and drop whatever falls past `MAX_VERSIONS`.
    pub fn push_version(&mut self, content: ScenarioContent) {
        self.versions.insert(0, content);
        self.versions.truncate(MAX_VERSIONS);
    }

    pub fn latest(&self) -> Option<&ScenarioContent> {
        self.versions.first()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SavedKind {
    Vocab,
    Expression,
}

impl SavedKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SavedKind::Vocab => "vocab",
            SavedKind::Expression => "expression",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SavedContent {
    Vocab(VocabItem),
    Expression(Expression),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: SavedKind,
    pub content: SavedContent,
    pub saved_at: i64,
}

impl SavedItem {
    pub fn vocab(item: &VocabItem, now: i64) -> Self {
        Self {
            id: item.word.clone(),
            kind: SavedKind::Vocab,
            content: SavedContent::Vocab(item.clone()),
            saved_at: now,
        }
    }

    pub fn expression(item: &Expression, now: i64) -> Self {
        Self {
            id: item.phrase.clone(),
            kind: SavedKind::Expression,
            content: SavedContent::Expression(item.clone()),
            saved_at: now,
        }
    }

    pub fn key(&self) -> (&str, SavedKind) {
        (&self.id, self.kind)
    }

    pub fn meaning(&self) -> &str {
        match &self.content {
            SavedContent::Vocab(v) => &v.meaning,
            SavedContent::Expression(e) => &e.meaning,
        }
    }
}

/// Per-user state: starred items plus scenario history.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    #[serde(default)]
    pub favorites: Vec<SavedItem>,
    #[serde(default)]
    pub history: Vec<ScenarioHistoryItem>,
}

impl Collection {
    pub fn find(&self, id: &str) -> Option<&ScenarioHistoryItem> {
        self.history.iter().find(|h| h.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.history.iter().position(|h| h.id == id)
    }

    pub fn is_saved(&self, id: &str, kind: SavedKind) -> bool {
        self.favorites.iter().any(|f| f.key() == (id, kind))
    }

    pub fn is_empty(&self) -> bool {
        self.favorites.is_empty() && self.history.is_empty()
    }
}
