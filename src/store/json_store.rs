use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Serialize, de::DeserializeOwned};
use tracing::warn;

use crate::library::Collection;
use crate::store::schema::{FavoritesData, HistoryData, Preferences, Versioned};

const FAVORITES_FILE: &str = "favorites.json";
const HISTORY_FILE: &str = "history.json";
const PREFERENCES_FILE: &str = "preferences.json";
const DEVICE_ID_FILE: &str = "device_id";
const ACCOUNTS_DIR: &str = "accounts";
pub const DEVICE_ID_LEN: usize = 20;

/// On-device persistence: one JSON file per entity in the app data dir.
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kaiwa");
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    /// Store for one signed-in account's device copy, kept apart from the
    /// guest files under `accounts/{uid}`.
    pub fn account_store(&self, uid: &str) -> Result<Self> {
        let dir: String = uid
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        Self::with_base_dir(self.base_dir.join(ACCOUNTS_DIR).join(dir))
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    /// Missing, unreadable, unparsable or stale files all load as default.
    fn load<T: DeserializeOwned + Default + Versioned>(&self, name: &str) -> T {
        let path = self.file_path(name);
        if !path.exists() {
            return T::default();
        }
        let parsed = fs::read_to_string(&path)
            .ok()
            .and_then(|content| serde_json::from_str::<T>(&content).ok());
        match parsed {
            Some(data) if !data.needs_reset() => data,
            _ => {
                warn!(file = name, "discarding unreadable or outdated local data");
                T::default()
            }
        }
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let path = self.file_path(name);
        let tmp_path = path.with_extension("tmp");

        let json = serde_json::to_string_pretty(data)?;
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    pub fn load_collection(&self) -> Collection {
        let favorites: FavoritesData = self.load(FAVORITES_FILE);
        let history: HistoryData = self.load(HISTORY_FILE);
        Collection {
            favorites: favorites.favorites,
            history: history.history,
        }
    }

    pub fn save_collection(&self, collection: &Collection) -> Result<()> {
        self.save(
            FAVORITES_FILE,
            &FavoritesData {
                favorites: collection.favorites.clone(),
                ..FavoritesData::default()
            },
        )?;
        self.save(
            HISTORY_FILE,
            &HistoryData {
                history: collection.history.clone(),
                ..HistoryData::default()
            },
        )
    }

    /// Remove the collection files; missing files are not an error.
    pub fn clear_collection(&self) -> Result<()> {
        for name in [FAVORITES_FILE, HISTORY_FILE] {
            match fs::remove_file(self.file_path(name)) {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e.into()),
                _ => {}
            }
        }
        Ok(())
    }

    pub fn load_preferences(&self) -> Preferences {
        self.load(PREFERENCES_FILE)
    }

    pub fn save_preferences(&self, prefs: &Preferences) -> Result<()> {
        self.save(PREFERENCES_FILE, prefs)
    }

    /// Stable random identifier for this device, created on first use.
    pub fn device_id(&self) -> Result<String> {
        let path = self.file_path(DEVICE_ID_FILE);
        if let Ok(existing) = fs::read_to_string(&path) {
            let existing = existing.trim();
            if existing.len() == DEVICE_ID_LEN && existing.chars().all(|c| c.is_ascii_alphanumeric())
            {
                return Ok(existing.to_string());
            }
        }
        let id = random_id(DEVICE_ID_LEN);
        fs::write(&path, &id)?;
        Ok(id)
    }
}

pub fn random_id(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::speech::VoiceEngine;
    use crate::library::SavedItem;
    use crate::library::fixtures::{content, item};
    use crate::store::schema::Notation;
    use tempfile::TempDir;

    fn make_test_store() -> (TempDir, JsonStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_empty_store_loads_empty_collection() {
        let (_dir, store) = make_test_store();
        assert!(store.load_collection().is_empty());
        let prefs = store.load_preferences();
        assert_eq!(prefs.notation, Notation::Furigana);
        assert_eq!(prefs.voice_engine, VoiceEngine::Native);
    }

    #[test]
    fn test_collection_round_trip() {
        let (_dir, store) = make_test_store();
        let c = content("ordering coffee", 1);
        let collection = Collection {
            favorites: vec![SavedItem::vocab(&c.vocabulary[0], 5)],
            history: vec![item("ordering coffee", 3, 30)],
        };
        store.save_collection(&collection).unwrap();
        assert_eq!(store.load_collection(), collection);
        assert!(store.file_path("favorites.json").exists());
        assert!(store.file_path("history.json").exists());
    }

    #[test]
    fn test_account_store_is_separate_from_guest_files() {
        let (dir, store) = make_test_store();
        let account = store.account_store("u1/../x").unwrap();
        account
            .save_collection(&Collection {
                favorites: vec![],
                history: vec![item("ordering coffee", 1, 10)],
            })
            .unwrap();

        assert!(store.load_collection().is_empty());
        assert_eq!(account.load_collection().history.len(), 1);
        assert!(dir.path().join("accounts").join("u1____x").join("history.json").exists());

        account.clear_collection().unwrap();
        assert!(account.load_collection().is_empty());
        account.clear_collection().unwrap();
    }

    #[test]
    fn test_corrupt_file_loads_default() {
        let (_dir, store) = make_test_store();
        fs::write(store.file_path("history.json"), "{ not json").unwrap();
        assert!(store.load_collection().history.is_empty());
    }

    #[test]
    fn test_stale_schema_is_reset() {
        let (_dir, store) = make_test_store();
        fs::write(
            store.file_path("preferences.json"),
            r#"{"schema_version": 0, "notation": "romaji", "voice_engine": "ai"}"#,
        )
        .unwrap();
        assert_eq!(store.load_preferences().notation, Notation::Furigana);
    }

    #[test]
    fn test_preferences_round_trip() {
        let (_dir, store) = make_test_store();
        let prefs = Preferences {
            notation: Notation::Romaji,
            voice_engine: VoiceEngine::Ai,
            ..Preferences::default()
        };
        store.save_preferences(&prefs).unwrap();
        let loaded = store.load_preferences();
        assert_eq!(loaded.notation, Notation::Romaji);
        assert_eq!(loaded.voice_engine, VoiceEngine::Ai);
    }

    #[test]
    fn test_device_id_is_stable() {
        let (_dir, store) = make_test_store();
        let first = store.device_id().unwrap();
        assert_eq!(first.len(), DEVICE_ID_LEN);
        assert_eq!(store.device_id().unwrap(), first);
    }

    #[test]
    fn test_invalid_device_id_is_regenerated() {
        let (_dir, store) = make_test_store();
        fs::write(store.file_path("device_id"), "short").unwrap();
        let id = store.device_id().unwrap();
        assert_eq!(id.len(), DEVICE_ID_LEN);
        assert_ne!(id, "short");
    }

    #[test]
    fn test_save_leaves_no_tmp_files() {
        let (dir, store) = make_test_store();
        store.save_collection(&Collection::default()).unwrap();
        let tmp_files: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("tmp"))
            .collect();
        assert!(tmp_files.is_empty(), "no residual .tmp files");
    }
}
