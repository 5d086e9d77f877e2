use thiserror::Error;
use tracing::debug;

use crate::generator::{GenerateError, ScenarioGenerator};
use crate::library::{Collection, SavedItem, ScenarioContent, ScenarioHistoryItem};

#[derive(Debug, Error)]
pub enum VersionError {
    #[error("no scenario is active")]
    NoActiveScenario,
    #[error(transparent)]
    Generate(#[from] GenerateError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectOutcome {
    /// An existing entry was activated at its latest version.
    Activated,
    /// No usable entry exists; the caller must generate for this id.
    NeedsGeneration(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The active version was removed and the latest remaining one is active.
    VersionRemoved,
    /// The last version went away, taking the whole entry with it.
    ScenarioRemoved,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Selection {
    scenario_id: String,
    version: usize,
}

/// In-memory owner of the collection root and the active scenario/version.
///
/// All history mutations go through here so that the ordering rules hold:
/// new versions are inserted at index 0, at most `MAX_VERSIONS` are kept, and
/// an entry with no versions left is removed.
pub struct VersionStore {
    collection: Collection,
    active: Option<Selection>,
}

impl VersionStore {
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            active: None,
        }
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.as_ref().map(|s| s.scenario_id.as_str())
    }

    pub fn active_version(&self) -> Option<usize> {
        self.active.as_ref().map(|s| s.version)
    }

    pub fn active_item(&self) -> Option<&ScenarioHistoryItem> {
        let id = self.active_id()?;
        self.collection.find(id)
    }

    pub fn active_content(&self) -> Option<&ScenarioContent> {
        let sel = self.active.as_ref()?;
        self.collection
            .find(&sel.scenario_id)?
            .versions
            .get(sel.version)
    }

    /// Swap in a whole new collection (after a merge or an identity change).
    /// The selection survives only if its entry still exists.
    pub fn replace_collection(&mut self, collection: Collection) {
        self.collection = collection;
        let still_valid = self
            .active
            .as_ref()
            .and_then(|s| self.collection.find(&s.scenario_id))
            .is_some_and(|item| !item.versions.is_empty());
        if still_valid {
            if let Some(sel) = self.active.as_mut() {
                sel.version = 0;
            }
        } else {
            self.active = None;
        }
    }

    /// Clear the selection, returning the view to idle.
    pub fn go_home(&mut self) {
        self.active = None;
    }

    /// First half of `select_scenario`: activate an existing entry, or report
    /// that generation is needed.
    pub fn begin_select(&mut self, name: &str, now: i64) -> SelectOutcome {
        let id = name.trim();
        match self.collection.history.iter_mut().find(|h| h.id == id) {
            Some(item) if !item.versions.is_empty() => {
                item.last_accessed = now;
                self.active = Some(Selection {
                    scenario_id: id.to_string(),
                    version: 0,
                });
                debug!(scenario = id, "activated existing scenario");
                SelectOutcome::Activated
            }
            _ => SelectOutcome::NeedsGeneration(id.to_string()),
        }
    }

    /// First half of `regenerate`: the id to generate for.
    pub fn begin_regenerate(&self) -> Result<String, VersionError> {
        self.active_id()
            .map(str::to_string)
            .ok_or(VersionError::NoActiveScenario)
    }

    /// Commit freshly generated content for `id` and activate it.
    ///
    /// An existing entry gets the content prepended (evicting past the cap);
    /// otherwise a new entry is inserted at the front of history.
    pub fn complete_generation(&mut self, id: &str, content: ScenarioContent, now: i64) {
        match self.collection.history.iter_mut().find(|h| h.id == id) {
            Some(item) => {
                item.push_version(content);
                item.last_accessed = now;
            }
            None => {
                self.collection
                    .history
                    .insert(0, ScenarioHistoryItem::new(id, content, now));
            }
        }
        self.active = Some(Selection {
            scenario_id: id.to_string(),
            version: 0,
        });
    }

    pub fn select_scenario(
        &mut self,
        name: &str,
        generator: &dyn ScenarioGenerator,
        now: i64,
    ) -> Result<(), VersionError> {
        if let SelectOutcome::NeedsGeneration(id) = self.begin_select(name, now) {
            let content = generator.generate(&id)?;
            self.complete_generation(&id, content, now);
        }
        Ok(())
    }

    pub fn regenerate(
        &mut self,
        generator: &dyn ScenarioGenerator,
        now: i64,
    ) -> Result<(), VersionError> {
        let id = self.begin_regenerate()?;
        let content = generator.generate(&id)?;
        self.complete_generation(&id, content, now);
        Ok(())
    }

    /// Out-of-range indices are ignored.
    pub fn select_version(&mut self, index: usize) {
        let Some(len) = self.active_item().map(|item| item.versions.len()) else {
            return;
        };
        if index < len
            && let Some(sel) = self.active.as_mut()
        {
            sel.version = index;
        }
    }

    /// Remove the active version. Returns `None` when nothing is active.
    pub fn delete_version(&mut self) -> Option<DeleteOutcome> {
        let sel = self.active.clone()?;
        let pos = self.collection.position(&sel.scenario_id)?;
        let item = &mut self.collection.history[pos];
        if sel.version < item.versions.len() {
            item.versions.remove(sel.version);
        }

        if item.versions.is_empty() {
            self.collection.history.remove(pos);
            self.active = None;
            Some(DeleteOutcome::ScenarioRemoved)
        } else {
            self.active = Some(Selection {
                scenario_id: sel.scenario_id,
                version: 0,
            });
            Some(DeleteOutcome::VersionRemoved)
        }
    }

    /// Remove a whole history entry. Returns whether anything was removed.
    pub fn delete_scenario(&mut self, id: &str) -> bool {
        let before = self.collection.history.len();
        self.collection.history.retain(|h| h.id != id);
        if self.active_id() == Some(id) {
            self.active = None;
        }
        self.collection.history.len() != before
    }

    /// Remove the item if its `(id, kind)` is already saved, append it
    /// otherwise. Returns `true` when the item is saved afterwards.
    pub fn toggle_saved_item(&mut self, item: SavedItem) -> bool {
        let favorites = &mut self.collection.favorites;
        if let Some(pos) = favorites.iter().position(|f| f.key() == item.key()) {
            favorites.remove(pos);
            false
        } else {
            favorites.push(item);
            true
        }
    }

    /// Bring in content from a share link as the latest version of its
    /// scenario, moving that entry to the front.
    pub fn import_shared(&mut self, content: ScenarioContent, now: i64) {
        let id = content.scenario.trim().to_string();
        match self.collection.position(&id) {
            Some(pos) => {
                let mut item = self.collection.history.remove(pos);
                item.push_version(content);
                item.last_accessed = now;
                self.collection.history.insert(0, item);
            }
            None => {
                self.collection
                    .history
                    .insert(0, ScenarioHistoryItem::new(&id, content, now));
            }
        }
        self.active = Some(Selection {
            scenario_id: id,
            version: 0,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::library::MAX_VERSIONS;
    use crate::library::fixtures::{content, item};

    struct CountingGenerator {
        calls: Cell<i64>,
    }

    impl CountingGenerator {
        fn new() -> Self {
            Self { calls: Cell::new(0) }
        }
    }

    impl ScenarioGenerator for CountingGenerator {
        fn generate(&self, scenario: &str) -> Result<ScenarioContent, GenerateError> {
            let n = self.calls.get() + 1;
            self.calls.set(n);
            Ok(content(scenario, n))
        }
    }

    struct FailingGenerator;

    impl ScenarioGenerator for FailingGenerator {
        fn generate(&self, _scenario: &str) -> Result<ScenarioContent, GenerateError> {
            Err(GenerateError::Malformed("truncated".to_string()))
        }
    }

    #[test]
    fn test_select_new_scenario_generates_and_activates() {
        let mut store = VersionStore::new(Collection::default());
        let generator = CountingGenerator::new();
        store
            .select_scenario("ordering coffee", &generator, 100)
            .unwrap();

        assert_eq!(store.collection().history.len(), 1);
        assert_eq!(store.collection().history[0].versions.len(), 1);
        assert_eq!(store.active_id(), Some("ordering coffee"));
        assert_eq!(store.active_version(), Some(0));
        assert!(store.active_content().is_some());
    }

    #[test]
    fn test_select_existing_scenario_skips_generation() {
        let mut collection = Collection::default();
        collection.history.push(item("ordering coffee", 2, 50));
        let mut store = VersionStore::new(collection);
        let generator = CountingGenerator::new();

        store
            .select_scenario("ordering coffee", &generator, 100)
            .unwrap();

        assert_eq!(generator.calls.get(), 0);
        assert_eq!(store.active_version(), Some(0));
        assert_eq!(store.collection().history[0].last_accessed, 100);
    }

    #[test]
    fn test_failed_generation_leaves_no_entry() {
        let mut store = VersionStore::new(Collection::default());
        let result = store.select_scenario("ordering coffee", &FailingGenerator, 1);
        assert!(matches!(result, Err(VersionError::Generate(_))));
        assert!(store.collection().history.is_empty());
        assert!(store.active_id().is_none());
    }

    #[test]
    fn test_new_scenario_goes_to_front() {
        let mut collection = Collection::default();
        collection.history.push(item("asking directions", 1, 10));
        let mut store = VersionStore::new(collection);
        store
            .select_scenario("ordering coffee", &CountingGenerator::new(), 20)
            .unwrap();
        assert_eq!(store.collection().history[0].id, "ordering coffee");
        assert_eq!(store.collection().history[1].id, "asking directions");
    }

    #[test]
    fn test_regenerate_length_is_capped_and_newest_first() {
        let generator = CountingGenerator::new();
        for calls in 0..8usize {
            let mut store = VersionStore::new(Collection::default());
            generator.calls.set(0);
            store.select_scenario("ordering coffee", &generator, 0).unwrap();
            for _ in 0..calls {
                store.regenerate(&generator, 0).unwrap();
            }
            let versions = &store.active_item().unwrap().versions;
            assert_eq!(versions.len(), (calls + 1).min(MAX_VERSIONS));
            assert!(
                versions
                    .windows(2)
                    .all(|w| w[0].created_at > w[1].created_at)
            );
            assert_eq!(store.active_version(), Some(0));
        }
    }

    #[test]
    fn test_regenerate_five_more_evicts_original() {
        let generator = CountingGenerator::new();
        let mut store = VersionStore::new(Collection::default());
        store.select_scenario("ordering coffee", &generator, 0).unwrap();
        let original = store.active_content().unwrap().clone();
        for _ in 0..5 {
            store.regenerate(&generator, 0).unwrap();
        }
        let versions = &store.active_item().unwrap().versions;
        assert_eq!(versions.len(), 5);
        assert!(!versions.contains(&original));
    }

    #[test]
    fn test_regenerate_without_active_scenario() {
        let mut store = VersionStore::new(Collection::default());
        let result = store.regenerate(&CountingGenerator::new(), 0);
        assert!(matches!(result, Err(VersionError::NoActiveScenario)));
    }

    #[test]
    fn test_failed_regenerate_keeps_versions() {
        let mut collection = Collection::default();
        collection.history.push(item("ordering coffee", 3, 50));
        let mut store = VersionStore::new(collection.clone());
        store.begin_select("ordering coffee", 50);
        store.select_version(2);

        assert!(store.regenerate(&FailingGenerator, 60).is_err());
        assert_eq!(store.collection(), &collection);
        assert_eq!(store.active_version(), Some(2));
    }

    #[test]
    fn test_select_version_out_of_range_is_ignored() {
        let mut collection = Collection::default();
        collection.history.push(item("ordering coffee", 3, 50));
        let mut store = VersionStore::new(collection);
        store.begin_select("ordering coffee", 50);

        store.select_version(2);
        assert_eq!(store.active_version(), Some(2));
        store.select_version(3);
        assert_eq!(store.active_version(), Some(2));
        store.select_version(usize::MAX);
        assert_eq!(store.active_version(), Some(2));
    }

    #[test]
    fn test_delete_only_version_removes_scenario() {
        let mut store = VersionStore::new(Collection::default());
        store
            .select_scenario("ordering coffee", &CountingGenerator::new(), 0)
            .unwrap();

        assert_eq!(store.delete_version(), Some(DeleteOutcome::ScenarioRemoved));
        assert!(store.collection().history.is_empty());
        assert!(store.active_id().is_none());
    }

    #[test]
    fn test_delete_one_of_several_reactivates_latest() {
        let mut collection = Collection::default();
        collection.history.push(item("ordering coffee", 4, 50));
        let mut store = VersionStore::new(collection);
        store.begin_select("ordering coffee", 50);
        store.select_version(2);
        let removed = store.active_content().unwrap().clone();

        assert_eq!(store.delete_version(), Some(DeleteOutcome::VersionRemoved));
        let versions = &store.active_item().unwrap().versions;
        assert_eq!(versions.len(), 3);
        assert!(!versions.contains(&removed));
        assert_eq!(store.active_version(), Some(0));
    }

    #[test]
    fn test_delete_version_without_selection() {
        let mut store = VersionStore::new(Collection::default());
        assert_eq!(store.delete_version(), None);
    }

    #[test]
    fn test_delete_scenario_clears_active() {
        let mut collection = Collection::default();
        collection.history.push(item("ordering coffee", 2, 50));
        collection.history.push(item("asking directions", 1, 40));
        let mut store = VersionStore::new(collection);
        store.begin_select("ordering coffee", 60);

        assert!(store.delete_scenario("ordering coffee"));
        assert!(store.active_id().is_none());
        assert_eq!(store.collection().history.len(), 1);
        assert!(!store.delete_scenario("ordering coffee"));
    }

    #[test]
    fn test_toggle_saved_item_is_its_own_inverse() {
        let c = content("ordering coffee", 1);
        let mut store = VersionStore::new(Collection::default());
        store.toggle_saved_item(SavedItem::expression(&c.expressions[0], 1));
        let before = store.collection().clone();

        let item = SavedItem::vocab(&c.vocabulary[0], 2);
        assert!(store.toggle_saved_item(item.clone()));
        assert!(!store.toggle_saved_item(item));
        assert_eq!(store.collection(), &before);
    }

    #[test]
    fn test_toggle_matches_on_id_and_kind() {
        let c = content("ordering coffee", 1);
        let mut store = VersionStore::new(Collection::default());
        let vocab = SavedItem::vocab(&c.vocabulary[0], 1);
        let mut same_text_expression = SavedItem::expression(&c.expressions[0], 1);
        same_text_expression.id = vocab.id.clone();

        store.toggle_saved_item(vocab);
        store.toggle_saved_item(same_text_expression);
        assert_eq!(store.collection().favorites.len(), 2);
    }

    #[test]
    fn test_import_shared_creates_single_version_entry() {
        let mut store = VersionStore::new(Collection::default());
        let shared = content("asking directions", 7);
        store.import_shared(shared.clone(), 10);

        let entry = store.collection().find("asking directions").unwrap();
        assert_eq!(entry.versions, vec![shared]);
        assert_eq!(store.active_id(), Some("asking directions"));
    }

    #[test]
    fn test_import_shared_prepends_to_existing_entry() {
        let mut collection = Collection::default();
        collection.history.push(item("ordering coffee", 1, 50));
        collection.history.push(item("asking directions", 2, 40));
        let mut store = VersionStore::new(collection);

        let shared = content("asking directions", 99);
        store.import_shared(shared.clone(), 100);

        let history = &store.collection().history;
        assert_eq!(history[0].id, "asking directions");
        assert_eq!(history[0].versions.len(), 3);
        assert_eq!(history[0].versions[0], shared);
    }

    #[test]
    fn test_replace_collection_drops_missing_selection() {
        let mut store = VersionStore::new(Collection::default());
        store
            .select_scenario("ordering coffee", &CountingGenerator::new(), 0)
            .unwrap();
        store.replace_collection(Collection::default());
        assert!(store.active_id().is_none());
    }
}
