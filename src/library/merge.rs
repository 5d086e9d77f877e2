use crate::library::{Collection, ScenarioHistoryItem};

/// Reconcile a device-local collection with the copy held remotely.
///
/// Remote favorites win on `(id, kind)` collisions; local-only ones are
/// appended. A local history entry replaces its remote counterpart only if it
/// has strictly more versions or a strictly newer `last_accessed`. The result
/// is ordered by `last_accessed`, newest first.
///
/// Note the replacement is wholesale: a local entry with fewer versions but a
/// newer access time discards the remote-only versions.
pub fn merge_collections(local: &Collection, remote: &Collection) -> Collection {
    let mut favorites = remote.favorites.clone();
    for item in &local.favorites {
        if !favorites.iter().any(|f| f.key() == item.key()) {
            favorites.push(item.clone());
        }
    }

    let mut history = remote.history.clone();
    for local_item in &local.history {
        match history.iter_mut().find(|h| h.id == local_item.id) {
            Some(remote_item) => {
                if local_wins(local_item, remote_item) {
                    *remote_item = local_item.clone();
                }
            }
            None => history.push(local_item.clone()),
        }
    }
    history.sort_by(|a, b| b.last_accessed.cmp(&a.last_accessed));

    Collection { favorites, history }
}

fn local_wins(local: &ScenarioHistoryItem, remote: &ScenarioHistoryItem) -> bool {
    local.versions.len() > remote.versions.len() || local.last_accessed > remote.last_accessed
}
