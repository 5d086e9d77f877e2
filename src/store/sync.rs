use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::library::Collection;
use crate::library::merge::merge_collections;
use crate::session::{Identity, Session};
use crate::store::json_store::JsonStore;
use crate::store::remote::{Document, DocumentStore, RemoteError, USERS};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PersistOutcome {
    /// Sign-in merge still running; nothing written.
    Skipped,
    Local,
    Remote,
    /// Remote write failed (or no remote configured) so the account's device
    /// copy was written instead.
    LocalFallback,
    /// The account has not been reconciled with its remote copy yet, so only
    /// the account's device copy was written.
    Deferred,
    /// Neither store accepted the write.
    Failed,
}

/// Routes whole-collection reads and writes to the device or the remote
/// store depending on who owns the session.
pub struct SyncAdapter {
    local: Option<JsonStore>,
    remote: Option<Arc<dyn DocumentStore>>,
}

pub fn collection_to_document(collection: &Collection) -> Result<Document, RemoteError> {
    match serde_json::to_value(collection) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(RemoteError::Decode(format!("expected object, got {other}"))),
        Err(e) => Err(RemoteError::Decode(e.to_string())),
    }
}

pub fn document_to_collection(doc: Document) -> Result<Collection, RemoteError> {
    serde_json::from_value(Value::Object(doc)).map_err(|e| RemoteError::Decode(e.to_string()))
}

impl SyncAdapter {
    pub fn new(local: Option<JsonStore>, remote: Option<Arc<dyn DocumentStore>>) -> Self {
        Self { local, remote }
    }

    pub fn local(&self) -> Option<&JsonStore> {
        self.local.as_ref()
    }

    pub fn remote(&self) -> Option<Arc<dyn DocumentStore>> {
        self.remote.clone()
    }

    /// The guest collection on this device.
    pub fn load_local(&self) -> Collection {
        self.local
            .as_ref()
            .map(JsonStore::load_collection)
            .unwrap_or_default()
    }

    /// What an account saved on this device while its remote copy was out
    /// of reach.
    pub fn load_account_copy(&self, uid: &str) -> Collection {
        self.account_store(uid)
            .map(|store| store.load_collection())
            .unwrap_or_default()
    }

    fn account_store(&self, uid: &str) -> Option<JsonStore> {
        let local = self.local.as_ref()?;
        match local.account_store(uid) {
            Ok(store) => Some(store),
            Err(e) => {
                warn!(uid, error = %e, "account device copy unavailable");
                None
            }
        }
    }

    pub fn fetch_remote(&self, uid: &str) -> Result<Option<Collection>, RemoteError> {
        let remote = self.remote.as_ref().ok_or(RemoteError::Unavailable)?;
        remote
            .get(USERS, uid)?
            .map(document_to_collection)
            .transpose()
    }

    fn write_remote(&self, uid: &str, collection: &Collection) -> Result<(), RemoteError> {
        let remote = self.remote.as_ref().ok_or(RemoteError::Unavailable)?;
        remote.merge(USERS, uid, collection_to_document(collection)?)
    }

    /// One-time reconciliation when an account session starts. Returns the
    /// collection that becomes the in-memory state, and clears the session's
    /// syncing flag only after that collection is settled.
    ///
    /// If the remote copy cannot be read the session stays unmerged: writes
    /// go to the account's device copy and `resync` retries the merge.
    pub fn sign_in(&self, session: &mut Session, local: &Collection) -> Collection {
        let settled = match &session.identity {
            Identity::Guest { .. } => local.clone(),
            Identity::Account { uid, .. } => {
                let uid = uid.clone();
                let local = self.with_account_copy(&uid, local);
                match self.merge_for(&uid, &local) {
                    Some(merged) => {
                        self.drop_account_copy(&uid);
                        session.mark_merged();
                        merged
                    }
                    None => local,
                }
            }
        };
        session.finish_sync();
        settled
    }

    /// Retry the sign-in merge for an account that has not been reconciled.
    /// Returns the merged collection once the remote copy is reachable.
    pub fn resync(&self, session: &mut Session, current: &Collection) -> Option<Collection> {
        if session.is_merged() || session.is_syncing() {
            return None;
        }
        let Identity::Account { uid, .. } = &session.identity else {
            return None;
        };
        let uid = uid.clone();
        let merged = self.merge_for(&uid, current)?;
        self.drop_account_copy(&uid);
        session.mark_merged();
        Some(merged)
    }

    fn with_account_copy(&self, uid: &str, local: &Collection) -> Collection {
        let copy = self.load_account_copy(uid);
        if copy.is_empty() {
            local.clone()
        } else {
            info!(uid, history = copy.history.len(), "including account device copy");
            merge_collections(local, &copy)
        }
    }

    fn drop_account_copy(&self, uid: &str) {
        let Some(store) = self.account_store(uid) else {
            return;
        };
        if let Err(e) = store.clear_collection() {
            warn!(uid, error = %e, "could not clear account device copy");
        }
    }

    /// `None` when the remote copy could not be read, or could not be seeded
    /// when absent; nothing remote has been learned then.
    fn merge_for(&self, uid: &str, local: &Collection) -> Option<Collection> {
        match self.fetch_remote(uid) {
            Ok(None) => {
                info!(uid, "no remote collection yet, uploading local copy");
                match self.write_remote(uid, local) {
                    Ok(()) => Some(local.clone()),
                    Err(e) => {
                        warn!(uid, error = %e, "could not seed remote collection");
                        None
                    }
                }
            }
            Ok(Some(remote)) => {
                let merged = merge_collections(local, &remote);
                info!(
                    uid,
                    favorites = merged.favorites.len(),
                    history = merged.history.len(),
                    "merged local and remote collections"
                );
                if let Err(e) = self.write_remote(uid, &merged) {
                    warn!(uid, error = %e, "could not write merged collection");
                }
                Some(merged)
            }
            Err(e) => {
                warn!(uid, error = %e, "remote fetch failed, keeping local collection");
                None
            }
        }
    }

    /// Write the whole collection to whichever store owns the session.
    pub fn persist(&self, session: &Session, collection: &Collection) -> PersistOutcome {
        if session.is_syncing() {
            return PersistOutcome::Skipped;
        }

        if let Identity::Account { uid, .. } = &session.identity {
            if !session.is_merged() {
                return if self.write_account_copy(uid, collection) {
                    PersistOutcome::Deferred
                } else {
                    PersistOutcome::Failed
                };
            }
            match self.write_remote(uid, collection) {
                Ok(()) => return PersistOutcome::Remote,
                Err(e) => warn!(uid, error = %e, "remote write failed, saving on device"),
            }
            return if self.write_account_copy(uid, collection) {
                PersistOutcome::LocalFallback
            } else {
                PersistOutcome::Failed
            };
        }

        match &self.local {
            Some(local) if save_logged(local, collection) => PersistOutcome::Local,
            _ => PersistOutcome::Failed,
        }
    }

    fn write_account_copy(&self, uid: &str, collection: &Collection) -> bool {
        self.account_store(uid)
            .is_some_and(|store| save_logged(&store, collection))
    }
}

fn save_logged(store: &JsonStore, collection: &Collection) -> bool {
    match store.save_collection(collection) {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "local save failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::fixtures::item;
    use crate::store::remote::MemoryDocumentStore;
    use serde_json::json;
    use tempfile::TempDir;

    fn adapter() -> (TempDir, Arc<MemoryDocumentStore>, SyncAdapter) {
        let dir = TempDir::new().unwrap();
        let local = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        let remote = Arc::new(MemoryDocumentStore::new());
        let shared: Arc<dyn DocumentStore> = remote.clone();
        let adapter = SyncAdapter::new(Some(local), Some(shared));
        (dir, remote, adapter)
    }

    fn local_collection() -> Collection {
        Collection {
            favorites: vec![],
            history: vec![item("ordering coffee", 2, 20)],
        }
    }

    #[test]
    fn test_sign_in_seeds_missing_remote() {
        let (_dir, remote, adapter) = adapter();
        let mut session = Session::account("u1", None);
        let local = local_collection();

        let result = adapter.sign_in(&mut session, &local);

        assert_eq!(result, local);
        assert!(!session.is_syncing());
        assert_eq!(adapter.fetch_remote("u1").unwrap(), Some(local));
        assert_eq!(remote.len(), 1);
    }

    #[test]
    fn test_sign_in_merges_and_keeps_unrelated_fields() {
        let (_dir, remote, adapter) = adapter();
        let mut seed = collection_to_document(&Collection {
            favorites: vec![],
            history: vec![item("asking directions", 1, 50)],
        })
        .unwrap();
        seed.insert("display_name".to_string(), json!("Ren"));
        remote.merge(USERS, "u1", seed).unwrap();

        let mut session = Session::account("u1", None);
        let merged = adapter.sign_in(&mut session, &local_collection());

        let ids: Vec<&str> = merged.history.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["asking directions", "ordering coffee"]);
        let stored = remote.get(USERS, "u1").unwrap().unwrap();
        assert_eq!(stored["display_name"], "Ren");
        assert_eq!(document_to_collection(stored).unwrap(), merged);
    }

    #[test]
    fn test_sign_in_with_unreachable_remote_keeps_local() {
        let (_dir, remote, adapter) = adapter();
        remote.set_available(false);
        let mut session = Session::account("u1", None);
        let local = local_collection();
        assert_eq!(adapter.sign_in(&mut session, &local), local);
        assert!(!session.is_syncing());
        assert!(!session.is_merged());
    }

    #[test]
    fn test_failed_sign_in_never_overwrites_remote_history() {
        let (_dir, remote, adapter) = adapter();
        remote
            .merge(
                USERS,
                "u1",
                collection_to_document(&Collection {
                    favorites: vec![],
                    history: vec![item("asking directions", 1, 50)],
                })
                .unwrap(),
            )
            .unwrap();

        remote.set_available(false);
        let mut session = Session::account("u1", None);
        let local = adapter.sign_in(&mut session, &local_collection());

        // store comes back, but no merge has run yet
        remote.set_available(true);
        assert_eq!(adapter.persist(&session, &local), PersistOutcome::Deferred);
        let stored = adapter.fetch_remote("u1").unwrap().unwrap();
        let ids: Vec<&str> = stored.history.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["asking directions"]);
        assert_eq!(adapter.load_account_copy("u1"), local);
        assert!(adapter.load_local().is_empty());

        let merged = adapter.resync(&mut session, &local).unwrap();
        assert!(session.is_merged());
        let ids: Vec<&str> = merged.history.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["asking directions", "ordering coffee"]);
        assert!(adapter.load_account_copy("u1").is_empty());

        assert_eq!(adapter.persist(&session, &merged), PersistOutcome::Remote);
        assert_eq!(adapter.fetch_remote("u1").unwrap(), Some(merged));
        assert!(adapter.resync(&mut session, &local).is_none());
    }

    #[test]
    fn test_resync_waits_for_remote() {
        let (_dir, remote, adapter) = adapter();
        remote.set_available(false);
        let mut session = Session::account("u1", None);
        let local = adapter.sign_in(&mut session, &local_collection());
        assert!(adapter.resync(&mut session, &local).is_none());
        assert!(!session.is_merged());
        assert!(remote.is_empty());
    }

    #[test]
    fn test_device_copy_joins_next_sign_in() {
        let (_dir, remote, adapter) = adapter();
        remote.set_available(false);
        let mut offline = Session::account("u1", None);
        let mut edited = adapter.sign_in(&mut offline, &Collection::default());
        edited.history.push(item("checking in", 1, 70));
        assert_eq!(adapter.persist(&offline, &edited), PersistOutcome::Deferred);

        remote.set_available(true);
        let mut session = Session::account("u1", None);
        let merged = adapter.sign_in(&mut session, &Collection::default());
        assert!(session.is_merged());
        assert!(merged.find("checking in").is_some());
        assert!(adapter.load_account_copy("u1").is_empty());
    }

    #[test]
    fn test_persist_skipped_while_syncing() {
        let (_dir, remote, adapter) = adapter();
        let session = Session::account("u1", None);
        assert_eq!(
            adapter.persist(&session, &local_collection()),
            PersistOutcome::Skipped
        );
        assert!(remote.is_empty());
    }

    #[test]
    fn test_persist_routes_by_identity() {
        let (_dir, remote, adapter) = adapter();
        let collection = local_collection();

        let guest = Session::guest("device");
        assert_eq!(adapter.persist(&guest, &collection), PersistOutcome::Local);
        assert!(remote.is_empty());
        assert_eq!(adapter.load_local(), collection);

        let mut account = Session::account("u1", None);
        account.finish_sync();
        account.mark_merged();
        assert_eq!(adapter.persist(&account, &collection), PersistOutcome::Remote);
        assert_eq!(adapter.fetch_remote("u1").unwrap(), Some(collection));
    }

    #[test]
    fn test_persist_falls_back_to_account_copy() {
        let (_dir, remote, adapter) = adapter();
        remote.set_available(false);
        let mut account = Session::account("u1", None);
        account.finish_sync();
        account.mark_merged();
        let collection = local_collection();
        assert_eq!(
            adapter.persist(&account, &collection),
            PersistOutcome::LocalFallback
        );
        assert_eq!(adapter.load_account_copy("u1"), collection);
        // guest files stay the guest's
        assert!(adapter.load_local().is_empty());
    }

    #[test]
    fn test_guest_sign_in_is_passthrough() {
        let (_dir, remote, adapter) = adapter();
        let mut session = Session::guest("device");
        let local = local_collection();
        assert_eq!(adapter.sign_in(&mut session, &local), local);
        assert!(remote.is_empty());
    }
}
