use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::http::{HttpClient, HttpError, Method};
use crate::store::json_store::random_id;

pub type Document = Map<String, Value>;

pub const USERS: &str = "users";
pub const USAGE: &str = "usage";
pub const SHARED: &str = "shared";

const GENERATED_ID_LEN: usize = 20;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("remote store is unavailable")]
    Unavailable,
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("invalid remote address: {0}")]
    Address(String),
    #[error("unexpected document shape: {0}")]
    Decode(String),
}

/// Minimal per-document key-value store. No transactions: every write is a
/// plain read-modify-write at the caller.
pub trait DocumentStore: Send + Sync {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, RemoteError>;

    /// Overwrite the given fields, leaving any other fields of the document
    /// alone. Creates the document if it does not exist.
    fn merge(&self, collection: &str, id: &str, fields: Document) -> Result<(), RemoteError>;

    /// Create a document under a generated id and return that id.
    fn create(&self, collection: &str, fields: Document) -> Result<String, RemoteError>;
}

/// JSON-over-HTTP document API:
/// `GET {base}/{collection}/{id}`, `PATCH` the same path for a field merge,
/// `POST {base}/{collection}` answering `{"id": ...}`.
pub struct HttpDocumentStore {
    base: Url,
    token: Option<String>,
    http: HttpClient,
}

impl HttpDocumentStore {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, RemoteError> {
        let base = Url::parse(base_url).map_err(|e| RemoteError::Address(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(RemoteError::Address(base_url.to_string()));
        }
        Ok(Self {
            base,
            token,
            http: HttpClient::new(timeout)?,
        })
    }

    pub fn document_url(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| RemoteError::Address(self.base.to_string()))?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    fn headers(&self) -> Vec<(&'static str, String)> {
        self.token
            .iter()
            .map(|t| ("authorization", format!("Bearer {t}")))
            .collect()
    }
}

fn into_document(value: Value) -> Result<Document, RemoteError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(RemoteError::Decode(format!("expected object, got {other}"))),
    }
}

impl DocumentStore for HttpDocumentStore {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, RemoteError> {
        let url = self.document_url(&[collection, id])?;
        debug!(%url, "remote get");
        self.http
            .send(Method::Get, url.as_str(), &self.headers(), None)?
            .map(into_document)
            .transpose()
    }

    fn merge(&self, collection: &str, id: &str, fields: Document) -> Result<(), RemoteError> {
        let url = self.document_url(&[collection, id])?;
        debug!(%url, fields = fields.len(), "remote merge");
        let body = Value::Object(fields);
        self.http
            .send(Method::Patch, url.as_str(), &self.headers(), Some(&body))?;
        Ok(())
    }

    fn create(&self, collection: &str, fields: Document) -> Result<String, RemoteError> {
        let url = self.document_url(&[collection])?;
        let body = Value::Object(fields);
        let reply = self
            .http
            .send(Method::Post, url.as_str(), &self.headers(), Some(&body))?
            .ok_or_else(|| RemoteError::Decode("empty create reply".to_string()))?;
        reply["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| RemoteError::Decode("create reply carried no id".to_string()))
    }
}

/// In-process store, used for offline runs and tests. `set_available(false)`
/// makes every call fail like an unreachable server.
#[derive(Default)]
pub struct MemoryDocumentStore {
    docs: Mutex<HashMap<(String, String), Document>>,
    unavailable: AtomicBool,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), RemoteError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(RemoteError::Unavailable)
        } else {
            Ok(())
        }
    }

    pub fn len(&self) -> usize {
        self.docs.lock().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, RemoteError> {
        self.check()?;
        let docs = self.docs.lock().map_err(|_| RemoteError::Unavailable)?;
        Ok(docs.get(&(collection.to_string(), id.to_string())).cloned())
    }

    fn merge(&self, collection: &str, id: &str, fields: Document) -> Result<(), RemoteError> {
        self.check()?;
        let mut docs = self.docs.lock().map_err(|_| RemoteError::Unavailable)?;
        let doc = docs
            .entry((collection.to_string(), id.to_string()))
            .or_default();
        for (key, value) in fields {
            doc.insert(key, value);
        }
        Ok(())
    }

    fn create(&self, collection: &str, fields: Document) -> Result<String, RemoteError> {
        self.check()?;
        let id = random_id(GENERATED_ID_LEN);
        let mut docs = self.docs.lock().map_err(|_| RemoteError::Unavailable)?;
        docs.insert((collection.to_string(), id.clone()), fields);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        into_document(value).unwrap()
    }

    #[test]
    fn test_memory_merge_preserves_other_fields() {
        let store = MemoryDocumentStore::new();
        store
            .merge(USERS, "u1", doc(json!({ "history": [], "plan": "pro" })))
            .unwrap();
        store
            .merge(USERS, "u1", doc(json!({ "history": [1] })))
            .unwrap();

        let stored = store.get(USERS, "u1").unwrap().unwrap();
        assert_eq!(stored["plan"], "pro");
        assert_eq!(stored["history"], json!([1]));
    }

    #[test]
    fn test_memory_create_generates_ids() {
        let store = MemoryDocumentStore::new();
        let a = store.create(SHARED, doc(json!({ "n": 1 }))).unwrap();
        let b = store.create(SHARED, doc(json!({ "n": 2 }))).unwrap();
        assert_ne!(a, b);
        assert_eq!(store.get(SHARED, &a).unwrap().unwrap()["n"], 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_memory_unavailable() {
        let store = MemoryDocumentStore::new();
        store.set_available(false);
        assert!(matches!(
            store.get(USERS, "u1"),
            Err(RemoteError::Unavailable)
        ));
        store.set_available(true);
        assert!(store.get(USERS, "u1").unwrap().is_none());
    }

    #[test]
    fn test_document_url_escapes_segments() {
        let store =
            HttpDocumentStore::new("https://docs.example.com/v1/", None, Duration::from_secs(5))
                .unwrap();
        let url = store.document_url(&[USAGE, "user one_2026-10-18"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://docs.example.com/v1/usage/user%20one_2026-10-18"
        );
    }

    #[test]
    fn test_rejects_non_base_url() {
        assert!(matches!(
            HttpDocumentStore::new("mailto:someone@example.com", None, Duration::from_secs(5)),
            Err(RemoteError::Address(_))
        ));
    }

    #[test]
    fn test_into_document_requires_object() {
        assert!(into_document(json!([1, 2])).is_err());
    }
}
