use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::library::ScenarioContent;
use crate::store::remote::{DocumentStore, RemoteError, SHARED};

pub const SHARE_PARAM: &str = "share";

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("sharing needs a remote store")]
    NoStore,
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("invalid share link: {0}")]
    BadLink(String),
    #[error("shared scenario {0} not found")]
    NotFound(String),
    #[error("shared scenario is unreadable: {0}")]
    Decode(String),
}

/// Store one version under a generated id and return its link.
pub fn publish(
    store: Option<&dyn DocumentStore>,
    base_url: &str,
    content: &ScenarioContent,
    now: i64,
) -> Result<String, ShareError> {
    let store = store.ok_or(ShareError::NoStore)?;
    let content_value =
        serde_json::to_value(content).map_err(|e| ShareError::Decode(e.to_string()))?;
    let mut fields = Map::new();
    fields.insert("content".to_string(), content_value);
    fields.insert("shared_at".to_string(), json!(now));

    let id = store.create(SHARED, fields)?;
    info!(scenario = %content.scenario, id = %id, "published shared scenario");
    share_link(base_url, &id)
}

pub fn share_link(base_url: &str, id: &str) -> Result<String, ShareError> {
    let mut url = Url::parse(base_url).map_err(|e| ShareError::BadLink(e.to_string()))?;
    url.query_pairs_mut().clear().append_pair(SHARE_PARAM, id);
    Ok(url.into())
}

/// Accepts a full link carrying `?share=` or a bare document id.
pub fn parse_share_ref(link_or_id: &str) -> Result<String, ShareError> {
    let raw = link_or_id.trim();
    if raw.is_empty() {
        return Err(ShareError::BadLink("empty".to_string()));
    }
    match Url::parse(raw) {
        Ok(url) => url
            .query_pairs()
            .find(|(k, _)| k == SHARE_PARAM)
            .map(|(_, v)| v.into_owned())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ShareError::BadLink(raw.to_string())),
        Err(_) if raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') => {
            Ok(raw.to_string())
        }
        Err(_) => Err(ShareError::BadLink(raw.to_string())),
    }
}

pub fn fetch_shared(store: Option<&dyn DocumentStore>, id: &str) -> Result<ScenarioContent, ShareError> {
    let store = store.ok_or(ShareError::NoStore)?;
    let mut doc = store
        .get(SHARED, id)?
        .ok_or_else(|| ShareError::NotFound(id.to_string()))?;
    let content = doc.remove("content").unwrap_or(Value::Null);
    let content: ScenarioContent =
        serde_json::from_value(content).map_err(|e| ShareError::Decode(e.to_string()))?;
    if content.scenario.trim().is_empty() {
        return Err(ShareError::Decode("shared scenario has no name".to_string()));
    }
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::fixtures::content;
    use crate::store::remote::MemoryDocumentStore;

    #[test]
    fn test_publish_then_fetch() {
        let store = MemoryDocumentStore::new();
        let shared = content("asking directions", 3);
        let link = publish(Some(&store), "https://kaiwa.app/", &shared, 10).unwrap();
        assert!(link.starts_with("https://kaiwa.app/?share="));

        let id = parse_share_ref(&link).unwrap();
        assert_eq!(fetch_shared(Some(&store), &id).unwrap(), shared);
        assert_eq!(store.get(SHARED, &id).unwrap().unwrap()["shared_at"], 10);
    }

    #[test]
    fn test_fetch_rejects_blank_scenario_name() {
        let store = MemoryDocumentStore::new();
        let unnamed = content("   ", 3);
        let link = publish(Some(&store), "https://kaiwa.app/", &unnamed, 10).unwrap();
        let id = parse_share_ref(&link).unwrap();
        assert!(matches!(
            fetch_shared(Some(&store), &id),
            Err(ShareError::Decode(_))
        ));
    }

    #[test]
    fn test_parse_bare_id() {
        assert_eq!(parse_share_ref(" abc123XYZ ").unwrap(), "abc123XYZ");
    }

    #[test]
    fn test_parse_link_without_share_param() {
        assert!(matches!(
            parse_share_ref("https://kaiwa.app/?other=1"),
            Err(ShareError::BadLink(_))
        ));
        assert!(parse_share_ref("not a link").is_err());
        assert!(parse_share_ref("").is_err());
    }

    #[test]
    fn test_share_link_replaces_existing_query() {
        let link = share_link("https://kaiwa.app/study?share=old", "new1").unwrap();
        assert_eq!(link, "https://kaiwa.app/study?share=new1");
    }

    #[test]
    fn test_fetch_missing_document() {
        let store = MemoryDocumentStore::new();
        assert!(matches!(
            fetch_shared(Some(&store), "nope"),
            Err(ShareError::NotFound(_))
        ));
        assert!(matches!(fetch_shared(None, "nope"), Err(ShareError::NoStore)));
    }
}
