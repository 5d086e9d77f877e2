use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::{Map, json};
use tracing::{debug, warn};

use crate::config::Config;
use crate::session::Identity;
use crate::store::remote::{DocumentStore, RemoteError, USAGE};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuotaDecision {
    Allowed { used: u32, limit: u32 },
    /// Allow-listed identity; not counted.
    Exempt,
    Exceeded { used: u32, limit: u32 },
    /// Counter unreachable, let through because the gate fails open.
    Unverified,
    /// Counter unreachable and the gate fails closed.
    Blocked,
}

impl QuotaDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(
            self,
            QuotaDecision::Allowed { .. } | QuotaDecision::Exempt | QuotaDecision::Unverified
        )
    }
}

#[derive(Clone, Debug)]
pub struct QuotaPolicy {
    pub daily_limit: u32,
    pub fail_open: bool,
    pub allowlist: Vec<String>,
}

impl QuotaPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            daily_limit: config.daily_generation_limit,
            fail_open: config.quota_fail_open,
            allowlist: config.quota_allowlist.clone(),
        }
    }
}

/// Per-identity, per-calendar-day cap on generation calls.
#[derive(Clone)]
pub struct QuotaGate {
    policy: QuotaPolicy,
    store: Option<Arc<dyn DocumentStore>>,
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub fn usage_doc_id(identity: &Identity, day: NaiveDate) -> String {
    format!("{}_{}", identity.key(), day.format("%Y-%m-%d"))
}

impl QuotaGate {
    pub fn new(policy: QuotaPolicy, store: Option<Arc<dyn DocumentStore>>) -> Self {
        Self { policy, store }
    }

    fn used(&self, identity: &Identity, day: NaiveDate) -> Result<u32, RemoteError> {
        let store = self.store.as_ref().ok_or(RemoteError::Unavailable)?;
        let doc = store.get(USAGE, &usage_doc_id(identity, day))?;
        Ok(doc
            .and_then(|d| d.get("count").and_then(|c| c.as_u64()))
            .map(|c| c.min(u64::from(u32::MAX)) as u32)
            .unwrap_or(0))
    }

    pub fn check(&self, identity: &Identity, day: NaiveDate) -> QuotaDecision {
        if identity.matches_any(&self.policy.allowlist) {
            return QuotaDecision::Exempt;
        }
        let limit = self.policy.daily_limit;
        match self.used(identity, day) {
            Ok(used) if used >= limit => QuotaDecision::Exceeded { used, limit },
            Ok(used) => QuotaDecision::Allowed { used, limit },
            Err(e) if self.policy.fail_open => {
                warn!(error = %e, "usage counter unreachable, allowing generation");
                QuotaDecision::Unverified
            }
            Err(e) => {
                warn!(error = %e, "usage counter unreachable, blocking generation");
                QuotaDecision::Blocked
            }
        }
    }

    /// Count one successful generation for today. Failures are logged only.
    pub fn record_success(&self, identity: &Identity, day: NaiveDate) {
        if identity.matches_any(&self.policy.allowlist) {
            return;
        }
        let result = self.used(identity, day).and_then(|used| {
            let store = self.store.as_ref().ok_or(RemoteError::Unavailable)?;
            let mut fields = Map::new();
            fields.insert("count".to_string(), json!(used + 1));
            fields.insert("date".to_string(), json!(day.format("%Y-%m-%d").to_string()));
            fields.insert("identity".to_string(), json!(identity.key()));
            store.merge(USAGE, &usage_doc_id(identity, day), fields)?;
            Ok(used + 1)
        });
        match result {
            Ok(count) => debug!(identity = %identity.key(), count, "usage recorded"),
            Err(e) => warn!(error = %e, "could not record usage"),
        }
    }
}
