/// Who the collection currently belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Identity {
    /// Persists only to this device.
    Guest { device_id: String },
    /// Signed-in account whose collection lives in the remote store.
    Account { uid: String, email: Option<String> },
}

impl Identity {
    pub fn is_guest(&self) -> bool {
        matches!(self, Identity::Guest { .. })
    }

    /// Key used for per-identity documents such as usage counters.
    pub fn key(&self) -> String {
        match self {
            Identity::Guest { device_id } => format!("guest_{device_id}"),
            Identity::Account { uid, .. } => uid.clone(),
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            Identity::Guest { .. } => "guest".to_string(),
            Identity::Account { uid, email } => email.clone().unwrap_or_else(|| uid.clone()),
        }
    }

    /// Whether any of `names` matches this identity's uid or email.
    pub fn matches_any(&self, names: &[String]) -> bool {
        match self {
            Identity::Guest { .. } => false,
            Identity::Account { uid, email } => names.iter().any(|n| {
                n.eq_ignore_ascii_case(uid)
                    || email.as_deref().is_some_and(|e| n.eq_ignore_ascii_case(e))
            }),
        }
    }
}

/// Explicit session context, created at sign-in and replaced at sign-out.
///
/// `syncing` is raised for the duration of the sign-in merge; persistence is
/// suppressed while it is set so a half-merged collection never gets written.
/// `merged` records whether that merge actually saw the remote copy. An
/// account session must not write remotely until it is set.
#[derive(Clone, Debug)]
pub struct Session {
    pub identity: Identity,
    syncing: bool,
    merged: bool,
}

impl Session {
    pub fn guest(device_id: &str) -> Self {
        Self {
            identity: Identity::Guest {
                device_id: device_id.to_string(),
            },
            syncing: false,
            merged: true,
        }
    }

    /// A fresh account session, born in the syncing state until its merge
    /// completes.
    pub fn account(uid: &str, email: Option<&str>) -> Self {
        Self {
            identity: Identity::Account {
                uid: uid.to_string(),
                email: email.map(str::to_string),
            },
            syncing: true,
            merged: false,
        }
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing
    }

    pub fn finish_sync(&mut self) {
        self.syncing = false;
    }

    /// Guests have nothing to reconcile and count as merged.
    pub fn is_merged(&self) -> bool {
        self.merged
    }

    pub fn mark_merged(&mut self) {
        self.merged = true;
    }
}
