use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::NaiveDate;
use tempfile::TempDir;

use kaiwa::app::{App, AppScreen, Services, SharedGenerator};
use kaiwa::config::Config;
use kaiwa::generator::{GenerateError, ScenarioGenerator};
use kaiwa::library::{
    Collection, DialogueLine, DialogueSection, Expression, MAX_VERSIONS, ScenarioContent,
    ScenarioHistoryItem, Speaker, VocabItem,
};
use kaiwa::quota::{QuotaDecision, QuotaGate, QuotaPolicy};
use kaiwa::session::Identity;
use kaiwa::store::json_store::JsonStore;
use kaiwa::store::remote::{DocumentStore, MemoryDocumentStore, USERS};
use kaiwa::store::sync::collection_to_document;

fn study_sheet(name: &str, created_at: i64) -> ScenarioContent {
    ScenarioContent {
        scenario: name.to_string(),
        vocabulary: vec![VocabItem {
            word: "注文".to_string(),
            reading: "ちゅうもん".to_string(),
            romaji: "chuumon".to_string(),
            meaning: "order".to_string(),
        }],
        expressions: vec![Expression {
            phrase: "お願いします".to_string(),
            reading: "おねがいします".to_string(),
            romaji: "onegaishimasu".to_string(),
            meaning: "please".to_string(),
            note: None,
        }],
        dialogue: vec![DialogueSection {
            title: "Arriving".to_string(),
            lines: vec![DialogueLine {
                speaker: Speaker::A,
                text: "いらっしゃいませ".to_string(),
                reading: "いらっしゃいませ".to_string(),
                romaji: "irasshaimase".to_string(),
                translation: "Welcome".to_string(),
            }],
        }],
        created_at,
    }
}

/// Hands out sheets with increasing `created_at`, so versions are distinguishable.
struct CountingGenerator {
    calls: AtomicI64,
}

impl ScenarioGenerator for CountingGenerator {
    fn generate(&self, scenario: &str) -> Result<ScenarioContent, GenerateError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(study_sheet(scenario, n))
    }
}

struct Harness {
    dir: TempDir,
    remote: Arc<MemoryDocumentStore>,
    app: App,
}

impl Harness {
    fn new(config: Config) -> Self {
        let dir = TempDir::new().unwrap();
        let remote = Arc::new(MemoryDocumentStore::new());
        let shared: Arc<dyn DocumentStore> = remote.clone();
        let generator: SharedGenerator = Arc::new(CountingGenerator {
            calls: AtomicI64::new(0),
        });
        let services = Services {
            local: Some(JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap()),
            remote: Some(shared),
            generator: Some(generator),
            speech: None,
        };
        let app = App::new(config, services);
        Self { dir, remote, app }
    }

    fn device_copy(&self) -> Collection {
        JsonStore::with_base_dir(self.dir.path().to_path_buf())
            .unwrap()
            .load_collection()
    }
}

fn generous_config() -> Config {
    Config {
        daily_generation_limit: 100,
        ..Config::default()
    }
}

#[test]
fn first_generation_creates_single_active_entry() {
    let mut h = Harness::new(generous_config());
    h.app.request_scenario("ordering coffee");

    assert_eq!(h.app.screen, AppScreen::Study);
    let history = &h.app.versions.collection().history;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].versions.len(), 1);
    assert_eq!(h.app.versions.active_id(), Some("ordering coffee"));
    assert_eq!(h.app.versions.active_version(), Some(0));

    assert_eq!(h.device_copy().history.len(), 1);
}

#[test]
fn regenerating_caps_versions_and_evicts_oldest() {
    let mut h = Harness::new(generous_config());
    h.app.request_scenario("ordering coffee");
    for _ in 0..5 {
        h.app.regenerate();
    }

    let item = h.app.versions.active_item().unwrap();
    assert_eq!(item.versions.len(), MAX_VERSIONS);
    // newest first; the first sheet (created_at 1) is gone
    let stamps: Vec<i64> = item.versions.iter().map(|v| v.created_at).collect();
    assert_eq!(stamps, vec![6, 5, 4, 3, 2]);
    assert_eq!(h.app.versions.active_version(), Some(0));
}

#[test]
fn sign_in_keeps_richer_local_entry() {
    let mut h = Harness::new(generous_config());
    h.app.request_scenario("ordering coffee");
    for _ in 0..5 {
        h.app.regenerate();
    }

    let mut stale = ScenarioHistoryItem::new("ordering coffee", study_sheet("ordering coffee", 100), 1);
    stale.push_version(study_sheet("ordering coffee", 101));
    stale.push_version(study_sheet("ordering coffee", 102));
    let remote_copy = Collection {
        favorites: vec![],
        history: vec![stale],
    };
    h.remote
        .merge(USERS, "u1", collection_to_document(&remote_copy).unwrap())
        .unwrap();

    h.app.sign_in("u1", Some("u1@example.com"));

    let item = h.app.versions.collection().find("ordering coffee").unwrap();
    assert_eq!(item.versions.len(), MAX_VERSIONS);
    assert!(item.versions.iter().all(|v| v.created_at < 100));

    // the merged result was written back for the account
    let stored = h.remote.get(USERS, "u1").unwrap().unwrap();
    let stored: Collection = serde_json::from_value(stored.into()).unwrap();
    assert_eq!(stored.history[0].versions.len(), MAX_VERSIONS);
}

#[test]
fn share_link_imports_unknown_scenario_as_one_version() {
    let mut sender = Harness::new(generous_config());
    sender.app.request_scenario("asking directions");
    sender.app.share_active();
    let status = sender.app.status.clone().unwrap();
    let link = status.trim_start_matches("Share link: ").to_string();
    assert!(link.contains("share="));

    // a different device reading from the same document store
    let dir = TempDir::new().unwrap();
    let shared: Arc<dyn DocumentStore> = sender.remote.clone();
    let services = Services {
        local: Some(JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap()),
        remote: Some(shared),
        generator: None,
        speech: None,
    };
    let mut receiver = App::new(generous_config(), services);
    assert!(receiver.open_shared(&link));

    assert_eq!(receiver.screen, AppScreen::Study);
    let item = receiver.versions.collection().find("asking directions").unwrap();
    assert_eq!(item.versions.len(), 1);
    assert_eq!(
        Some(&item.versions[0]),
        sender.app.versions.active_content()
    );
}

#[test]
fn guest_hits_daily_limit() {
    let mut h = Harness::new(Config {
        daily_generation_limit: 2,
        ..Config::default()
    });
    h.app.request_scenario("ordering coffee");
    h.app.request_scenario("asking directions");
    h.app.request_scenario("checking in");

    assert_eq!(h.app.screen, AppScreen::QuotaExceeded);
    assert_eq!(h.app.quota_notice, Some((2, 2)));
    assert_eq!(h.app.versions.collection().history.len(), 2);
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
}

fn account(uid: &str) -> Identity {
    Identity::Account {
        uid: uid.to_string(),
        email: None,
    }
}

#[test]
fn quota_gate_policies() {
    let store = Arc::new(MemoryDocumentStore::new());
    let shared: Arc<dyn DocumentStore> = store.clone();
    let policy = QuotaPolicy {
        daily_limit: 1,
        fail_open: true,
        allowlist: vec!["staff".to_string()],
    };
    let gate = QuotaGate::new(policy.clone(), Some(shared.clone()));

    let student = account("student");
    assert!(gate.check(&student, day()).is_allowed());
    gate.record_success(&student, day());
    assert_eq!(
        gate.check(&student, day()),
        QuotaDecision::Exceeded { used: 1, limit: 1 }
    );
    // a new day starts a new counter
    let tomorrow = day().succ_opt().unwrap();
    assert!(gate.check(&student, tomorrow).is_allowed());

    assert_eq!(gate.check(&account("staff"), day()), QuotaDecision::Exempt);

    store.set_available(false);
    assert_eq!(gate.check(&student, tomorrow), QuotaDecision::Unverified);
    let strict = QuotaGate::new(
        QuotaPolicy {
            fail_open: false,
            ..policy
        },
        Some(shared),
    );
    assert_eq!(strict.check(&student, tomorrow), QuotaDecision::Blocked);
}
