use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use anyhow::{Result, anyhow};
use tracing::{debug, info, warn};

use crate::config::{Config, MeaningLanguage};
use crate::event::{AppEvent, RequestTicket};
use crate::export;
use crate::generator::gemini::GeminiClient;
use crate::generator::speech::{SpeechClient, SpeechError};
use crate::generator::{GenerateError, ScenarioGenerator};
use crate::library::versions::{DeleteOutcome, SelectOutcome, VersionStore};
use crate::library::{SavedItem, ScenarioContent, now_millis};
use crate::quota::{self, QuotaDecision, QuotaGate, QuotaPolicy};
use crate::session::{Identity, Session};
use crate::share;
use crate::store::json_store::{DEVICE_ID_LEN, JsonStore, random_id};
use crate::store::remote::{DocumentStore, HttpDocumentStore};
use crate::store::schema::Preferences;
use crate::store::sync::{PersistOutcome, SyncAdapter};
use crate::ui::components::menu::Menu;
use crate::ui::line_input::LineInput;
use crate::ui::theme::Theme;

pub type SharedGenerator = Arc<dyn ScenarioGenerator + Send + Sync>;

/// Scenario names offered by Tab completion before any history exists.
pub const STARTER_SCENARIOS: &[&str] = &[
    "ordering coffee",
    "asking directions",
    "checking in at a hotel",
    "ordering at an izakaya",
    "buying a train ticket",
    "seeing a doctor",
    "shopping for clothes",
    "making a restaurant reservation",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    Home,
    Input,
    Loading,
    Study,
    History,
    Saved,
    Settings,
    GenerationFailed,
    QuotaExceeded,
    OpenShared,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StudyTab {
    Vocabulary,
    Expressions,
    Dialogue,
}

impl StudyTab {
    pub const ALL: [StudyTab; 3] = [StudyTab::Vocabulary, StudyTab::Expressions, StudyTab::Dialogue];

    pub fn label(self) -> &'static str {
        match self {
            StudyTab::Vocabulary => "Vocabulary",
            StudyTab::Expressions => "Expressions",
            StudyTab::Dialogue => "Dialogue",
        }
    }

    pub fn index(self) -> usize {
        match self {
            StudyTab::Vocabulary => 0,
            StudyTab::Expressions => 1,
            StudyTab::Dialogue => 2,
        }
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Destructive action waiting for a y/n answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PendingAction {
    DeleteVersion,
    DeleteScenario(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestKind {
    New,
    Regenerate,
}

#[derive(Clone, Debug)]
pub struct PendingRequest {
    pub ticket: RequestTicket,
    pub kind: RequestKind,
}

#[derive(Clone, Debug)]
pub struct GenerationFailure {
    pub scenario_id: String,
    pub kind: RequestKind,
    pub message: String,
}

/// External collaborators the app talks to. Built from config for real runs,
/// assembled by hand in tests.
pub struct Services {
    pub local: Option<JsonStore>,
    pub remote: Option<Arc<dyn DocumentStore>>,
    pub generator: Option<SharedGenerator>,
    pub speech: Option<Arc<SpeechClient>>,
}

impl Services {
    pub fn from_config(config: &Config) -> Self {
        let local = match JsonStore::new() {
            Ok(store) => Some(store),
            Err(e) => {
                warn!(error = %e, "local storage unavailable");
                None
            }
        };

        let remote: Option<Arc<dyn DocumentStore>> = config.remote_url.as_deref().and_then(|url| {
            match HttpDocumentStore::new(
                url,
                config.remote_token.clone(),
                Duration::from_secs(config.request_timeout_secs),
            ) {
                Ok(store) => Some(Arc::new(store) as Arc<dyn DocumentStore>),
                Err(e) => {
                    warn!(url, error = %e, "remote store disabled");
                    None
                }
            }
        });

        let api_key = config.resolved_api_key();
        let generator = api_key.as_deref().and_then(|key| connect_generator(config, key));
        let speech = match SpeechClient::new(config, api_key) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                warn!(error = %e, "speech unavailable");
                None
            }
        };

        Self {
            local,
            remote,
            generator,
            speech,
        }
    }
}

fn connect_generator(config: &Config, api_key: &str) -> Option<SharedGenerator> {
    match GeminiClient::new(config, api_key) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            warn!(error = %e, "generator unavailable");
            None
        }
    }
}

pub struct App {
    pub screen: AppScreen,
    pub menu: Menu<'static>,
    pub theme: &'static Theme,
    pub config: Config,
    pub preferences: Preferences,
    pub versions: VersionStore,
    pub session: Session,
    pub study_tab: StudyTab,
    pub study_selected: usize,
    pub history_selected: usize,
    pub saved_selected: usize,
    pub settings_selected: usize,
    pub input: LineInput,
    pub pending_action: Option<PendingAction>,
    pub pending: Option<PendingRequest>,
    pub failure: Option<GenerationFailure>,
    pub quota_notice: Option<(u32, u32)>,
    pub status: Option<String>,
    pub speaking: bool,
    pub should_quit: bool,
    sync: SyncAdapter,
    quota: QuotaGate,
    generator: Option<SharedGenerator>,
    speech: Option<Arc<SpeechClient>>,
    api_key: Option<String>,
    /// A key typed in at the quota prompt; skips the daily limit from then on.
    own_api_key: bool,
    /// Request waiting on the quota prompt.
    quota_blocked: Option<(String, RequestKind)>,
    device_id: String,
    events: Option<Sender<AppEvent>>,
    next_serial: u64,
}

impl App {
    pub fn new(config: Config, services: Services) -> Self {
        let loaded_theme = Theme::load(&config.theme).unwrap_or_default();
        let theme: &'static Theme = Box::leak(Box::new(loaded_theme));

        let preferences = services
            .local
            .as_ref()
            .map(JsonStore::load_preferences)
            .unwrap_or_default();
        let device_id = match services.local.as_ref().map(JsonStore::device_id) {
            Some(Ok(id)) => id,
            Some(Err(e)) => {
                warn!(error = %e, "could not persist device id");
                random_id(DEVICE_ID_LEN)
            }
            None => random_id(DEVICE_ID_LEN),
        };

        let quota = QuotaGate::new(QuotaPolicy::from_config(&config), services.remote.clone());
        let sync = SyncAdapter::new(services.local, services.remote);
        let collection = sync.load_local();
        let api_key = config.resolved_api_key();

        Self {
            screen: AppScreen::Home,
            menu: Menu::new(theme),
            theme,
            config,
            preferences,
            versions: VersionStore::new(collection),
            session: Session::guest(&device_id),
            study_tab: StudyTab::Vocabulary,
            study_selected: 0,
            history_selected: 0,
            saved_selected: 0,
            settings_selected: 0,
            input: LineInput::new(""),
            pending_action: None,
            pending: None,
            failure: None,
            quota_notice: None,
            status: None,
            speaking: false,
            should_quit: false,
            sync,
            quota,
            generator: services.generator,
            speech: services.speech,
            api_key,
            own_api_key: false,
            quota_blocked: None,
            device_id,
            events: None,
            next_serial: 0,
        }
    }

    /// Run generation and speech on worker threads that report back here.
    /// Without a sender both run inline.
    pub fn with_events(mut self, events: Sender<AppEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn set_theme(&mut self, theme: Theme) {
        let theme: &'static Theme = Box::leak(Box::new(theme));
        self.theme = theme;
        self.menu.theme = theme;
    }

    pub fn active_content(&self) -> Option<&ScenarioContent> {
        self.versions.active_content()
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    // ---- session ----------------------------------------------------------

    /// Start an account session and reconcile the in-memory collection with
    /// the account's remote copy.
    pub fn sign_in(&mut self, uid: &str, email: Option<&str>) {
        let uid = uid.trim();
        if uid.is_empty() {
            return;
        }
        let mut session = Session::account(uid, email);
        let local = self.versions.collection().clone();
        let merged = self.sync.sign_in(&mut session, &local);
        self.session = session;
        self.versions.replace_collection(merged);
        info!(identity = %self.session.identity.display_name(), "signed in");
        let name = self.session.identity.display_name();
        if self.session.is_merged() {
            self.set_status(format!("Signed in as {name}"));
        } else {
            self.set_status(format!("Signed in as {name}; cloud copy unreachable, saving on this device"));
        }
    }

    /// Back to a guest session over the device copy.
    pub fn sign_out(&mut self) {
        if self.session.identity.is_guest() {
            return;
        }
        self.session = Session::guest(&self.device_id);
        self.versions.replace_collection(self.sync.load_local());
        self.versions.go_home();
        info!("signed out");
        self.set_status("Signed out; using this device's data");
    }

    /// Save the collection. An account whose sign-in merge never reached the
    /// remote copy retries that merge first, so a remote write never replaces
    /// history this device has not seen.
    pub fn persist(&mut self) {
        if !self.session.is_merged()
            && let Some(merged) = self.sync.resync(&mut self.session, self.versions.collection())
        {
            info!("account collection reconciled after retry");
            self.versions.replace_collection(merged);
        }
        match self.sync.persist(&self.session, self.versions.collection()) {
            PersistOutcome::Failed => self.set_status("Could not save your changes"),
            PersistOutcome::LocalFallback => {
                self.set_status("Cloud save failed; kept a copy on this device")
            }
            PersistOutcome::Deferred => {
                self.set_status("Saved on this device; will sync when the cloud is reachable")
            }
            outcome => debug!(?outcome, "collection persisted"),
        }
    }

    fn save_preferences(&mut self) {
        if let Some(local) = self.sync.local()
            && let Err(e) = local.save_preferences(&self.preferences)
        {
            warn!(error = %e, "could not save preferences");
        }
    }

    // ---- navigation -------------------------------------------------------

    pub fn go_home(&mut self) {
        self.screen = AppScreen::Home;
        self.pending_action = None;
        self.versions.go_home();
    }

    pub fn open_input(&mut self) {
        let mut suggestions: Vec<String> = self
            .versions
            .collection()
            .history
            .iter()
            .map(|h| h.name.clone())
            .collect();
        for starter in STARTER_SCENARIOS {
            if !suggestions.iter().any(|s| s == starter) {
                suggestions.push(starter.to_string());
            }
        }
        self.input = LineInput::new("").with_suggestions(suggestions);
        self.screen = AppScreen::Input;
    }

    pub fn open_share_prompt(&mut self) {
        self.input = LineInput::new("");
        self.screen = AppScreen::OpenShared;
    }

    pub fn go_to_history(&mut self) {
        self.history_selected = 0;
        self.pending_action = None;
        self.screen = AppScreen::History;
    }

    pub fn go_to_saved(&mut self) {
        self.saved_selected = 0;
        self.screen = AppScreen::Saved;
    }

    pub fn go_to_settings(&mut self) {
        self.settings_selected = 0;
        self.screen = AppScreen::Settings;
    }

    fn open_study(&mut self) {
        self.study_tab = StudyTab::Vocabulary;
        self.study_selected = 0;
        self.screen = AppScreen::Study;
    }

    // ---- generation -------------------------------------------------------

    /// Open a scenario by name, generating it when there is no stored copy.
    pub fn request_scenario(&mut self, name: &str) {
        if self.pending.is_some() {
            return;
        }
        let name = name.trim();
        if name.is_empty() {
            self.set_status("Type a scenario first");
            return;
        }
        match self.versions.begin_select(name, now_millis()) {
            SelectOutcome::Activated => {
                self.persist();
                self.open_study();
            }
            SelectOutcome::NeedsGeneration(id) => self.start_generation(id, RequestKind::New),
        }
    }

    pub fn regenerate(&mut self) {
        if self.pending.is_some() {
            return;
        }
        match self.versions.begin_regenerate() {
            Ok(id) => self.start_generation(id, RequestKind::Regenerate),
            Err(e) => self.set_status(e.to_string()),
        }
    }

    pub fn retry_failed(&mut self) {
        if let Some(failure) = self.failure.take() {
            self.start_generation(failure.scenario_id, failure.kind);
        }
    }

    fn start_generation(&mut self, scenario_id: String, kind: RequestKind) {
        if !self.own_api_key {
            match self.quota.check(&self.session.identity, quota::today()) {
                QuotaDecision::Exceeded { used, limit } => {
                    info!(used, limit, "daily generation limit reached");
                    self.quota_notice = Some((used, limit));
                    self.quota_blocked = Some((scenario_id, kind));
                    self.input = LineInput::new("").masked();
                    self.screen = AppScreen::QuotaExceeded;
                    return;
                }
                decision if !decision.is_allowed() => {
                    self.fail(scenario_id, kind, "Usage limit could not be verified; try again later");
                    return;
                }
                _ => {}
            }
        }

        let Some(generator) = self.generator.clone() else {
            self.fail(
                scenario_id,
                kind,
                &GenerateError::MissingApiKey.to_string(),
            );
            return;
        };

        self.next_serial += 1;
        let ticket = RequestTicket {
            serial: self.next_serial,
            scenario_id,
        };
        self.pending = Some(PendingRequest {
            ticket: ticket.clone(),
            kind,
        });
        self.failure = None;
        self.screen = AppScreen::Loading;

        match self.events.clone() {
            Some(tx) => {
                thread::spawn(move || {
                    let result = generator.generate(&ticket.scenario_id);
                    let _ = tx.send(AppEvent::Generated { ticket, result });
                });
            }
            None => {
                let result = generator.generate(&ticket.scenario_id);
                self.on_generated(ticket, result);
            }
        }
    }

    fn fail(&mut self, scenario_id: String, kind: RequestKind, message: &str) {
        self.failure = Some(GenerationFailure {
            scenario_id,
            kind,
            message: message.to_string(),
        });
        self.screen = AppScreen::GenerationFailed;
    }

    /// Worker result. Ignored unless it answers the request still pending.
    pub fn on_generated(
        &mut self,
        ticket: RequestTicket,
        result: Result<ScenarioContent, GenerateError>,
    ) {
        let Some(pending) = self.pending.take_if(|p| p.ticket == ticket) else {
            debug!(serial = ticket.serial, "discarding stale generation result");
            return;
        };

        match result {
            Ok(content) => {
                if !self.own_api_key {
                    self.quota.record_success(&self.session.identity, quota::today());
                }
                self.versions
                    .complete_generation(&ticket.scenario_id, content, now_millis());
                self.persist();
                self.open_study();
            }
            Err(e) => {
                warn!(scenario = %ticket.scenario_id, error = %e, "generation failed");
                self.fail(ticket.scenario_id, pending.kind, &e.to_string());
            }
        }
    }

    /// Leave the loading screen; whatever the worker returns is dropped.
    pub fn cancel_loading(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        if pending.kind == RequestKind::Regenerate && self.versions.active_content().is_some() {
            self.screen = AppScreen::Study;
        } else {
            self.go_home();
        }
    }

    /// Key typed at the quota prompt.
    pub fn submit_api_key(&mut self, key: &str) {
        let key = key.trim().to_string();
        if key.is_empty() {
            return;
        }
        let Some(generator) = connect_generator(&self.config, &key) else {
            self.set_status("That key could not be used");
            return;
        };
        match SpeechClient::new(&self.config, Some(key.clone())) {
            Ok(speech) => self.speech = Some(Arc::new(speech)),
            Err(e) => warn!(error = %e, "speech client not rebuilt"),
        }
        self.api_key = Some(key);
        self.use_own_generator(generator);
    }

    /// Switch to a user-supplied generator and resume the blocked request.
    pub fn use_own_generator(&mut self, generator: SharedGenerator) {
        self.generator = Some(generator);
        self.own_api_key = true;
        self.quota_notice = None;
        match self.quota_blocked.take() {
            Some((id, kind)) => self.start_generation(id, kind),
            None => self.go_home(),
        }
    }

    pub fn dismiss_quota(&mut self) {
        self.quota_blocked = None;
        self.quota_notice = None;
        self.go_home();
    }

    /// Blocking generate-and-render used by `--print`.
    pub fn print_scenario(&mut self, name: &str) -> Result<String> {
        let id = name.trim().to_string();
        let needs_generation = self
            .versions
            .collection()
            .find(&id)
            .is_none_or(|item| item.versions.is_empty());
        let generator = self
            .generator
            .clone()
            .ok_or_else(|| anyhow!(GenerateError::MissingApiKey))?;

        if needs_generation {
            match self.quota.check(&self.session.identity, quota::today()) {
                QuotaDecision::Exceeded { used, limit } => {
                    return Err(anyhow!("daily generation limit reached ({used}/{limit})"));
                }
                decision if !decision.is_allowed() => {
                    return Err(anyhow!("usage limit could not be verified"));
                }
                _ => {}
            }
        }

        self.versions
            .select_scenario(&id, generator.as_ref(), now_millis())?;
        if needs_generation {
            self.quota.record_success(&self.session.identity, quota::today());
        }
        self.persist();

        let content = self
            .versions
            .active_content()
            .ok_or_else(|| anyhow!("no scenario is active"))?;
        Ok(export::render_markdown(content, self.preferences.notation))
    }

    // ---- study view -------------------------------------------------------

    pub fn study_row_count(&self) -> usize {
        let Some(content) = self.versions.active_content() else {
            return 0;
        };
        match self.study_tab {
            StudyTab::Vocabulary => content.vocabulary.len(),
            StudyTab::Expressions => content.expressions.len(),
            StudyTab::Dialogue => content.dialogue.iter().map(|s| s.lines.len()).sum(),
        }
    }

    pub fn set_study_tab(&mut self, tab: StudyTab) {
        self.study_tab = tab;
        self.study_selected = 0;
    }

    pub fn study_move(&mut self, down: bool) {
        let count = self.study_row_count();
        if count == 0 {
            return;
        }
        self.study_selected = if down {
            (self.study_selected + 1).min(count - 1)
        } else {
            self.study_selected.saturating_sub(1)
        };
    }

    pub fn select_version(&mut self, index: usize) {
        self.versions.select_version(index);
        self.study_selected = self.study_selected.min(self.study_row_count().saturating_sub(1));
    }

    pub fn cycle_version(&mut self, forward: bool) {
        let (Some(current), Some(len)) = (
            self.versions.active_version(),
            self.versions.active_item().map(|i| i.versions.len()),
        ) else {
            return;
        };
        let next = if forward {
            (current + 1) % len
        } else {
            (current + len - 1) % len
        };
        self.select_version(next);
    }

    fn selected_saved_item(&self) -> Option<SavedItem> {
        let content = self.versions.active_content()?;
        let now = now_millis();
        match self.study_tab {
            StudyTab::Vocabulary => content
                .vocabulary
                .get(self.study_selected)
                .map(|v| SavedItem::vocab(v, now)),
            StudyTab::Expressions => content
                .expressions
                .get(self.study_selected)
                .map(|e| SavedItem::expression(e, now)),
            StudyTab::Dialogue => None,
        }
    }

    pub fn toggle_selected_saved(&mut self) {
        let Some(item) = self.selected_saved_item() else {
            return;
        };
        let label = item.id.clone();
        let saved = self.versions.toggle_saved_item(item);
        self.persist();
        self.set_status(if saved {
            format!("Saved {label}")
        } else {
            format!("Removed {label}")
        });
    }

    fn selected_study_text(&self) -> Option<String> {
        let content = self.versions.active_content()?;
        match self.study_tab {
            StudyTab::Vocabulary => content
                .vocabulary
                .get(self.study_selected)
                .map(|v| v.word.clone()),
            StudyTab::Expressions => content
                .expressions
                .get(self.study_selected)
                .map(|e| e.phrase.clone()),
            StudyTab::Dialogue => content
                .dialogue
                .iter()
                .flat_map(|s| s.lines.iter())
                .nth(self.study_selected)
                .map(|l| l.text.clone()),
        }
    }

    pub fn speak_selected(&mut self) {
        if let Some(text) = self.selected_study_text() {
            self.speak(text);
        }
    }

    pub fn request_delete_version(&mut self) {
        if self.versions.active_content().is_some() {
            self.pending_action = Some(PendingAction::DeleteVersion);
        }
    }

    pub fn share_active(&mut self) {
        let Some(content) = self.versions.active_content().cloned() else {
            return;
        };
        let remote = self.sync.remote();
        match share::publish(
            remote.as_deref(),
            &self.config.share_base_url,
            &content,
            now_millis(),
        ) {
            Ok(link) => self.set_status(format!("Share link: {link}")),
            Err(e) => {
                warn!(error = %e, "share failed");
                self.set_status(format!("Could not share: {e}"));
            }
        }
    }

    /// Fetch a shared scenario and make it the active one.
    pub fn open_shared(&mut self, link_or_id: &str) -> bool {
        let remote = self.sync.remote();
        let fetched = share::parse_share_ref(link_or_id)
            .and_then(|id| share::fetch_shared(remote.as_deref(), &id));
        match fetched {
            Ok(content) => {
                info!(scenario = %content.scenario, "imported shared scenario");
                self.versions.import_shared(content, now_millis());
                self.persist();
                self.open_study();
                true
            }
            Err(e) => {
                warn!(error = %e, "could not open shared scenario");
                self.set_status(format!("Could not open link: {e}"));
                false
            }
        }
    }

    pub fn export_dir() -> PathBuf {
        dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kaiwa")
    }

    pub fn export_active(&mut self) {
        let Some(content) = self.versions.active_content() else {
            return;
        };
        match export::write_sheet(content, self.preferences.notation, &Self::export_dir()) {
            Ok(path) => self.set_status(format!("Study sheet written to {}", path.display())),
            Err(e) => self.set_status(format!("Export failed: {e}")),
        }
    }

    pub fn toggle_notation(&mut self) {
        self.preferences.notation = self.preferences.notation.toggled();
        self.save_preferences();
    }

    // ---- speech -----------------------------------------------------------

    pub fn speak(&mut self, text: String) {
        if self.speaking {
            return;
        }
        let Some(speech) = self.speech.clone() else {
            self.set_status("Speech is unavailable");
            return;
        };
        let engine = self.preferences.voice_engine;
        self.speaking = true;
        match self.events.clone() {
            Some(tx) => {
                thread::spawn(move || {
                    let _ = tx.send(AppEvent::Spoken(speech.speak(&text, engine)));
                });
            }
            None => {
                let result = speech.speak(&text, engine);
                self.on_spoken(result);
            }
        }
    }

    pub fn on_spoken(&mut self, result: Result<(), SpeechError>) {
        self.speaking = false;
        if let Err(e) = result {
            warn!(error = %e, "speech failed");
            self.set_status(format!("Speech unavailable: {e}"));
        }
    }

    // ---- history & saved --------------------------------------------------

    pub fn open_selected_history(&mut self) {
        let Some(name) = self
            .versions
            .collection()
            .history
            .get(self.history_selected)
            .map(|h| h.id.clone())
        else {
            return;
        };
        self.request_scenario(&name);
    }

    pub fn request_delete_selected_history(&mut self) {
        if let Some(item) = self.versions.collection().history.get(self.history_selected) {
            self.pending_action = Some(PendingAction::DeleteScenario(item.id.clone()));
        }
    }

    pub fn history_move(&mut self, down: bool) {
        let len = self.versions.collection().history.len();
        self.history_selected = step(self.history_selected, len, down);
    }

    pub fn saved_move(&mut self, down: bool) {
        let len = self.versions.collection().favorites.len();
        self.saved_selected = step(self.saved_selected, len, down);
    }

    pub fn remove_selected_saved(&mut self) {
        let Some(item) = self
            .versions
            .collection()
            .favorites
            .get(self.saved_selected)
            .cloned()
        else {
            return;
        };
        self.versions.toggle_saved_item(item);
        self.persist();
        let len = self.versions.collection().favorites.len();
        self.saved_selected = self.saved_selected.min(len.saturating_sub(1));
    }

    pub fn speak_selected_saved(&mut self) {
        if let Some(item) = self.versions.collection().favorites.get(self.saved_selected) {
            let text = item.id.clone();
            self.speak(text);
        }
    }

    // ---- confirmation -----------------------------------------------------

    pub fn confirm_pending(&mut self) {
        let Some(action) = self.pending_action.take() else {
            return;
        };
        match action {
            PendingAction::DeleteVersion => match self.versions.delete_version() {
                Some(DeleteOutcome::ScenarioRemoved) => {
                    self.persist();
                    self.go_home();
                }
                Some(DeleteOutcome::VersionRemoved) => {
                    self.persist();
                    self.study_selected = 0;
                }
                None => {}
            },
            PendingAction::DeleteScenario(id) => {
                if self.versions.delete_scenario(&id) {
                    self.persist();
                }
                let len = self.versions.collection().history.len();
                self.history_selected = self.history_selected.min(len.saturating_sub(1));
            }
        }
    }

    pub fn cancel_pending(&mut self) {
        self.pending_action = None;
    }

    // ---- settings ---------------------------------------------------------

    pub const SETTINGS_ROWS: usize = 5;

    pub fn settings_cycle(&mut self, forward: bool) {
        match self.settings_selected {
            0 => self.toggle_notation(),
            1 => {
                self.preferences.voice_engine = self.preferences.voice_engine.toggled();
                self.save_preferences();
            }
            2 => {
                self.config.meaning_language = match self.config.meaning_language {
                    MeaningLanguage::English => MeaningLanguage::Chinese,
                    MeaningLanguage::Chinese => MeaningLanguage::English,
                };
                if let Some(key) = self.api_key.clone()
                    && let Some(generator) = connect_generator(&self.config, &key)
                {
                    self.generator = Some(generator);
                }
            }
            3 => {
                let themes = Theme::available_themes();
                if themes.is_empty() {
                    return;
                }
                let next = match themes.iter().position(|t| *t == self.config.theme) {
                    Some(idx) if forward => (idx + 1) % themes.len(),
                    Some(idx) => (idx + themes.len() - 1) % themes.len(),
                    None => 0,
                };
                self.config.theme = themes[next].clone();
                if let Some(theme) = Theme::load(&self.config.theme) {
                    self.set_theme(theme);
                }
            }
            4 => self.toggle_account(),
            _ => {}
        }
    }

    fn toggle_account(&mut self) {
        if !self.session.identity.is_guest() {
            self.sign_out();
            return;
        }
        match self.config.account_id.clone() {
            Some(uid) => {
                let email = self.config.account_email.clone();
                self.sign_in(&uid, email.as_deref());
            }
            None => self.set_status("Set account_id in config.toml or pass --user to sign in"),
        }
    }

    pub fn leave_settings(&mut self) {
        if let Err(e) = self.config.save() {
            warn!(error = %e, "could not save config");
        }
        self.save_preferences();
        self.screen = AppScreen::Home;
    }

    pub fn identity(&self) -> &Identity {
        &self.session.identity
    }
}

fn step(current: usize, len: usize, down: bool) -> usize {
    if len == 0 {
        0
    } else if down {
        (current + 1).min(len - 1)
    } else {
        current.saturating_sub(1)
    }
}
