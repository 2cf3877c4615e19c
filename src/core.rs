use crate::email::EmailService;
use crate::errors::AppResult;
use crate::leads::LeadService;
use crate::models::{
    default_automations, sample_client, AnalyticsEvent, Automation, AutomationStatus,
    BusinessBlueprint, Client, ClientPatch, ClientStatus, EventType, GrowthPlan, Lead, LeadStatus,
    NewClientPayload, NewLead, ProjectData, SocialPost,
};
use crate::persistence::PersistenceService;
use crate::session::SessionManager;
use crate::store::local::LocalStore;
use crate::store::{LeadStore, ProjectStore};
use crate::sync::{poll_diff, SyncWorker};
use chrono::Utc;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

const DB_FILE: &str = "business_os.sqlite3";
const NOTIFICATION_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Success,
    Error,
}

/// Transient user-facing message, the backend half of a toast.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
}

/// In-memory working copy of the signed-in tenant's project.
#[derive(Debug, Clone, Default)]
pub struct ProjectState {
    pub blueprint: Option<BusinessBlueprint>,
    pub clients: Vec<Client>,
    pub leads: Vec<Lead>,
    pub automations: Vec<Automation>,
    pub events: Vec<AnalyticsEvent>,
    pub growth_plan: Option<GrowthPlan>,
    pub onboarded: bool,
}

impl ProjectState {
    fn adopt(&mut self, data: ProjectData) {
        self.blueprint = Some(data.blueprint);
        self.clients = data.clients;
        self.leads = data.leads;
        self.automations = data.automations;
        self.events = data.events;
        self.growth_plan = data.growth_plan;
        self.onboarded = true;
    }

    fn to_project(&self) -> Option<ProjectData> {
        let blueprint = self.blueprint.clone()?;
        Some(ProjectData {
            blueprint,
            clients: self.clients.clone(),
            leads: self.leads.clone(),
            automations: self.automations.clone(),
            events: self.events.clone(),
            growth_plan: self.growth_plan.clone(),
        })
    }
}

/// Facade that the UI layer drives. Owns the working state, the persistence
/// stack and the background sync loop; every mutation is applied to the
/// in-memory state first and then written through best effort.
pub struct AppCore {
    persistence: Arc<PersistenceService>,
    leads: LeadService,
    sessions: SessionManager,
    local: Arc<LocalStore>,
    email: EmailService,
    state: tokio::sync::Mutex<ProjectState>,
    notifications: mpsc::Sender<Notification>,
    sync: SyncWorker,
}

impl AppCore {
    /// Standard construction: SQLite under `data_dir`, remote backend picked
    /// up from the environment on every call.
    pub fn new(data_dir: &Path) -> AppResult<(Arc<Self>, mpsc::Receiver<Notification>)> {
        let local = Arc::new(LocalStore::new(&data_dir.join(DB_FILE))?);
        let http = reqwest::Client::new();
        let persistence = Arc::new(PersistenceService::new(
            local.clone() as Arc<dyn ProjectStore>,
            http.clone(),
        ));
        let leads = LeadService::new(
            local.clone() as Arc<dyn LeadStore>,
            http,
            persistence.clone(),
        );
        Ok(Self::assemble(local, persistence, leads))
    }

    /// Local-only construction: the remote backend is never consulted,
    /// whatever the environment says.
    pub fn offline(data_dir: &Path) -> AppResult<(Arc<Self>, mpsc::Receiver<Notification>)> {
        let local = Arc::new(LocalStore::new(&data_dir.join(DB_FILE))?);
        let persistence = Arc::new(PersistenceService::with_remote_factory(
            local.clone() as Arc<dyn ProjectStore>,
            Box::new(|| None),
        ));
        let leads = LeadService::with_remote_factory(
            local.clone() as Arc<dyn LeadStore>,
            Box::new(|| None),
            persistence.clone(),
        );
        Ok(Self::assemble(local, persistence, leads))
    }

    fn assemble(
        local: Arc<LocalStore>,
        persistence: Arc<PersistenceService>,
        leads: LeadService,
    ) -> (Arc<Self>, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(NOTIFICATION_BUFFER);
        let core = Arc::new(Self {
            persistence,
            leads,
            sessions: SessionManager::new(),
            local,
            email: EmailService::new(),
            state: tokio::sync::Mutex::new(ProjectState::default()),
            notifications: tx,
            sync: SyncWorker::new(),
        });
        (core, rx)
    }

    pub fn persistence(&self) -> &PersistenceService {
        &self.persistence
    }

    pub fn lead_service(&self) -> &LeadService {
        &self.leads
    }

    pub async fn state_snapshot(&self) -> ProjectState {
        self.state.lock().await.clone()
    }

    fn notify(&self, kind: NotificationKind, message: impl Into<String>) {
        // Dropped when the receiver is gone or backed up; toasts are lossy.
        let _ = self.notifications.try_send(Notification {
            message: message.into(),
            kind,
        });
    }

    // ----- session -----

    pub fn sign_in(&self, tenant_id: &str, email: &str) {
        self.sessions.sign_in(tenant_id, email);
        info!(tenant_id, "tenant signed in");
    }

    pub async fn sign_out(&self) {
        self.sync.stop();
        self.sessions.sign_out();
        let mut state = self.state.lock().await;
        *state = ProjectState::default();
    }

    pub fn tenant_id(&self) -> Option<String> {
        self.sessions.tenant_id()
    }

    // ----- lifecycle -----

    /// Hydrate the working state from storage. Returns whether a project was
    /// found; a fresh tenant gets `false` and stays un-onboarded.
    pub async fn load_data(self: &Arc<Self>) -> bool {
        let tenant = self.sessions.tenant_id();
        let Some(saved) = self.persistence.load_project(tenant.as_deref()).await else {
            info!("no saved project found, awaiting onboarding");
            return false;
        };

        let mut data = saved.data;
        if data.automations.is_empty() {
            data.automations = default_automations();
        }

        // Unfiltered fetch: the backend's row-level security already scopes
        // visibility to the owner, and a filter would hide funnel leads that
        // carry no project reference.
        let fetched = self.leads.fetch_leads(None).await;
        if !fetched.is_empty() {
            data.leads = fetched;
        }

        {
            let mut state = self.state.lock().await;
            state.adopt(data);
        }
        self.maybe_start_sync();
        true
    }

    /// The poll loop runs only for an authenticated, onboarded tenant.
    fn maybe_start_sync(self: &Arc<Self>) {
        if self.sessions.current().is_some() {
            self.sync.start(self.clone());
        }
    }

    pub fn sync_running(&self) -> bool {
        self.sync.is_running()
    }

    /// First-run setup: install the generated blueprint together with the
    /// starter CRM record and automation stubs, then persist.
    pub async fn complete_onboarding(self: &Arc<Self>, blueprint: BusinessBlueprint) {
        let mut data = ProjectData::new(blueprint);
        data.clients = vec![sample_client()];
        data.automations = default_automations();

        {
            let mut state = self.state.lock().await;
            state.adopt(data.clone());
        }
        self.persist(&data).await;
        self.notify(NotificationKind::Success, "Your business is ready!");
        self.maybe_start_sync();
    }

    pub async fn reset_system_data(&self) {
        self.sync.stop();
        if let Err(err) = self.local.reset() {
            warn!(error = %err, "failed to clear local storage");
        }
        let mut state = self.state.lock().await;
        *state = ProjectState::default();
        self.notify(NotificationKind::Info, "All data cleared");
    }

    async fn persist(&self, data: &ProjectData) -> bool {
        let tenant = self.sessions.tenant_id();
        let saved = self.persistence.save_project(tenant.as_deref(), data).await;
        if !saved {
            self.notify(NotificationKind::Error, "Could not save your changes");
        }
        saved
    }

    async fn persist_state(&self) -> bool {
        let snapshot = { self.state.lock().await.to_project() };
        match snapshot {
            Some(data) => self.persist(&data).await,
            None => false,
        }
    }

    /// Write the working state through. `false` when nothing could be saved,
    /// including the pre-onboarding case where there is no project yet.
    pub async fn save_project(&self) -> bool {
        self.persist_state().await
    }

    // ----- clients -----

    pub async fn add_client(&self, payload: NewClientPayload) {
        let client = Client {
            id: Uuid::new_v4().to_string(),
            name: payload.name.unwrap_or_else(|| "New Client".to_string()),
            email: payload.email.unwrap_or_default(),
            phone: payload.phone,
            status: payload.status.unwrap_or(ClientStatus::Lead),
            program: payload.program.unwrap_or_else(|| "Interested".to_string()),
            join_date: Utc::now().format("%Y-%m-%d").to_string(),
            last_check_in: "Never".to_string(),
            progress: 0,
            notes: payload.notes,
            tags: payload.tags,
        };

        let (welcome_to, triggered) = {
            let mut state = self.state.lock().await;
            state.clients.push(client.clone());
            let triggered = run_signup_automations(&mut state);
            let welcome_to = (!client.email.is_empty()).then(|| client.email.clone());
            (welcome_to, triggered)
        };

        for name in triggered {
            self.notify(NotificationKind::Info, format!("Automation triggered: {}", name));
        }
        if let Some(to) = welcome_to {
            self.email.send_welcome(&to, &client.name).await;
        }
        self.persist_state().await;
        self.notify(NotificationKind::Success, format!("{} added", client.name));
    }

    /// Apply a partial update to one client. `false` when the id is unknown.
    pub async fn update_client(&self, client_id: &str, patch: ClientPatch) -> bool {
        let found = {
            let mut state = self.state.lock().await;
            match state.clients.iter_mut().find(|client| client.id == client_id) {
                Some(client) => {
                    client.apply(patch);
                    true
                }
                None => false,
            }
        };
        if found {
            self.persist_state().await;
        }
        found
    }

    /// Remove exactly one client; remaining order is untouched.
    pub async fn delete_client(&self, client_id: &str) -> bool {
        let found = {
            let mut state = self.state.lock().await;
            match state.clients.iter().position(|client| client.id == client_id) {
                Some(index) => {
                    state.clients.remove(index);
                    true
                }
                None => false,
            }
        };
        if found {
            self.persist_state().await;
        }
        found
    }

    pub async fn check_in(&self, client_id: &str) -> bool {
        let recipient = {
            let mut state = self.state.lock().await;
            match state.clients.iter_mut().find(|client| client.id == client_id) {
                Some(client) => {
                    client.last_check_in = "Just now".to_string();
                    Some((client.email.clone(), client.name.clone()))
                }
                None => None,
            }
        };
        let Some((email, name)) = recipient else {
            return false;
        };
        if !email.is_empty() {
            self.email.send_check_in(&email, &name).await;
        }
        self.persist_state().await;
        true
    }

    // ----- leads -----

    /// Owner-initiated capture (console, import). Public-funnel submissions
    /// go through `LeadService::submit_lead` directly.
    pub async fn capture_lead(&self, input: NewLead) {
        let tenant = self.sessions.tenant_id();
        self.leads.submit_lead(None, tenant.as_deref(), input).await;
        let fetched = self.leads.fetch_leads(None).await;
        if !fetched.is_empty() {
            let mut state = self.state.lock().await;
            state.leads = fetched;
        }
    }

    pub async fn update_lead_status(&self, lead_id: &str, status: LeadStatus) {
        self.leads.update_lead_status(lead_id, status).await;
        let mut state = self.state.lock().await;
        if let Some(lead) = state.leads.iter_mut().find(|lead| lead.id == lead_id) {
            lead.status = status;
        }
    }

    /// Promote a lead into an Active client. The lead itself is marked
    /// Converted, not removed.
    pub async fn convert_lead(&self, lead_id: &str) -> bool {
        let source = {
            let state = self.state.lock().await;
            state.leads.iter().find(|lead| lead.id == lead_id).cloned()
        };
        let Some(lead) = source else {
            return false;
        };

        self.update_lead_status(lead_id, LeadStatus::Converted).await;

        let client = Client {
            id: Uuid::new_v4().to_string(),
            name: lead.name.clone(),
            email: lead.email.clone(),
            phone: lead.phone.clone(),
            status: ClientStatus::Active,
            program: "Interested".to_string(),
            join_date: Utc::now().format("%Y-%m-%d").to_string(),
            last_check_in: "Never".to_string(),
            progress: 0,
            notes: None,
            tags: None,
        };
        {
            let mut state = self.state.lock().await;
            state.clients.push(client);
            state
                .events
                .push(AnalyticsEvent::now(EventType::ClientConverted, Some(json!({ "leadId": lead_id }))));
        }
        self.persist_state().await;
        self.notify(NotificationKind::Success, format!("{} is now a client", lead.name));
        true
    }

    // ----- project content -----

    pub async fn update_blueprint(&self, blueprint: BusinessBlueprint) {
        {
            let mut state = self.state.lock().await;
            state.blueprint = Some(blueprint);
        }
        self.persist_state().await;
    }

    pub async fn update_content_plan(&self, plan: Vec<SocialPost>) {
        {
            let mut state = self.state.lock().await;
            if let Some(blueprint) = state.blueprint.as_mut() {
                blueprint.content_plan = plan;
            }
        }
        self.persist_state().await;
    }

    pub async fn update_automations(&self, automations: Vec<Automation>) {
        {
            let mut state = self.state.lock().await;
            state.automations = automations;
        }
        self.persist_state().await;
    }

    pub async fn update_growth_plan(&self, plan: GrowthPlan) {
        {
            let mut state = self.state.lock().await;
            state.growth_plan = Some(plan);
        }
        self.persist_state().await;
    }

    /// Adopt a packaged template: blueprint, automations and growth plan are
    /// replaced wholesale while clients, leads and events are kept.
    pub async fn install_template(
        &self,
        blueprint: BusinessBlueprint,
        automations: Vec<Automation>,
        growth_plan: Option<GrowthPlan>,
    ) {
        {
            let mut state = self.state.lock().await;
            state.blueprint = Some(blueprint);
            state.automations = automations;
            state.growth_plan = growth_plan;
            state.onboarded = true;
        }
        self.persist_state().await;
        self.notify(NotificationKind::Success, "Template installed");
    }

    pub async fn track_event(&self, event_type: EventType, metadata: Option<serde_json::Value>) {
        let event = AnalyticsEvent::now(event_type, metadata);
        {
            let mut state = self.state.lock().await;
            state.events.push(event.clone());
        }
        let tenant = self.sessions.tenant_id();
        if !self.persistence.append_event(tenant.as_deref(), event).await {
            warn!(event_type = event_type.as_str(), "event was not persisted");
        }
    }

    // ----- sync -----

    /// One refresh cycle of the background loop: fetch the current lead and
    /// event collections and fold the differences into the working state.
    pub async fn poll_once(&self) {
        let (onboarded, prev_leads, prev_events) = {
            let state = self.state.lock().await;
            (state.onboarded, state.leads.len(), state.events.len())
        };
        if !onboarded {
            return;
        }

        let tenant = self.sessions.tenant_id();
        let fetched_leads = self.leads.fetch_leads(None).await;
        let fetched_events = self
            .persistence
            .load_project(tenant.as_deref())
            .await
            .map(|saved| saved.data.events)
            .unwrap_or_default();

        let outcome = poll_diff(prev_leads, fetched_leads, prev_events, fetched_events);
        {
            let mut state = self.state.lock().await;
            if let Some(leads) = outcome.leads {
                state.leads = leads;
            }
            if let Some(events) = outcome.events {
                state.events = events;
            }
        }
        if outcome.new_lead_alert {
            self.notify(NotificationKind::Info, "New lead received!");
        }
    }
}

/// Bump the counters of every active automation whose trigger fires on a new
/// sign-up and record an `automation_triggered` event for each. Returns the
/// names of the automations that fired.
fn run_signup_automations(state: &mut ProjectState) -> Vec<String> {
    let mut triggered = Vec::new();
    for automation in state.automations.iter_mut() {
        if automation.status != AutomationStatus::Active {
            continue;
        }
        let trigger = automation.trigger.to_lowercase();
        if trigger.contains("sign up") || trigger.contains("new lead") || trigger.contains("client")
        {
            automation.stats.sent += 1;
            triggered.push(automation.name.clone());
            state.events.push(AnalyticsEvent::now(
                EventType::AutomationTriggered,
                Some(json!({ "automation": automation.name })),
            ));
        }
    }
    triggered
}
