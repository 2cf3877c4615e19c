use crate::config::RemoteConfig;
use crate::models::{AnalyticsEvent, EventType, Lead, LeadStatus, NewLead};
use crate::persistence::PersistenceService;
use crate::store::remote::RemoteStore;
use crate::store::LeadStore;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, warn};
use uuid::Uuid;

/// Path prefix identifying the public funnel view.
pub const PUBLIC_PATH_PREFIX: &str = "/p/";

pub type RemoteLeadFactory = Box<dyn Fn() -> Option<Arc<dyn LeadStore>> + Send + Sync>;

/// Accepts inbound leads from the unauthenticated public funnel and records
/// them against the correct tenant. Degrades rather than rejects: a lead with
/// an unresolvable tenant is stored with a NULL project reference, and a
/// remote outage diverts the write into the local blob.
pub struct LeadService {
    local: Arc<dyn LeadStore>,
    remote: RemoteLeadFactory,
    persistence: Arc<PersistenceService>,
}

pub fn env_lead_factory(http: reqwest::Client) -> RemoteLeadFactory {
    Box::new(move || {
        RemoteConfig::from_env()
            .map(|config| Arc::new(RemoteStore::new(http.clone(), config)) as Arc<dyn LeadStore>)
    })
}

/// Extract the tenant slug from a public URL path: the segment after the
/// fixed `/p/` prefix, up to the next separator. `None` when the path is not
/// a public route.
pub fn slug_from_path(path: &str) -> Option<String> {
    let rest = path.split(PUBLIC_PATH_PREFIX).nth(1)?;
    let slug = rest
        .split(['/', '?', '#'])
        .next()
        .unwrap_or("")
        .trim();
    if slug.is_empty() {
        None
    } else {
        Some(slug.to_string())
    }
}

impl LeadService {
    pub fn new(
        local: Arc<dyn LeadStore>,
        http: reqwest::Client,
        persistence: Arc<PersistenceService>,
    ) -> Self {
        Self {
            local,
            remote: env_lead_factory(http),
            persistence,
        }
    }

    pub fn with_remote_factory(
        local: Arc<dyn LeadStore>,
        remote: RemoteLeadFactory,
        persistence: Arc<PersistenceService>,
    ) -> Self {
        Self {
            local,
            remote,
            persistence,
        }
    }

    /// Record an inbound lead.
    ///
    /// `public_path` is the URL the submission came from; a `/p/<slug>`
    /// segment resolves to the owning tenant, and resolution failure leaves
    /// the project reference NULL instead of dropping the lead. Without a
    /// slug this is an owner-initiated capture under `tenant_id`. A
    /// `lead_created` event is appended afterwards, best effort; its failure
    /// never rolls back the insert.
    pub async fn submit_lead(
        &self,
        public_path: Option<&str>,
        tenant_id: Option<&str>,
        input: NewLead,
    ) {
        let slug = public_path.and_then(slug_from_path);
        let project_id = match &slug {
            Some(slug) => {
                let resolved = self.persistence.resolve_slug(slug).await;
                if resolved.is_none() {
                    warn!(slug = %slug, "could not resolve project for slug, storing lead without tenant");
                }
                resolved
            }
            None => tenant_id.map(ToString::to_string),
        };

        let source = input.source.unwrap_or_else(|| "Website".to_string());
        let lead = Lead {
            id: Uuid::new_v4().to_string(),
            project_id: project_id.clone(),
            name: input.name,
            email: input.email,
            phone: input.phone,
            message: input.message,
            status: LeadStatus::New,
            created_at: Utc::now(),
            source: source.clone(),
        };

        let mut recorded = false;
        if let Some(remote) = (self.remote)() {
            match remote.insert(&lead).await {
                Ok(()) => recorded = true,
                Err(err) => {
                    error!(error = %err, "remote lead insert failed, falling back to local storage");
                }
            }
        }
        if !recorded {
            if let Err(err) = self.local.insert(&lead).await {
                error!(error = %err, "failed to record lead locally");
            }
        }

        // Leads and events are not transactional together.
        let mut event = AnalyticsEvent::now(
            EventType::LeadCreated,
            Some(json!({ "source": source })),
        );
        event.project_id = project_id.clone();
        let event_tenant = project_id.as_deref().or(tenant_id);
        if !self.persistence.append_event(event_tenant, event).await {
            warn!("lead_created event was not recorded");
        }
    }

    /// All leads for the tenant, newest first on the remote path. The local
    /// path reads the legacy embedded array and returns it as stored.
    pub async fn fetch_leads(&self, project_id: Option<&str>) -> Vec<Lead> {
        let result = match (self.remote)() {
            Some(remote) => remote.list(project_id).await,
            None => self.local.list(project_id).await,
        };
        match result {
            Ok(leads) => leads,
            Err(err) => {
                error!(error = %err, "failed to fetch leads");
                Vec::new()
            }
        }
    }

    /// Single-field status write, fire-and-forget: a lost write is logged,
    /// not retried and not surfaced. No transition rules are enforced.
    pub async fn update_lead_status(&self, lead_id: &str, status: LeadStatus) {
        let result = match (self.remote)() {
            Some(remote) => remote.update_status(lead_id, status).await,
            None => self.local.update_status(lead_id, status).await,
        };
        if let Err(err) = result {
            error!(error = %err, lead_id, "failed to update lead status");
        }
    }
}
