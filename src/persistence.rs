use crate::config::RemoteConfig;
use crate::errors::AppResult;
use crate::models::{AnalyticsEvent, ProjectData, SavedProject};
use crate::store::remote::RemoteStore;
use crate::store::ProjectStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Builds the remote store for the current call, or `None` when remote
/// persistence is unconfigured. Re-evaluated on every operation so that
/// configuration changes take effect immediately.
pub type RemoteProjectFactory = Box<dyn Fn() -> Option<Arc<dyn ProjectStore>> + Send + Sync>;

/// Single point of truth for reading and writing the Project aggregate.
///
/// Tries the remote backend first when it is configured and a tenant is
/// authenticated, and degrades to the local store otherwise. No operation on
/// this surface returns an error or panics: failures are logged and callers
/// see `false` or `None` at worst.
pub struct PersistenceService {
    local: Arc<dyn ProjectStore>,
    remote: RemoteProjectFactory,
}

pub fn env_remote_factory(http: reqwest::Client) -> RemoteProjectFactory {
    Box::new(move || {
        RemoteConfig::from_env()
            .map(|config| Arc::new(RemoteStore::new(http.clone(), config)) as Arc<dyn ProjectStore>)
    })
}

impl PersistenceService {
    pub fn new(local: Arc<dyn ProjectStore>, http: reqwest::Client) -> Self {
        Self {
            local,
            remote: env_remote_factory(http),
        }
    }

    pub fn with_remote_factory(local: Arc<dyn ProjectStore>, remote: RemoteProjectFactory) -> Self {
        Self { local, remote }
    }

    /// Persist the whole aggregate. Remote first (when configured and
    /// authenticated), local fallback on any remote failure. Returns whether
    /// ANY path succeeded; a masked remote failure still reports `true`.
    pub async fn save_project(&self, tenant_id: Option<&str>, data: &ProjectData) -> bool {
        let saved = SavedProject {
            data: data.clone(),
            last_updated: Utc::now(),
        };

        if let (Some(remote), Some(tenant_id)) = ((self.remote)(), tenant_id) {
            match remote.save(tenant_id, &saved).await {
                Ok(()) => {
                    info!(tenant_id, "project saved to remote backend");
                    return true;
                }
                Err(err) => {
                    error!(error = %err, "remote save failed, falling back to local storage");
                }
            }
        }

        match self.local.save("local", &saved).await {
            Ok(()) => {
                info!("project saved to local fallback");
                true
            }
            Err(err) => {
                error!(error = %err, "failed to save project locally");
                false
            }
        }
    }

    /// Load the aggregate: remote first, local fallback, `None` for a fresh
    /// tenant.
    pub async fn load_project(&self, tenant_id: Option<&str>) -> Option<SavedProject> {
        if let (Some(remote), Some(tenant_id)) = ((self.remote)(), tenant_id) {
            match remote.load(tenant_id).await {
                Ok(Some(saved)) => {
                    debug!(tenant_id, "project loaded from remote backend");
                    return Some(saved);
                }
                Ok(None) => {}
                Err(err) => {
                    error!(error = %err, "remote load failed, falling back to local storage");
                }
            }
        }

        match self.local.load("local").await {
            Ok(found) => found,
            Err(err) => {
                error!(error = %err, "failed to load project locally");
                None
            }
        }
    }

    /// Public, unauthenticated lookup by slug. The result never carries
    /// clients, leads, events, or automations; the funnel page only needs the
    /// blueprint.
    pub async fn load_public_by_slug(&self, slug: &str) -> Option<SavedProject> {
        if let Some(remote) = (self.remote)() {
            match remote.load_by_slug(slug).await {
                Ok(Some(saved)) => return Some(strip_private(saved)),
                Ok(None) => {}
                Err(err) => {
                    error!(error = %err, slug, "public slug lookup failed on remote");
                }
            }
        }

        match self.local.load_by_slug(slug).await {
            Ok(found) => found.map(strip_private),
            Err(err) => {
                error!(error = %err, slug, "public slug lookup failed locally");
                None
            }
        }
    }

    /// Resolve a public slug to its owning tenant id, or `None` when it
    /// cannot be resolved for any reason.
    pub async fn resolve_slug(&self, slug: &str) -> Option<String> {
        let result: AppResult<Option<String>> = async {
            if let Some(remote) = (self.remote)() {
                if let Some(id) = remote.resolve_slug(slug).await? {
                    return Ok(Some(id));
                }
                return Ok(None);
            }
            self.local.resolve_slug(slug).await
        }
        .await;

        match result {
            Ok(found) => found,
            Err(err) => {
                error!(error = %err, slug, "slug resolution failed");
                None
            }
        }
    }

    /// Append one analytics event to the stored aggregate, best effort.
    pub async fn append_event(&self, tenant_id: Option<&str>, event: AnalyticsEvent) -> bool {
        let Some(mut saved) = self.load_project(tenant_id).await else {
            debug!("no project to append event to");
            return false;
        };
        saved.data.events.push(event);
        self.save_project(tenant_id, &saved.data).await
    }
}

fn strip_private(mut saved: SavedProject) -> SavedProject {
    saved.data = saved.data.public_view();
    saved
}
