pub mod local;
pub mod remote;

use crate::errors::AppResult;
use crate::models::{Lead, LeadStatus, SavedProject};
use async_trait::async_trait;

/// A backend able to persist the Project aggregate.
///
/// Implementations are free to fail; the fallback policy in
/// [`crate::persistence`] decides what callers see. The whole envelope is
/// written on every save (last-writer-wins, no version token).
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn save(&self, tenant_id: &str, saved: &SavedProject) -> AppResult<()>;
    async fn load(&self, tenant_id: &str) -> AppResult<Option<SavedProject>>;
    /// Public, unauthenticated lookup by derived slug (case-insensitive).
    async fn load_by_slug(&self, slug: &str) -> AppResult<Option<SavedProject>>;
    /// Resolve a public slug to the owning tenant id.
    async fn resolve_slug(&self, slug: &str) -> AppResult<Option<String>>;
}

/// A backend able to record and query inbound leads.
#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn insert(&self, lead: &Lead) -> AppResult<()>;
    /// All leads visible to the tenant, newest first where the backend can
    /// order them.
    async fn list(&self, project_id: Option<&str>) -> AppResult<Vec<Lead>>;
    async fn update_status(&self, lead_id: &str, status: LeadStatus) -> AppResult<()>;
}
