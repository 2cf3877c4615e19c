pub mod config;
pub mod core;
pub mod email;
pub mod errors;
pub mod leads;
pub mod models;
pub mod persistence;
pub mod session;
pub mod slug;
pub mod store;
pub mod sync;

pub use crate::config::{is_remote_configured, RemoteConfig};
pub use crate::core::{AppCore, Notification, NotificationKind, ProjectState};
pub use crate::errors::{AppError, AppResult};
pub use crate::leads::{slug_from_path, LeadService};
pub use crate::models::{
    AnalyticsEvent, Automation, BusinessBlueprint, Client, ClientPatch, ClientStatus, EventType,
    GrowthPlan, Lead, LeadStatus, NewClientPayload, NewLead, ProjectData, SavedProject, SocialPost,
};
pub use crate::persistence::PersistenceService;
pub use crate::session::{SessionManager, TenantSession};
pub use crate::slug::derive_slug;

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

/// Set up JSON logging to a daily-rolled file under `data_dir/logs`. Safe to
/// call more than once; later calls are no-ops.
pub fn init_tracing(data_dir: &Path) -> AppResult<()> {
    let log_dir = data_dir.join("logs");
    std::fs::create_dir_all(&log_dir)?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "business_os.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .with_writer(non_blocking)
        .try_init();
    Ok(())
}
