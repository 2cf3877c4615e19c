use crate::errors::{AppError, AppResult};
use crate::models::{Lead, LeadStatus, SavedProject};
use crate::slug::derive_slug;
use crate::store::{LeadStore, ProjectStore};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::Path;
use std::sync::Mutex;

/// Fixed key holding the entire serialized project envelope. The value is the
/// same `{data, lastUpdated}` JSON the browser build kept in local storage.
const PROJECT_KEY: &str = "business_os_project_v2";

const SCHEMA_SQL: &str = "CREATE TABLE IF NOT EXISTS kv_store (
  key TEXT PRIMARY KEY,
  value_json TEXT NOT NULL,
  updated_at TEXT NOT NULL
);";

/// Device-local fallback store: one tenant, one project blob.
#[derive(Debug)]
pub struct LocalStore {
    conn: Mutex<Connection>,
}

impl LocalStore {
    pub fn new(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| AppError::Storage(err.to_string()))?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    #[cfg(test)]
    pub fn in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn write_envelope(&self, saved: &SavedProject) -> AppResult<()> {
        let value_json = serde_json::to_string(saved)?;
        let conn = self
            .conn
            .lock()
            .map_err(|_| AppError::Internal("storage mutex poisoned".to_string()))?;
        conn.execute(
            "INSERT INTO kv_store (key, value_json, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json, updated_at = excluded.updated_at",
            params![PROJECT_KEY, value_json, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn read_envelope(&self) -> AppResult<Option<SavedProject>> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| AppError::Internal("storage mutex poisoned".to_string()))?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT value_json FROM kv_store WHERE key = ?1",
                [PROJECT_KEY],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(raw) => Ok(Some(serde_json::from_str::<SavedProject>(&raw)?)),
            None => Ok(None),
        }
    }

    /// "Reset system data": drop the stored envelope entirely.
    pub fn reset(&self) -> AppResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| AppError::Internal("storage mutex poisoned".to_string()))?;
        conn.execute("DELETE FROM kv_store WHERE key = ?1", [PROJECT_KEY])?;
        Ok(())
    }

    fn matches_slug(&self, slug: &str) -> AppResult<Option<SavedProject>> {
        let Some(saved) = self.read_envelope()? else {
            return Ok(None);
        };
        let stored_slug = derive_slug(&saved.data.blueprint.business_name);
        if !stored_slug.is_empty() && stored_slug == slug.to_lowercase() {
            Ok(Some(saved))
        } else {
            Ok(None)
        }
    }
}

/// The local store is single-tenant by construction; the tenant id exists
/// only to satisfy the store contract and is ignored.
#[async_trait]
impl ProjectStore for LocalStore {
    async fn save(&self, _tenant_id: &str, saved: &SavedProject) -> AppResult<()> {
        self.write_envelope(saved)
    }

    async fn load(&self, _tenant_id: &str) -> AppResult<Option<SavedProject>> {
        self.read_envelope()
    }

    async fn load_by_slug(&self, slug: &str) -> AppResult<Option<SavedProject>> {
        self.matches_slug(slug)
    }

    async fn resolve_slug(&self, slug: &str) -> AppResult<Option<String>> {
        Ok(self.matches_slug(slug)?.map(|_| "local".to_string()))
    }
}

/// Legacy-era lead storage: the leads array embedded in the project blob.
#[async_trait]
impl LeadStore for LocalStore {
    async fn insert(&self, lead: &Lead) -> AppResult<()> {
        let Some(mut saved) = self.read_envelope()? else {
            return Err(AppError::NotFound("no local project to attach lead to".to_string()));
        };
        saved.data.leads.push(lead.clone());
        self.write_envelope(&saved)
    }

    async fn list(&self, _project_id: Option<&str>) -> AppResult<Vec<Lead>> {
        Ok(self
            .read_envelope()?
            .map(|saved| saved.data.leads)
            .unwrap_or_default())
    }

    async fn update_status(&self, lead_id: &str, status: LeadStatus) -> AppResult<()> {
        let Some(mut saved) = self.read_envelope()? else {
            return Err(AppError::NotFound(format!("no local project for lead {}", lead_id)));
        };
        let mut found = false;
        for lead in saved.data.leads.iter_mut() {
            if lead.id == lead_id {
                lead.status = status;
                found = true;
            }
        }
        if !found {
            return Err(AppError::NotFound(format!("lead {} not found", lead_id)));
        }
        self.write_envelope(&saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AnalyticsEvent, BusinessBlueprint, EventType, ProjectData, WebsiteData,
    };
    use chrono::Utc;

    fn envelope(name: &str) -> SavedProject {
        SavedProject {
            data: ProjectData::new(BusinessBlueprint {
                business_name: name.to_string(),
                niche: "coaching".to_string(),
                target_audience: "founders".to_string(),
                mission: "help founders rest".to_string(),
                website_data: WebsiteData {
                    hero_headline: "Rest more".to_string(),
                    hero_subhead: "Do less, better".to_string(),
                    cta_text: "Book a call".to_string(),
                    features: Vec::new(),
                    pricing: Vec::new(),
                    testimonials: Vec::new(),
                    published_url: None,
                },
                content_plan: Vec::new(),
                suggested_programs: Vec::new(),
            }),
            last_updated: Utc::now(),
        }
    }

    fn lead(id: &str) -> Lead {
        Lead {
            id: id.to_string(),
            project_id: None,
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
            message: None,
            status: LeadStatus::New,
            created_at: Utc::now(),
            source: "Website".to_string(),
        }
    }

    #[tokio::test]
    async fn roundtrips_the_envelope() {
        let store = LocalStore::in_memory().expect("open store");
        assert!(store.read_envelope().expect("read").is_none());

        let mut saved = envelope("Calm Founders");
        saved
            .data
            .events
            .push(AnalyticsEvent::now(EventType::PageView, None));
        store.write_envelope(&saved).expect("write");

        let loaded = store.read_envelope().expect("read").expect("present");
        assert_eq!(loaded, saved);
    }

    #[tokio::test]
    async fn overwrites_in_place() {
        let store = LocalStore::in_memory().expect("open store");
        store.write_envelope(&envelope("First Name")).expect("write");
        store.write_envelope(&envelope("Second Name")).expect("write");
        let loaded = store.read_envelope().expect("read").expect("present");
        assert_eq!(loaded.data.blueprint.business_name, "Second Name");
    }

    #[tokio::test]
    async fn slug_lookup_matches_case_insensitively() {
        let store = LocalStore::in_memory().expect("open store");
        store.write_envelope(&envelope("Calm Founders")).expect("write");

        assert!(store.load_by_slug("calm-founders").await.expect("lookup").is_some());
        assert!(store.load_by_slug("CALM-FOUNDERS").await.expect("lookup").is_some());
        assert!(store.load_by_slug("someone-else").await.expect("lookup").is_none());
        assert_eq!(
            store.resolve_slug("calm-founders").await.expect("resolve"),
            Some("local".to_string())
        );
    }

    #[tokio::test]
    async fn embedded_leads_roundtrip_through_the_blob() {
        let store = LocalStore::in_memory().expect("open store");
        store.write_envelope(&envelope("Calm Founders")).expect("write");

        LeadStore::insert(&store, &lead("l1")).await.expect("insert");
        LeadStore::insert(&store, &lead("l2")).await.expect("insert");

        let listed = LeadStore::list(&store, None).await.expect("list");
        assert_eq!(listed.len(), 2);

        store
            .update_status("l1", LeadStatus::Contacted)
            .await
            .expect("update");
        let listed = LeadStore::list(&store, None).await.expect("list");
        assert_eq!(listed[0].status, LeadStatus::Contacted);
        assert_eq!(listed[1].status, LeadStatus::New);
    }

    #[tokio::test]
    async fn status_updates_are_last_writer_wins() {
        let store = LocalStore::in_memory().expect("open store");
        store.write_envelope(&envelope("Calm Founders")).expect("write");
        LeadStore::insert(&store, &lead("l1")).await.expect("insert");

        store.update_status("l1", LeadStatus::Contacted).await.expect("first");
        store.update_status("l1", LeadStatus::Converted).await.expect("second");

        let listed = LeadStore::list(&store, None).await.expect("list");
        assert_eq!(listed[0].status, LeadStatus::Converted);
    }

    #[tokio::test]
    async fn reset_drops_the_envelope() {
        let store = LocalStore::in_memory().expect("open store");
        store.write_envelope(&envelope("Calm Founders")).expect("write");
        store.reset().expect("reset");
        assert!(store.read_envelope().expect("read").is_none());
    }

    #[test]
    fn opens_on_disk_and_creates_parent_dirs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("business-os.sqlite");
        let store = LocalStore::new(&path).expect("open");
        store.write_envelope(&envelope("On Disk")).expect("write");
        drop(store);

        let reopened = LocalStore::new(&path).expect("reopen");
        let loaded = reopened.read_envelope().expect("read").expect("present");
        assert_eq!(loaded.data.blueprint.business_name, "On Disk");
    }
}
