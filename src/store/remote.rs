use crate::config::RemoteConfig;
use crate::errors::{AppError, AppResult};
use crate::models::{Lead, LeadStatus, ProjectData, SavedProject};
use crate::slug::derive_slug;
use crate::store::{LeadStore, ProjectStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Thin table-style CRUD client for the hosted relational backend.
///
/// Speaks the per-table REST dialect: one route per relation, filters in the
/// query string, upserts via `Prefer: resolution=merge-duplicates`.
pub struct RemoteStore {
    http: reqwest::Client,
    config: RemoteConfig,
}

/// `projects` relation: one row per tenant. The `blueprint` column holds the
/// whole project blob (either era; normalized on read).
#[derive(Debug, Serialize, Deserialize)]
struct ProjectRow {
    owner_id: String,
    blueprint: serde_json::Value,
    public_slug: String,
    last_updated: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct ProjectSelectRow {
    blueprint: serde_json::Value,
    last_updated: DateTime<Utc>,
}

/// Slug resolution reads the owner key, not the surrogate row id:
/// `inbound_leads.project_id` and every owner-scoped filter use `owner_id`,
/// so resolving to anything else would strand funnel leads in a key space no
/// fetch ever queries.
#[derive(Debug, Deserialize)]
struct ProjectOwnerRow {
    owner_id: String,
}

/// `inbound_leads` relation, snake_case per the backend schema.
#[derive(Debug, Serialize, Deserialize)]
struct LeadRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    project_id: Option<String>,
    name: String,
    email: String,
    phone: Option<String>,
    message: Option<String>,
    status: String,
    source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
}

impl RemoteStore {
    pub fn new(http: reqwest::Client, config: RemoteConfig) -> Self {
        Self { http, config }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.config.url.trim_end_matches('/'), table)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.config.anon_key)
            .header("Authorization", format!("Bearer {}", self.config.anon_key))
    }

    fn parse_status(raw: &str) -> LeadStatus {
        match raw {
            "Contacted" => LeadStatus::Contacted,
            "Converted" => LeadStatus::Converted,
            "Archived" => LeadStatus::Archived,
            _ => LeadStatus::New,
        }
    }

    fn lead_from_row(row: LeadRow) -> Lead {
        Lead {
            id: row.id.unwrap_or_default(),
            project_id: row.project_id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            message: row.message,
            status: Self::parse_status(&row.status),
            created_at: row.created_at.unwrap_or_else(Utc::now),
            source: row.source,
        }
    }
}

#[async_trait]
impl ProjectStore for RemoteStore {
    async fn save(&self, tenant_id: &str, saved: &SavedProject) -> AppResult<()> {
        let row = ProjectRow {
            owner_id: tenant_id.to_string(),
            blueprint: serde_json::to_value(&saved.data)?,
            public_slug: derive_slug(&saved.data.blueprint.business_name),
            last_updated: saved.last_updated,
        };

        let response = self
            .authed(self.http.post(self.table_url("projects")))
            .query(&[("on_conflict", "owner_id")])
            .header("Prefer", "resolution=merge-duplicates")
            .json(&row)
            .send()
            .await?;

        response.error_for_status().map_err(AppError::from)?;
        Ok(())
    }

    async fn load(&self, tenant_id: &str) -> AppResult<Option<SavedProject>> {
        let rows: Vec<ProjectSelectRow> = self
            .authed(self.http.get(self.table_url("projects")))
            .query(&[
                ("owner_id", format!("eq.{}", tenant_id).as_str()),
                ("select", "blueprint,last_updated"),
                ("limit", "1"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let Some(row) = rows.into_iter().next() else {
            return Ok(None);
        };
        Ok(Some(SavedProject {
            data: ProjectData::from_stored(row.blueprint)?,
            last_updated: row.last_updated,
        }))
    }

    async fn load_by_slug(&self, slug: &str) -> AppResult<Option<SavedProject>> {
        let rows: Vec<ProjectSelectRow> = self
            .authed(self.http.get(self.table_url("projects")))
            .query(&[
                ("public_slug", format!("ilike.{}", slug).as_str()),
                ("select", "blueprint,last_updated"),
                ("limit", "1"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let Some(row) = rows.into_iter().next() else {
            return Ok(None);
        };
        Ok(Some(SavedProject {
            data: ProjectData::from_stored(row.blueprint)?,
            last_updated: row.last_updated,
        }))
    }

    async fn resolve_slug(&self, slug: &str) -> AppResult<Option<String>> {
        let rows: Vec<ProjectOwnerRow> = self
            .authed(self.http.get(self.table_url("projects")))
            .query(&[
                ("public_slug", format!("ilike.{}", slug).as_str()),
                ("select", "owner_id"),
                ("limit", "1"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(rows.into_iter().next().map(|row| row.owner_id))
    }
}

#[async_trait]
impl LeadStore for RemoteStore {
    async fn insert(&self, lead: &Lead) -> AppResult<()> {
        let row = LeadRow {
            id: None,
            project_id: lead.project_id.clone(),
            name: lead.name.clone(),
            email: lead.email.clone(),
            phone: lead.phone.clone(),
            message: lead.message.clone(),
            status: lead.status.as_str().to_string(),
            source: lead.source.clone(),
            created_at: None,
        };

        self.authed(self.http.post(self.table_url("inbound_leads")))
            .json(&row)
            .send()
            .await?
            .error_for_status()
            .map_err(AppError::from)?;
        Ok(())
    }

    async fn list(&self, project_id: Option<&str>) -> AppResult<Vec<Lead>> {
        let mut request = self
            .authed(self.http.get(self.table_url("inbound_leads")))
            .query(&[("select", "*"), ("order", "created_at.desc")]);
        if let Some(project_id) = project_id {
            request = request.query(&[("project_id", format!("eq.{}", project_id).as_str())]);
        }

        let rows: Vec<LeadRow> = request.send().await?.error_for_status()?.json().await?;
        Ok(rows.into_iter().map(Self::lead_from_row).collect())
    }

    async fn update_status(&self, lead_id: &str, status: LeadStatus) -> AppResult<()> {
        self.authed(self.http.patch(self.table_url("inbound_leads")))
            .query(&[("id", format!("eq.{}", lead_id).as_str())])
            .json(&json!({ "status": status.as_str() }))
            .send()
            .await?
            .error_for_status()
            .map_err(AppError::from)?;
        Ok(())
    }
}
