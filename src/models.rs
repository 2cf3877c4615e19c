use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientStatus {
    Lead,
    Active,
    Churned,
}

impl ClientStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lead => "Lead",
            Self::Active => "Active",
            Self::Churned => "Churned",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadStatus {
    New,
    Contacted,
    Converted,
    Archived,
}

impl LeadStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Contacted => "Contacted",
            Self::Converted => "Converted",
            Self::Archived => "Archived",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    PageView,
    LeadCreated,
    ClientConverted,
    AutomationTriggered,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PageView => "page_view",
            Self::LeadCreated => "lead_created",
            Self::ClientConverted => "client_converted",
            Self::AutomationTriggered => "automation_triggered",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageChannel {
    Email,
    WhatsApp,
    #[serde(rename = "SMS")]
    Sms,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutomationStatus {
    Active,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostType {
    Video,
    Image,
    Carousel,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostStatus {
    Draft,
    Scheduled,
    Published,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub status: ClientStatus,
    pub program: String,
    pub join_date: String,
    pub last_check_in: String,
    /// 0-100 by UI convention; not clamped at the storage layer.
    pub progress: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub status: LeadStatus,
    pub created_at: DateTime<Utc>,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl AnalyticsEvent {
    pub fn now(event_type: EventType, metadata: Option<serde_json::Value>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            project_id: None,
            event_type,
            metadata,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationStats {
    pub sent: u64,
    pub opened: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Automation {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub channel: MessageChannel,
    pub trigger: String,
    pub status: AutomationStatus,
    pub stats: AutomationStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialPost {
    pub id: String,
    pub day: u32,
    pub hook: String,
    pub body: String,
    pub cta: String,
    #[serde(rename = "type")]
    pub post_type: PostType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PostStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingTier {
    pub name: String,
    pub price: String,
    pub features: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub name: String,
    pub result: String,
    pub quote: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteData {
    pub hero_headline: String,
    pub hero_subhead: String,
    pub cta_text: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub pricing: Vec<PricingTier>,
    #[serde(default)]
    pub testimonials: Vec<Testimonial>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthExperiment {
    pub title: String,
    pub description: String,
    pub steps: Vec<String>,
    pub expected_impact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedMessage {
    pub channel: MessageChannel,
    pub copy: String,
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthPlan {
    pub id: String,
    pub experiments: Vec<GrowthExperiment>,
    pub suggested_messages: Vec<SuggestedMessage>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessBlueprint {
    pub business_name: String,
    pub niche: String,
    pub target_audience: String,
    pub mission: String,
    pub website_data: WebsiteData,
    #[serde(default)]
    pub content_plan: Vec<SocialPost>,
    #[serde(default)]
    pub suggested_programs: Vec<String>,
}

/// The Project aggregate as stored: blueprint plus owned collections.
///
/// `leads` remains for the legacy era where inbound leads were embedded in the
/// blob; in the current design they live in their own store and this field
/// only carries the local-fallback copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectData {
    pub blueprint: BusinessBlueprint,
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub leads: Vec<Lead>,
    #[serde(default)]
    pub automations: Vec<Automation>,
    #[serde(default)]
    pub events: Vec<AnalyticsEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub growth_plan: Option<GrowthPlan>,
}

impl ProjectData {
    pub fn new(blueprint: BusinessBlueprint) -> Self {
        Self {
            blueprint,
            clients: Vec::new(),
            leads: Vec::new(),
            automations: Vec::new(),
            events: Vec::new(),
            growth_plan: None,
        }
    }

    /// Normalize a stored project blob from either storage era.
    ///
    /// Older saves stored the bare blueprint object; newer saves store the
    /// full project. The eras are told apart by the `businessName` field at
    /// the top level, and missing collections default to empty.
    pub fn from_stored(value: serde_json::Value) -> crate::errors::AppResult<Self> {
        if value.get("businessName").is_some() {
            let blueprint: BusinessBlueprint = serde_json::from_value(value)?;
            return Ok(Self::new(blueprint));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Copy safe for unauthenticated public consumption: all private
    /// sub-collections removed, only the blueprint survives.
    pub fn public_view(&self) -> Self {
        Self {
            blueprint: self.blueprint.clone(),
            clients: Vec::new(),
            leads: Vec::new(),
            automations: Vec::new(),
            events: Vec::new(),
            growth_plan: None,
        }
    }
}

/// The envelope written to storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedProject {
    pub data: ProjectData,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLead {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClientPayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: Option<ClientStatus>,
    pub program: Option<String>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: Option<ClientStatus>,
    pub program: Option<String>,
    pub last_check_in: Option<String>,
    pub progress: Option<i64>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl Client {
    pub fn apply(&mut self, patch: ClientPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(phone) = patch.phone {
            self.phone = Some(phone);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(program) = patch.program {
            self.program = program;
        }
        if let Some(last_check_in) = patch.last_check_in {
            self.last_check_in = last_check_in;
        }
        if let Some(progress) = patch.progress {
            self.progress = progress;
        }
        if let Some(notes) = patch.notes {
            self.notes = Some(notes);
        }
        if let Some(tags) = patch.tags {
            self.tags = Some(tags);
        }
    }
}

/// Seed CRM record installed at onboarding, so the dashboard is never empty.
pub fn sample_client() -> Client {
    Client {
        id: Uuid::new_v4().to_string(),
        name: "Sample Client".to_string(),
        email: "client@example.com".to_string(),
        phone: None,
        status: ClientStatus::Lead,
        program: "Interested".to_string(),
        join_date: Utc::now().format("%Y-%m-%d").to_string(),
        last_check_in: "Never".to_string(),
        progress: 0,
        notes: None,
        tags: None,
    }
}

/// Automation stubs installed for a fresh tenant.
pub fn default_automations() -> Vec<Automation> {
    vec![
        Automation {
            id: "1".to_string(),
            name: "Weekly Client Check-in".to_string(),
            channel: MessageChannel::WhatsApp,
            trigger: "Every Monday 8AM".to_string(),
            status: AutomationStatus::Active,
            stats: AutomationStats {
                sent: 0,
                opened: "0%".to_string(),
            },
        },
        Automation {
            id: "2".to_string(),
            name: "New Lead Welcome".to_string(),
            channel: MessageChannel::Email,
            trigger: "On Sign Up".to_string(),
            status: AutomationStatus::Active,
            stats: AutomationStats {
                sent: 0,
                opened: "0%".to_string(),
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn blueprint() -> BusinessBlueprint {
        BusinessBlueprint {
            business_name: "Peak Performance Coaching".to_string(),
            niche: "fitness".to_string(),
            target_audience: "busy professionals".to_string(),
            mission: "get people moving".to_string(),
            website_data: WebsiteData {
                hero_headline: "Train smarter".to_string(),
                hero_subhead: "Coaching that fits your week".to_string(),
                cta_text: "Join now".to_string(),
                features: vec!["1:1 coaching".to_string()],
                pricing: Vec::new(),
                testimonials: Vec::new(),
                published_url: None,
            },
            content_plan: Vec::new(),
            suggested_programs: vec!["Kickstart".to_string()],
        }
    }

    #[test]
    fn from_stored_accepts_bare_blueprint_era() {
        let raw = serde_json::to_value(blueprint()).expect("serialize blueprint");
        assert!(raw.get("businessName").is_some());

        let project = ProjectData::from_stored(raw).expect("normalize bare blueprint");
        assert_eq!(project.blueprint.business_name, "Peak Performance Coaching");
        assert!(project.clients.is_empty());
        assert!(project.leads.is_empty());
        assert!(project.events.is_empty());
        assert!(project.growth_plan.is_none());
    }

    #[test]
    fn from_stored_fills_missing_collections() {
        let raw = json!({ "blueprint": serde_json::to_value(blueprint()).unwrap() });
        let project = ProjectData::from_stored(raw).expect("normalize partial project");
        assert!(project.clients.is_empty());
        assert!(project.automations.is_empty());
        assert!(project.events.is_empty());
    }

    #[test]
    fn event_type_uses_snake_case_wire_names() {
        let event = AnalyticsEvent::now(EventType::LeadCreated, None);
        let raw = serde_json::to_value(&event).expect("serialize event");
        assert_eq!(raw["type"], "lead_created");
    }

    #[test]
    fn public_view_strips_private_collections() {
        let mut project = ProjectData::new(blueprint());
        project.clients.push(sample_client());
        project.automations = default_automations();
        project.events.push(AnalyticsEvent::now(EventType::PageView, None));

        let public = project.public_view();
        assert!(public.clients.is_empty());
        assert!(public.leads.is_empty());
        assert!(public.events.is_empty());
        assert!(public.automations.is_empty());
        assert_eq!(public.blueprint, project.blueprint);
    }

    #[test]
    fn client_patch_applies_only_present_fields() {
        let mut client = sample_client();
        client.apply(ClientPatch {
            progress: Some(40),
            status: Some(ClientStatus::Active),
            ..ClientPatch::default()
        });
        assert_eq!(client.progress, 40);
        assert_eq!(client.status, ClientStatus::Active);
        assert_eq!(client.name, "Sample Client");
    }
}
