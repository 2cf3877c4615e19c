use business_os::{
    AppCore, BusinessBlueprint, ClientStatus, LeadStatus, NewClientPayload, NewLead,
};
use business_os::models::{PricingTier, WebsiteData};
use tempfile::TempDir;

fn blueprint() -> BusinessBlueprint {
    BusinessBlueprint {
        business_name: "Fit & Flow Coaching".to_string(),
        niche: "fitness".to_string(),
        target_audience: "new parents".to_string(),
        mission: "movement that fits real life".to_string(),
        website_data: WebsiteData {
            hero_headline: "Get moving again".to_string(),
            hero_subhead: "Short sessions, real results".to_string(),
            cta_text: "Start today".to_string(),
            features: vec!["At-home workouts".to_string()],
            pricing: vec![PricingTier {
                name: "Monthly".to_string(),
                price: "$39/mo".to_string(),
                features: vec!["Weekly plan".to_string(), "Chat support".to_string()],
            }],
            testimonials: Vec::new(),
            published_url: None,
        },
        content_plan: Vec::new(),
        suggested_programs: vec!["Postnatal Kickstart".to_string()],
    }
}

#[tokio::test]
async fn full_lifecycle_survives_a_restart() {
    let dir = TempDir::new().expect("temp dir");

    // First run: onboard, work the CRM, capture and convert a lead.
    {
        let (core, _rx) = AppCore::offline(dir.path()).expect("core");
        core.sign_in("tenant-1", "owner@example.com");
        assert!(!core.load_data().await);

        core.complete_onboarding(blueprint()).await;
        core.add_client(NewClientPayload {
            name: Some("Ada".to_string()),
            email: Some("ada@example.com".to_string()),
            status: Some(ClientStatus::Active),
            ..NewClientPayload::default()
        })
        .await;

        core.capture_lead(NewLead {
            name: "Grace".to_string(),
            email: "grace@example.com".to_string(),
            message: Some("Saw your page, keen to start".to_string()),
            ..NewLead::default()
        })
        .await;
        let lead_id = core.state_snapshot().await.leads[0].id.clone();
        assert!(core.convert_lead(&lead_id).await);
    }

    // Second run over the same data directory: everything comes back.
    {
        let (core, _rx) = AppCore::offline(dir.path()).expect("core");
        core.sign_in("tenant-1", "owner@example.com");
        assert!(core.load_data().await);

        let state = core.state_snapshot().await;
        assert_eq!(
            state.blueprint.as_ref().map(|b| b.business_name.as_str()),
            Some("Fit & Flow Coaching")
        );
        // Sample Client + Ada + converted Grace.
        assert_eq!(state.clients.len(), 3);
        let grace = state
            .clients
            .iter()
            .find(|client| client.name == "Grace")
            .expect("converted client");
        assert_eq!(grace.status, ClientStatus::Active);
        assert_eq!(state.leads.len(), 1);
        assert_eq!(state.leads[0].status, LeadStatus::Converted);
        assert_eq!(state.automations.len(), 2);
    }
}

#[tokio::test]
async fn public_slug_lookup_returns_a_stripped_project() {
    let dir = TempDir::new().expect("temp dir");
    let (core, _rx) = AppCore::offline(dir.path()).expect("core");
    core.sign_in("tenant-1", "owner@example.com");
    core.complete_onboarding(blueprint()).await;
    core.capture_lead(NewLead {
        name: "Grace".to_string(),
        email: "grace@example.com".to_string(),
        ..NewLead::default()
    })
    .await;

    // "Fit & Flow Coaching" collapses to this slug.
    let public = core
        .persistence()
        .load_public_by_slug("fit-flow-coaching")
        .await
        .expect("public project");
    assert_eq!(public.data.blueprint.business_name, "Fit & Flow Coaching");
    assert!(public.data.clients.is_empty());
    assert!(public.data.leads.is_empty());
    assert!(public.data.events.is_empty());

    assert!(core
        .persistence()
        .load_public_by_slug("someone-else")
        .await
        .is_none());
}

#[tokio::test]
async fn public_funnel_submission_lands_in_the_owner_inbox() {
    let dir = TempDir::new().expect("temp dir");
    let (core, _rx) = AppCore::offline(dir.path()).expect("core");
    core.sign_in("tenant-1", "owner@example.com");
    core.complete_onboarding(blueprint()).await;

    core.lead_service()
        .submit_lead(
            Some("/p/fit-flow-coaching"),
            None,
            NewLead {
                name: "Visitor".to_string(),
                email: "visitor@example.com".to_string(),
                source: Some("Instagram".to_string()),
                ..NewLead::default()
            },
        )
        .await;

    core.poll_once().await;
    let state = core.state_snapshot().await;
    assert_eq!(state.leads.len(), 1);
    assert_eq!(state.leads[0].name, "Visitor");
    assert_eq!(state.leads[0].source, "Instagram");
    assert_eq!(state.leads[0].status, LeadStatus::New);
}
