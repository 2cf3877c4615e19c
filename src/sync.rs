use crate::core::AppCore;
use crate::models::{AnalyticsEvent, Lead};
use std::sync::Arc;
use std::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Duration;

pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// What a single poll cycle decided to do with the freshly fetched data.
/// `None` means leave the cached collection untouched.
#[derive(Debug)]
pub struct PollOutcome {
    pub leads: Option<Vec<Lead>>,
    pub events: Option<Vec<AnalyticsEvent>>,
    pub new_lead_alert: bool,
}

/// Compare fetched collections against the cached counts. Diffing is by
/// length only, so a same-size replacement is invisible until the next count
/// change. At most one alert per cycle, and only when leads grew.
pub fn poll_diff(
    prev_lead_count: usize,
    fetched_leads: Vec<Lead>,
    prev_event_count: usize,
    fetched_events: Vec<AnalyticsEvent>,
) -> PollOutcome {
    let new_lead_alert = fetched_leads.len() > prev_lead_count;
    let leads = (fetched_leads.len() != prev_lead_count).then_some(fetched_leads);
    let events = (fetched_events.len() != prev_event_count).then_some(fetched_events);
    PollOutcome {
        leads,
        events,
        new_lead_alert,
    }
}

/// Background refresh loop. Runs one `poll_once` per tick for as long as the
/// worker is started; `stop` aborts the task mid-sleep.
pub struct SyncWorker {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl SyncWorker {
    pub fn new() -> Self {
        Self {
            handle: Mutex::new(None),
        }
    }

    pub fn start(&self, core: Arc<AppCore>) {
        let mut guard = match self.handle.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if guard.is_some() {
            return;
        }
        *guard = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(POLL_INTERVAL);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick fires immediately; skip it so startup data loads
            // are not doubled.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                core.poll_once().await;
            }
        }));
    }

    pub fn is_running(&self) -> bool {
        let guard = match self.handle.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.is_some()
    }

    pub fn stop(&self) {
        let mut guard = match self.handle.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(handle) = guard.take() {
            handle.abort();
        }
    }
}

impl Default for SyncWorker {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SyncWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::poll_diff;
    use crate::models::{AnalyticsEvent, EventType, Lead, LeadStatus};
    use chrono::Utc;
    use uuid::Uuid;

    fn lead(name: &str) -> Lead {
        Lead {
            id: Uuid::new_v4().to_string(),
            project_id: None,
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: None,
            message: None,
            status: LeadStatus::New,
            created_at: Utc::now(),
            source: "Website".to_string(),
        }
    }

    fn event() -> AnalyticsEvent {
        AnalyticsEvent::now(EventType::PageView, None)
    }

    #[test]
    fn unchanged_counts_leave_caches_alone() {
        let outcome = poll_diff(2, vec![lead("A"), lead("B")], 1, vec![event()]);
        assert!(outcome.leads.is_none());
        assert!(outcome.events.is_none());
        assert!(!outcome.new_lead_alert);
    }

    #[test]
    fn growth_replaces_and_alerts_once() {
        let outcome = poll_diff(1, vec![lead("A"), lead("B")], 0, vec![event()]);
        assert_eq!(outcome.leads.map(|leads| leads.len()), Some(2));
        assert_eq!(outcome.events.map(|events| events.len()), Some(1));
        assert!(outcome.new_lead_alert);
    }

    #[test]
    fn shrinkage_replaces_without_alerting() {
        let outcome = poll_diff(3, vec![lead("A")], 2, Vec::new());
        assert_eq!(outcome.leads.map(|leads| leads.len()), Some(1));
        assert_eq!(outcome.events.map(|events| events.len()), Some(0));
        assert!(!outcome.new_lead_alert);
    }

    #[test]
    fn first_lead_ever_still_alerts() {
        let outcome = poll_diff(0, vec![lead("A")], 0, Vec::new());
        assert!(outcome.new_lead_alert);
        assert_eq!(outcome.leads.map(|leads| leads.len()), Some(1));
        assert!(outcome.events.is_none());
    }

    #[test]
    fn same_count_swap_is_invisible() {
        // Length-only diffing: replacing one lead with another of the same
        // count does not refresh the cache.
        let outcome = poll_diff(1, vec![lead("B")], 0, Vec::new());
        assert!(outcome.leads.is_none());
        assert!(!outcome.new_lead_alert);
    }
}
