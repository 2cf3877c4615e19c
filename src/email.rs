use tokio::time::Duration;
use tracing::info;

/// Simulated transactional mail. No provider is wired up; each send logs the
/// message, waits a beat to mimic network latency, and reports success.
#[derive(Clone, Default)]
pub struct EmailService;

const SIMULATED_LATENCY: Duration = Duration::from_millis(50);

impl EmailService {
    pub fn new() -> Self {
        Self
    }

    pub async fn send_welcome(&self, to: &str, business_name: &str) -> bool {
        self.deliver(to, &format!("Welcome to {}!", business_name)).await
    }

    pub async fn send_check_in(&self, to: &str, client_name: &str) -> bool {
        self.deliver(to, &format!("Checking in with you, {}", client_name)).await
    }

    pub async fn send_growth_report(&self, to: &str, business_name: &str) -> bool {
        self.deliver(to, &format!("{} growth report", business_name)).await
    }

    async fn deliver(&self, to: &str, subject: &str) -> bool {
        tokio::time::sleep(SIMULATED_LATENCY).await;
        info!(to, subject, "simulated email delivered");
        true
    }
}
