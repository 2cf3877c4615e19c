use std::sync::{Arc, Mutex};

/// The signed-in tenant. `tenant_id` is the stable owner key every remote
/// row is partitioned by.
#[derive(Debug, Clone, PartialEq)]
pub struct TenantSession {
    pub tenant_id: String,
    pub email: String,
}

#[derive(Clone, Default)]
pub struct SessionManager {
    current: Arc<Mutex<Option<TenantSession>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sign_in(&self, tenant_id: &str, email: &str) {
        let mut current = self.lock();
        *current = Some(TenantSession {
            tenant_id: tenant_id.to_string(),
            email: email.to_string(),
        });
    }

    pub fn sign_out(&self) {
        let mut current = self.lock();
        *current = None;
    }

    pub fn current(&self) -> Option<TenantSession> {
        self.lock().clone()
    }

    pub fn tenant_id(&self) -> Option<String> {
        self.lock().as_ref().map(|session| session.tenant_id.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<TenantSession>> {
        match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
