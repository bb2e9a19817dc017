use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;
use uuid::Uuid;

/// One async mutex per provider id.
///
/// Holders of the guard are the only writers for that provider, so a
/// validate-then-insert sequence run under it cannot interleave with another.
/// Different providers never contend.
#[derive(Default)]
pub struct ProviderLocks {
    locks: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl ProviderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, provider_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(locks.entry(provider_id).or_default())
        };

        let guard = lock.lock_owned().await;
        debug!("Scheduling lock acquired for provider {}", provider_id);
        guard
    }

    pub fn tracked_providers(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
