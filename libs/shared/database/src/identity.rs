use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_models::auth::{Identity, IdentityResolver, Role};
use shared_models::error::SchedulingError;

use crate::supabase::SupabaseClient;

/// Resolves roles from the `profiles` table over the Supabase REST API.
pub struct SupabaseIdentityResolver {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseIdentityResolver {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl IdentityResolver for SupabaseIdentityResolver {
    async fn resolve_identity(&self, user_id: Uuid) -> Result<Option<Identity>, SchedulingError> {
        debug!("Resolving identity for user {}", user_id);

        let role = self
            .supabase
            .get_profile_role(&user_id.to_string())
            .await
            .map_err(|e| {
                warn!("Identity lookup failed for {}: {}", user_id, e);
                SchedulingError::Unavailable("identity service unavailable".to_string())
            })?;

        match role {
            Some(raw) => match raw.parse::<Role>() {
                Ok(role) => Ok(Some(Identity::new(user_id, role))),
                Err(e) => {
                    warn!("Profile {} carries unsupported role: {}", user_id, e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }
}

/// Process-local identity table, used when no Supabase project is configured and in tests.
#[derive(Default)]
pub struct InMemoryIdentityDirectory {
    entries: RwLock<HashMap<Uuid, Role>>,
}

impl InMemoryIdentityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `uuid:role` pairs separated by commas.
    pub fn from_seed(seed: &str) -> Result<Self, String> {
        let mut entries = HashMap::new();

        for pair in seed.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (id, role) = pair
                .split_once(':')
                .ok_or_else(|| format!("identity seed entry '{}' is not uuid:role", pair))?;
            let id = Uuid::parse_str(id.trim())
                .map_err(|e| format!("identity seed entry '{}': {}", pair, e))?;
            entries.insert(id, role.parse::<Role>()?);
        }

        Ok(Self { entries: RwLock::new(entries) })
    }

    pub async fn register(&self, user_id: Uuid, role: Role) {
        self.entries.write().await.insert(user_id, role);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl IdentityResolver for InMemoryIdentityDirectory {
    async fn resolve_identity(&self, user_id: Uuid) -> Result<Option<Identity>, SchedulingError> {
        Ok(self
            .entries
            .read()
            .await
            .get(&user_id)
            .map(|role| Identity::new(user_id, *role)))
    }
}
