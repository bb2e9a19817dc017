use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::SchedulingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Provider,
    Client,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Provider => write!(f, "provider"),
            Role::Client => write!(f, "client"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "provider" => Ok(Role::Provider),
            "client" => Ok(Role::Client),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub role: Role,
}

impl Identity {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Looks up who a user id belongs to. Only the role matters to scheduling.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// `Ok(None)` when the id is unknown; `Err` only when the lookup itself failed.
    async fn resolve_identity(&self, user_id: Uuid) -> Result<Option<Identity>, SchedulingError>;
}

/// Resolves `user_id` and requires it to carry `expected`.
pub async fn require_role(
    resolver: &dyn IdentityResolver,
    user_id: Uuid,
    expected: Role,
) -> Result<Identity, SchedulingError> {
    match resolver.resolve_identity(user_id).await? {
        Some(identity) if identity.role == expected => Ok(identity),
        Some(identity) => Err(SchedulingError::Role(format!(
            "user {} has role {}, expected {}",
            user_id, identity.role, expected
        ))),
        None => Err(SchedulingError::Role(format!("user {} is not registered", user_id))),
    }
}

/// Resolves an acting user; unknown actors are refused rather than treated as a role error.
pub async fn resolve_actor(
    resolver: &dyn IdentityResolver,
    actor_id: Uuid,
) -> Result<Identity, SchedulingError> {
    resolver
        .resolve_identity(actor_id)
        .await?
        .ok_or_else(|| SchedulingError::Permission(format!("unknown actor {}", actor_id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_roles_case_insensitively() {
        assert_eq!("Provider".parse::<Role>().unwrap(), Role::Provider);
        assert_eq!(" client ".parse::<Role>().unwrap(), Role::Client);
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert!("doctor".parse::<Role>().is_err());
    }
}
