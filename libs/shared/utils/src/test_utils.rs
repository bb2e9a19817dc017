use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use shared_database::InMemoryIdentityDirectory;
use shared_models::auth::Role;
use shared_models::time_window::TimeWindow;

#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub role: Role,
}

impl TestUser {
    pub fn new(role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
        }
    }

    pub fn provider() -> Self {
        Self::new(Role::Provider)
    }

    pub fn client() -> Self {
        Self::new(Role::Client)
    }

    pub fn admin() -> Self {
        Self::new(Role::Admin)
    }
}

/// Builds an identity directory containing exactly `users`.
pub async fn directory_with(users: &[&TestUser]) -> Arc<InMemoryIdentityDirectory> {
    let directory = InMemoryIdentityDirectory::new();
    for user in users {
        directory.register(user.id, user.role).await;
    }
    Arc::new(directory)
}

pub fn utc(y: i32, m: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, mi, 0)
        .single()
        .unwrap_or_else(|| panic!("invalid test instant {}-{}-{} {}:{}", y, m, d, h, mi))
}

pub fn window(start: DateTime<Utc>, end: DateTime<Utc>) -> TimeWindow {
    TimeWindow::new(start, end).unwrap_or_else(|e| panic!("invalid test window: {}", e))
}
