use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_config::AppConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationEvent {
    Created,
    StatusChanged,
    Rescheduled,
    Deleted,
}

impl fmt::Display for NotificationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationEvent::Created => write!(f, "created"),
            NotificationEvent::StatusChanged => write!(f, "status_changed"),
            NotificationEvent::Rescheduled => write!(f, "rescheduled"),
            NotificationEvent::Deleted => write!(f, "deleted"),
        }
    }
}

/// One queued notification about an appointment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub id: Uuid,
    pub event: NotificationEvent,
    pub appointment_id: Uuid,
    pub recipients: Vec<Uuid>,
    pub requested_at: DateTime<Utc>,
}

impl NotificationRequest {
    pub fn new(event: NotificationEvent, appointment_id: Uuid, recipients: Vec<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            event,
            appointment_id,
            recipients,
            requested_at: Utc::now(),
        }
    }
}

/// Bounded retries with linear backoff: attempt `n` waits `n * backoff` before retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_retries: config.notification_max_retries,
            backoff: Duration::from_millis(config.notification_retry_backoff_ms),
        }
    }

    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}
