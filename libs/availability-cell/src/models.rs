// libs/availability-cell/src/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::time_window::TimeWindow;
use shared_utils::timezone::DisplayRange;

// ==============================================================================
// CORE AVAILABILITY MODELS
// ==============================================================================

/// A window a provider has opened for booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub id: Uuid,
    pub provider_id: Uuid,
    #[serde(flatten)]
    pub window: TimeWindow,
    pub recurring: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AvailabilitySlot {
    pub fn new(provider_id: Uuid, window: TimeWindow, recurring: bool, notes: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            provider_id,
            window,
            recurring,
            notes,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn start_utc(&self) -> DateTime<Utc> {
        self.window.start()
    }

    pub fn end_utc(&self) -> DateTime<Utc> {
        self.window.end()
    }
}

/// A bookable increment rendered for the requesting zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub display: DisplayRange,
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAvailabilityRequest {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub recurring: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAvailabilityRequest {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
    pub zone: Option<String>,
    pub interval: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListAvailabilityQuery {
    pub date: Option<NaiveDate>,
    pub zone: Option<String>,
}
