use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Maximum retry attempts ({max_retries}) exceeded for appointment {appointment_id}")]
    MaxRetriesExceeded { appointment_id: Uuid, max_retries: u32 },
}
