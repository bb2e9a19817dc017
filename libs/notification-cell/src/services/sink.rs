use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use crate::error::NotificationError;
use crate::models::NotificationRequest;

/// Final delivery target for a notification.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, request: &NotificationRequest) -> Result<(), NotificationError>;
}

/// Writes notifications to the log. Used when no webhook is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn deliver(&self, request: &NotificationRequest) -> Result<(), NotificationError> {
        info!(
            "Notification {}: {} for appointment {} to {} recipient(s)",
            request.id,
            request.event,
            request.appointment_id,
            request.recipients.len()
        );
        Ok(())
    }
}

/// POSTs each notification as JSON.
pub struct WebhookSink {
    client: Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    async fn deliver(&self, request: &NotificationRequest) -> Result<(), NotificationError> {
        debug!("Posting notification {} to {}", request.id, self.url);

        let response = self.client.post(&self.url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::DeliveryFailed(format!(
                "webhook answered {}: {}",
                status, body
            )));
        }

        Ok(())
    }
}
