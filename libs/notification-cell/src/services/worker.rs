use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use crate::error::NotificationError;
use crate::models::{NotificationRequest, RetryPolicy};
use crate::services::notifier::NotificationReceiver;
use crate::services::sink::NotificationSink;

/// Drains the notification queue and delivers each request to a sink.
pub struct NotificationWorker {
    receiver: NotificationReceiver,
    sink: Arc<dyn NotificationSink>,
    policy: RetryPolicy,
}

impl NotificationWorker {
    pub fn new(receiver: NotificationReceiver, sink: Arc<dyn NotificationSink>, policy: RetryPolicy) -> Self {
        Self {
            receiver,
            sink,
            policy,
        }
    }

    /// Runs until every `QueuedNotifier` sending to this worker is dropped.
    pub async fn run(mut self) {
        info!("Notification worker started");

        while let Some(request) = self.receiver.recv().await {
            if let Err(e) = deliver_with_retry(self.sink.as_ref(), self.policy, &request).await {
                error!("Giving up on notification {}: {}", request.id, e);
            }
        }

        info!("Notification worker stopped");
    }
}

/// Tries `1 + policy.max_retries` times. Returns the number of attempts used.
#[instrument(skip(sink, request), fields(notification_id = %request.id, event = %request.event))]
pub async fn deliver_with_retry(
    sink: &dyn NotificationSink,
    policy: RetryPolicy,
    request: &NotificationRequest,
) -> Result<u32, NotificationError> {
    let mut attempt = 0;

    loop {
        attempt += 1;

        match sink.deliver(request).await {
            Ok(()) => {
                debug!("Notification delivered on attempt {}", attempt);
                return Ok(attempt);
            }
            Err(e) if attempt <= policy.max_retries => {
                warn!("Notification delivery attempt {} failed: {}", attempt, e);
                tokio::time::sleep(policy.delay_after(attempt)).await;
            }
            Err(e) => {
                warn!("Final notification delivery attempt {} failed: {}", attempt, e);
                return Err(NotificationError::MaxRetriesExceeded {
                    appointment_id: request.appointment_id,
                    max_retries: policy.max_retries,
                });
            }
        }
    }
}
