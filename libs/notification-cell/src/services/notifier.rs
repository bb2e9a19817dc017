use std::sync::Mutex;

use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{NotificationEvent, NotificationRequest};

/// Fire-and-forget hand-off of appointment notifications.
///
/// Implementations must return immediately; delivery happens elsewhere and its
/// failure is never reported back to the caller.
pub trait Notifier: Send + Sync {
    fn enqueue_notification(&self, event: NotificationEvent, appointment_id: Uuid, recipients: Vec<Uuid>);
}

pub type NotificationSender = mpsc::UnboundedSender<NotificationRequest>;
pub type NotificationReceiver = mpsc::UnboundedReceiver<NotificationRequest>;

/// Pushes requests onto an in-process queue drained by `NotificationWorker`.
#[derive(Clone)]
pub struct QueuedNotifier {
    sender: NotificationSender,
}

impl QueuedNotifier {
    pub fn new(sender: NotificationSender) -> Self {
        Self { sender }
    }

    pub fn channel() -> (Self, NotificationReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }
}

impl Notifier for QueuedNotifier {
    fn enqueue_notification(&self, event: NotificationEvent, appointment_id: Uuid, recipients: Vec<Uuid>) {
        let request = NotificationRequest::new(event, appointment_id, recipients);
        debug!("Queueing {} notification {} for appointment {}", event, request.id, appointment_id);

        if self.sender.send(request).is_err() {
            warn!(
                "Notification worker is gone, dropping {} notification for appointment {}",
                event, appointment_id
            );
        }
    }
}

/// Keeps every request in memory.
#[derive(Default)]
pub struct RecordingNotifier {
    requests: Mutex<Vec<NotificationRequest>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<NotificationRequest> {
        match self.requests.lock() {
            Ok(requests) => requests.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn events_for(&self, appointment_id: Uuid) -> Vec<NotificationEvent> {
        self.requests()
            .into_iter()
            .filter(|r| r.appointment_id == appointment_id)
            .map(|r| r.event)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn enqueue_notification(&self, event: NotificationEvent, appointment_id: Uuid, recipients: Vec<Uuid>) {
        let request = NotificationRequest::new(event, appointment_id, recipients);
        match self.requests.lock() {
            Ok(mut requests) => requests.push(request),
            Err(poisoned) => poisoned.into_inner().push(request),
        }
    }
}
