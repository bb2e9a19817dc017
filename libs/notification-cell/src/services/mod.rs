pub mod notifier;
pub mod sink;
pub mod worker;

pub use notifier::{Notifier, QueuedNotifier, RecordingNotifier};
pub use sink::{LogSink, NotificationSink, WebhookSink};
pub use worker::{deliver_with_retry, NotificationWorker};
