//! Fire-and-forget notification delivery.

use tracing::{debug, warn};

use crate::db::Database;
use crate::models::Notification;

/// Receives notifications. Delivery problems are the sink's to log; callers
/// never see them.
pub trait NotificationSink {
    fn emit(&self, notification: Notification);
}

/// Drops every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl NotificationSink for NoopSink {
    fn emit(&self, notification: Notification) {
        debug!(kind = notification.kind.as_str(), "Notification dropped");
    }
}

/// Stores notifications in the `notifications` table.
impl NotificationSink for Database {
    fn emit(&self, notification: Notification) {
        if let Err(e) = self.insert_notification(&notification) {
            warn!(
                recipient = %notification.recipient_id,
                kind = notification.kind.as_str(),
                error = %e,
                "Failed to store notification"
            );
        }
    }
}
