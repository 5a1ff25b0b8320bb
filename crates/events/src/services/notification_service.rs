use std::sync::Arc;

use tracing::{debug, warn};

use dewana_auth::Identity;

use crate::entities::{Event, NewNotification, Notification};
use crate::repositories::NotificationRepository;
use crate::types::EventResult;

#[derive(Clone)]
pub struct NotificationService {
    notifications: Arc<dyn NotificationRepository>,
}

impl NotificationService {
    pub fn new(notifications: Arc<dyn NotificationRepository>) -> Self {
        Self { notifications }
    }

    /// Tell a signed-in guest their response was recorded.
    ///
    /// Failures are logged and otherwise ignored.
    pub async fn notify_rsvp_submitted(
        &self,
        identity: Option<&Identity>,
        event: &Event,
    ) -> Option<Notification> {
        let identity = identity?;
        let notification =
            NewNotification::rsvp_submitted(identity.user_id, event.id, &event.event_name);

        match self.notifications.create_notification(&notification).await {
            Ok(stored) => {
                debug!(user = %identity.public_id, event = %event.public_id, "queued rsvp notification");
                Some(stored)
            }
            Err(err) => {
                warn!(
                    user = %identity.public_id,
                    event = %event.public_id,
                    error = %err,
                    "failed to queue rsvp notification"
                );
                None
            }
        }
    }

    pub async fn list_for_user(&self, identity: &Identity) -> EventResult<Vec<Notification>> {
        self.notifications.list_notifications(identity.user_id).await
    }
}
