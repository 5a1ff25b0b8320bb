use chrono::{DateTime, Utc};
use serde::Serialize;

/// In-app notification shown to a signed-in user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    #[serde(skip)]
    pub id: i64,
    #[serde(rename = "id")]
    pub public_id: String,
    #[serde(skip)]
    pub user_id: i64,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Public id of the event the notification refers to
    pub event_id: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Notification waiting to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub user_id: i64,
    pub title: String,
    pub message: String,
    pub kind: String,
    pub related_event_id: Option<i64>,
}

impl NewNotification {
    pub const KIND_SYSTEM: &'static str = "system";

    pub fn rsvp_submitted(user_id: i64, event_id: i64, event_name: &str) -> Self {
        Self {
            user_id,
            title: "RSVP Submitted Successfully! ✅".to_string(),
            message: format!("You're all set for \"{event_name}\"."),
            kind: Self::KIND_SYSTEM.to_string(),
            related_event_id: Some(event_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsvp_confirmation_wording() {
        let notification = NewNotification::rsvp_submitted(3, 8, "Garden Party");
        assert_eq!(notification.message, "You're all set for \"Garden Party\".");
        assert_eq!(notification.kind, "system");
        assert_eq!(notification.related_event_id, Some(8));
    }
}
