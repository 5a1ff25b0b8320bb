//! In-app notification persistence.

use async_trait::async_trait;
use chrono::Utc;

use super::{new_public_id, SqliteStore};
use crate::entities::{NewNotification, Notification};
use crate::types::{EventError, EventResult};
use crate::utils::{format_timestamp, parse_timestamp};

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create_notification(&self, notification: &NewNotification) -> EventResult<Notification>;

    /// A user's notifications, newest first.
    async fn list_notifications(&self, user_id: i64) -> EventResult<Vec<Notification>>;
}

const NOTIFICATION_SELECT: &str = "SELECT n.id, n.public_id, n.user_id, n.title, n.message, \
     n.kind, e.public_id AS event_public_id, n.is_read, n.created_at \
     FROM notifications n LEFT JOIN events e ON e.id = n.related_event_id";

#[derive(Debug, sqlx::FromRow)]
struct NotificationRow {
    id: i64,
    public_id: String,
    user_id: i64,
    title: String,
    message: String,
    kind: String,
    event_public_id: Option<String>,
    is_read: bool,
    created_at: String,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = EventError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Notification {
            id: row.id,
            public_id: row.public_id,
            user_id: row.user_id,
            title: row.title,
            message: row.message,
            kind: row.kind,
            event_id: row.event_public_id,
            is_read: row.is_read,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

#[async_trait]
impl NotificationRepository for SqliteStore {
    async fn create_notification(&self, notification: &NewNotification) -> EventResult<Notification> {
        let mut tx = self.pool().begin().await?;
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO notifications (public_id, user_id, title, message, kind, related_event_id, is_read, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, 0, ?) RETURNING id",
        )
        .bind(new_public_id())
        .bind(notification.user_id)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.kind)
        .bind(notification.related_event_id)
        .bind(format_timestamp(Utc::now()))
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| EventError::internal("notification insert returned no id"))?;
        tx.commit().await?;

        sqlx::query_as::<_, NotificationRow>(&format!("{NOTIFICATION_SELECT} WHERE n.id = ?"))
            .bind(id)
            .fetch_one(self.pool())
            .await?
            .try_into()
    }

    async fn list_notifications(&self, user_id: i64) -> EventResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(&format!(
            "{NOTIFICATION_SELECT} WHERE n.user_id = ? ORDER BY n.created_at DESC, n.id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;
        rows.into_iter().map(Notification::try_from).collect()
    }
}
