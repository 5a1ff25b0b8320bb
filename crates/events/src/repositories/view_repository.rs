//! Page view tracking.

use async_trait::async_trait;
use chrono::Utc;

use super::SqliteStore;
use crate::types::{EventError, EventResult};
use crate::utils::format_timestamp;

#[async_trait]
pub trait ViewRepository: Send + Sync {
    /// Append one view record.
    async fn record_view(&self, event_id: i64, viewer_id: Option<i64>) -> EventResult<()>;

    /// Bump the event's view counter and return the new value.
    async fn increment_view_count(&self, event_id: i64) -> EventResult<i64>;
}

#[async_trait]
impl ViewRepository for SqliteStore {
    async fn record_view(&self, event_id: i64, viewer_id: Option<i64>) -> EventResult<()> {
        sqlx::query("INSERT INTO event_views (event_id, viewer_user_id, viewed_at) VALUES (?, ?, ?)")
            .bind(event_id)
            .bind(viewer_id)
            .bind(format_timestamp(Utc::now()))
            .execute(self.pool())
            .await?;
        Ok(())
    }

    async fn increment_view_count(&self, event_id: i64) -> EventResult<i64> {
        let mut tx = self.pool().begin().await?;
        let count = sqlx::query_scalar::<_, i64>(
            "UPDATE events SET view_count = view_count + 1 WHERE id = ? RETURNING view_count",
        )
        .bind(event_id)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| EventError::event_not_found(event_id.to_string()))?;
        tx.commit().await?;
        Ok(count)
    }
}
