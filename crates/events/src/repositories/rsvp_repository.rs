//! Guest response persistence.

use async_trait::async_trait;
use chrono::Utc;

use super::{new_public_id, SqliteStore};
use crate::entities::{Rsvp, RsvpStatus, RsvpSubmission};
use crate::types::{EventError, EventResult};
use crate::utils::{format_timestamp, parse_timestamp};

#[async_trait]
pub trait RsvpRepository: Send + Sync {
    /// Record a response. Either exactly one row for `(event, email)` is
    /// created or the call fails with `RsvpAlreadyExists`; concurrent calls
    /// for the same pair never both succeed.
    async fn create_rsvp(&self, event_id: i64, submission: &RsvpSubmission) -> EventResult<Rsvp>;

    /// Most recent response to an event for an email, compared case-insensitively.
    async fn find_latest_rsvp(&self, event_id: i64, email: &str) -> EventResult<Option<Rsvp>>;

    /// Responses to an event, newest first.
    async fn list_rsvps_for_event(&self, event_id: i64) -> EventResult<Vec<Rsvp>>;

    /// Ids of every event a guest email has responded to.
    async fn list_event_ids_for_guest(&self, email: &str) -> EventResult<Vec<i64>>;
}

const RSVP_COLUMNS: &str = "id, public_id, event_id, guest_name, guest_email, guest_phone, \
     rsvp_status, guest_count, message, submitted_at";

#[derive(Debug, sqlx::FromRow)]
struct RsvpRow {
    id: i64,
    public_id: String,
    event_id: i64,
    guest_name: String,
    guest_email: String,
    guest_phone: Option<String>,
    rsvp_status: String,
    guest_count: Option<i64>,
    message: Option<String>,
    submitted_at: String,
}

impl TryFrom<RsvpRow> for Rsvp {
    type Error = EventError;

    fn try_from(row: RsvpRow) -> Result<Self, Self::Error> {
        Ok(Rsvp {
            id: row.id,
            public_id: row.public_id,
            event_id: row.event_id,
            guest_name: row.guest_name,
            guest_email: row.guest_email,
            guest_phone: row.guest_phone,
            status: RsvpStatus::from(row.rsvp_status.as_str()),
            guest_count: row.guest_count.and_then(|count| u8::try_from(count).ok()),
            message: row.message,
            submitted_at: parse_timestamp(&row.submitted_at)?,
        })
    }
}

#[async_trait]
impl RsvpRepository for SqliteStore {
    async fn create_rsvp(&self, event_id: i64, submission: &RsvpSubmission) -> EventResult<Rsvp> {
        let mut tx = self.pool().begin().await?;

        // one statement, so the duplicate check and the insert are atomic.
        // fetch_all steps it to completion before the commit.
        let inserted = sqlx::query_as::<_, RsvpRow>(&format!(
            "INSERT INTO rsvps (public_id, event_id, guest_name, guest_email, guest_phone, \
             rsvp_status, guest_count, message, submitted_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT (event_id, guest_email) DO NOTHING RETURNING {RSVP_COLUMNS}"
        ))
        .bind(new_public_id())
        .bind(event_id)
        .bind(&submission.guest_name)
        .bind(&submission.guest_email)
        .bind(submission.guest_phone.as_deref())
        .bind(submission.status.as_str())
        .bind(submission.guest_count.map(i64::from))
        .bind(submission.message.as_deref())
        .bind(format_timestamp(Utc::now()))
        .fetch_all(&mut *tx)
        .await;

        let row = match inserted.map(|rows| rows.into_iter().next()) {
            Ok(Some(row)) => row,
            Ok(None) => return Err(EventError::RsvpAlreadyExists),
            Err(sqlx::Error::Database(err)) if err.is_foreign_key_violation() => {
                return Err(EventError::event_not_found(event_id.to_string()))
            }
            Err(err) => return Err(err.into()),
        };

        tx.commit().await?;
        row.try_into()
    }

    async fn find_latest_rsvp(&self, event_id: i64, email: &str) -> EventResult<Option<Rsvp>> {
        sqlx::query_as::<_, RsvpRow>(&format!(
            "SELECT {RSVP_COLUMNS} FROM rsvps \
             WHERE event_id = ? AND guest_email = ? COLLATE NOCASE \
             ORDER BY submitted_at DESC, id DESC LIMIT 1"
        ))
        .bind(event_id)
        .bind(email.trim())
        .fetch_optional(self.pool())
        .await?
        .map(Rsvp::try_from)
        .transpose()
    }

    async fn list_rsvps_for_event(&self, event_id: i64) -> EventResult<Vec<Rsvp>> {
        let rows = sqlx::query_as::<_, RsvpRow>(&format!(
            "SELECT {RSVP_COLUMNS} FROM rsvps WHERE event_id = ? ORDER BY submitted_at DESC, id DESC"
        ))
        .bind(event_id)
        .fetch_all(self.pool())
        .await?;
        rows.into_iter().map(Rsvp::try_from).collect()
    }

    async fn list_event_ids_for_guest(&self, email: &str) -> EventResult<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT DISTINCT event_id FROM rsvps WHERE guest_email = ? COLLATE NOCASE",
        )
        .bind(email.trim())
        .fetch_all(self.pool())
        .await?;
        Ok(ids)
    }
}
