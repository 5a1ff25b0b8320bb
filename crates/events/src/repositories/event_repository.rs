//! Event and sub-event persistence.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::{new_public_id, SqliteStore};
use crate::entities::{
    parse_social_links, sort_sub_events, Event, EventCategory, EventFields, NewEvent,
    PublicationState, SubEvent, SubEventFields,
};
use crate::types::{EventError, EventResult};
use crate::utils::{format_timestamp, parse_timestamp};

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn find_event_by_slug(&self, slug: &str) -> EventResult<Option<Event>>;

    async fn find_event_by_public_id(&self, public_id: &str) -> EventResult<Option<Event>>;

    /// Sub-events of an event, ascending by date-time.
    async fn list_sub_events(&self, event_id: i64) -> EventResult<Vec<SubEvent>>;

    /// Events hosted by a user, newest first.
    async fn list_events_by_owner(&self, user_id: i64) -> EventResult<Vec<Event>>;

    /// Events with the given ids, ascending by start.
    async fn list_events_by_ids(&self, ids: &[i64]) -> EventResult<Vec<Event>>;

    /// Insert an event and its sub-events. Fails with `SlugTaken` on a slug collision.
    async fn create_event(&self, new_event: &NewEvent) -> EventResult<Event>;

    /// Overwrite an event's fields and apply the sub-event batch in one
    /// transaction: rows with an id are updated, rows without one are
    /// inserted and sub-events missing from the batch are removed.
    async fn update_event(
        &self,
        event_id: i64,
        fields: &EventFields,
        sub_events: &[SubEventFields],
    ) -> EventResult<Event>;

    async fn set_cover_image(&self, event_id: i64, url: &str) -> EventResult<()>;

    /// Delete an event owned by `owner_id` along with its responses.
    /// Returns whether anything was deleted.
    async fn delete_event(&self, event_id: i64, owner_id: i64) -> EventResult<bool>;
}

const EVENT_COLUMNS: &str = "id, public_id, user_id, slug, event_name, event_type, description, \
     host_names, start_date, end_date, venue_name, venue_address, parking_notes, dress_code, \
     cover_image_url, rsvp_enabled, status, view_count, youtube_link, custom_social_links, \
     google_photos_url, google_drive_url, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    id: i64,
    public_id: String,
    user_id: i64,
    slug: String,
    event_name: String,
    event_type: String,
    description: Option<String>,
    host_names: Option<String>,
    start_date: String,
    end_date: Option<String>,
    venue_name: Option<String>,
    venue_address: Option<String>,
    parking_notes: Option<String>,
    dress_code: Option<String>,
    cover_image_url: Option<String>,
    rsvp_enabled: bool,
    status: String,
    view_count: i64,
    youtube_link: Option<String>,
    custom_social_links: String,
    google_photos_url: Option<String>,
    google_drive_url: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<EventRow> for Event {
    type Error = EventError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        Ok(Event {
            id: row.id,
            public_id: row.public_id,
            user_id: row.user_id,
            slug: row.slug,
            event_name: row.event_name,
            event_type: EventCategory::from(row.event_type.as_str()),
            description: row.description,
            host_names: row.host_names,
            start_date: parse_timestamp(&row.start_date)?,
            end_date: row.end_date.as_deref().map(parse_timestamp).transpose()?,
            venue_name: row.venue_name,
            venue_address: row.venue_address,
            parking_notes: row.parking_notes,
            dress_code: row.dress_code,
            cover_image_url: row.cover_image_url,
            rsvp_enabled: row.rsvp_enabled,
            status: PublicationState::from(row.status.as_str()),
            view_count: row.view_count,
            youtube_link: row.youtube_link,
            custom_social_links: parse_social_links(&row.custom_social_links),
            google_photos_url: row.google_photos_url,
            google_drive_url: row.google_drive_url,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SubEventRow {
    id: i64,
    public_id: String,
    event_id: i64,
    name: String,
    date_time: String,
    location_name: Option<String>,
}

impl TryFrom<SubEventRow> for SubEvent {
    type Error = EventError;

    fn try_from(row: SubEventRow) -> Result<Self, Self::Error> {
        Ok(SubEvent {
            id: row.id,
            public_id: row.public_id,
            event_id: row.event_id,
            name: row.name,
            date_time: parse_timestamp(&row.date_time)?,
            location_name: row.location_name,
        })
    }
}

fn into_events(rows: Vec<EventRow>) -> EventResult<Vec<Event>> {
    rows.into_iter().map(Event::try_from).collect()
}

async fn insert_sub_event(
    conn: &mut SqliteConnection,
    event_id: i64,
    sub_event: &SubEventFields,
) -> EventResult<()> {
    sqlx::query(
        "INSERT INTO sub_events (public_id, event_id, name, date_time, location_name) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(new_public_id())
    .bind(event_id)
    .bind(&sub_event.name)
    .bind(format_timestamp(sub_event.date_time))
    .bind(sub_event.location_name.as_deref())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

impl SqliteStore {
    async fn fetch_event(&self, event_id: i64) -> EventResult<Event> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = ?"
        ))
        .bind(event_id)
        .fetch_optional(self.pool())
        .await?
        .ok_or_else(|| EventError::event_not_found(event_id.to_string()))?;
        row.try_into()
    }
}

#[async_trait]
impl EventRepository for SqliteStore {
    async fn find_event_by_slug(&self, slug: &str) -> EventResult<Option<Event>> {
        sqlx::query_as::<_, EventRow>(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE slug = ?"))
            .bind(slug)
            .fetch_optional(self.pool())
            .await?
            .map(Event::try_from)
            .transpose()
    }

    async fn find_event_by_public_id(&self, public_id: &str) -> EventResult<Option<Event>> {
        sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE public_id = ?"
        ))
        .bind(public_id)
        .fetch_optional(self.pool())
        .await?
        .map(Event::try_from)
        .transpose()
    }

    async fn list_sub_events(&self, event_id: i64) -> EventResult<Vec<SubEvent>> {
        let rows = sqlx::query_as::<_, SubEventRow>(
            "SELECT id, public_id, event_id, name, date_time, location_name \
             FROM sub_events WHERE event_id = ? ORDER BY date_time ASC, id ASC",
        )
        .bind(event_id)
        .fetch_all(self.pool())
        .await?;

        let mut sub_events = rows
            .into_iter()
            .map(SubEvent::try_from)
            .collect::<EventResult<Vec<_>>>()?;
        // stored text may carry mixed offsets from older rows
        sort_sub_events(&mut sub_events);
        Ok(sub_events)
    }

    async fn list_events_by_owner(&self, user_id: i64) -> EventResult<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE user_id = ? ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;
        into_events(rows)
    }

    async fn list_events_by_ids(&self, ids: &[i64]) -> EventResult<Vec<Event>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {EVENT_COLUMNS} FROM events WHERE id IN ("));
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY start_date ASC, id ASC");

        let rows = builder
            .build_query_as::<EventRow>()
            .fetch_all(self.pool())
            .await?;
        into_events(rows)
    }

    async fn create_event(&self, new_event: &NewEvent) -> EventResult<Event> {
        let fields = &new_event.fields;
        let now = format_timestamp(Utc::now());
        let mut tx = self.pool().begin().await?;

        let inserted = sqlx::query_scalar::<_, i64>(
            "INSERT INTO events (public_id, user_id, slug, event_name, event_type, description, \
             host_names, start_date, end_date, venue_name, venue_address, parking_notes, dress_code, \
             cover_image_url, rsvp_enabled, status, youtube_link, custom_social_links, \
             google_photos_url, google_drive_url, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(&new_event.public_id)
        .bind(new_event.user_id)
        .bind(&new_event.slug)
        .bind(&fields.event_name)
        .bind(fields.event_type.as_str())
        .bind(fields.description.as_deref())
        .bind(fields.host_names.as_deref())
        .bind(format_timestamp(fields.start_date))
        .bind(fields.end_date.map(format_timestamp))
        .bind(fields.venue_name.as_deref())
        .bind(fields.venue_address.as_deref())
        .bind(fields.parking_notes.as_deref())
        .bind(fields.dress_code.as_deref())
        .bind(fields.cover_image_url.as_deref())
        .bind(fields.rsvp_enabled)
        .bind(fields.status.as_str())
        .bind(fields.youtube_link.as_deref())
        .bind(fields.social_links_json()?)
        .bind(fields.google_photos_url.as_deref())
        .bind(fields.google_drive_url.as_deref())
        .bind(&now)
        .bind(&now)
        .fetch_one(&mut *tx)
        .await;

        let event_id = match inserted {
            Ok(id) => id,
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                return Err(EventError::SlugTaken {
                    slug: new_event.slug.clone(),
                })
            }
            Err(err) => return Err(err.into()),
        };

        for sub_event in &new_event.sub_events {
            insert_sub_event(&mut tx, event_id, sub_event).await?;
        }

        tx.commit().await?;
        self.fetch_event(event_id).await
    }

    async fn update_event(
        &self,
        event_id: i64,
        fields: &EventFields,
        sub_events: &[SubEventFields],
    ) -> EventResult<Event> {
        let mut tx = self.pool().begin().await?;

        let updated = sqlx::query(
            "UPDATE events SET event_name = ?, event_type = ?, description = ?, host_names = ?, \
             start_date = ?, end_date = ?, venue_name = ?, venue_address = ?, parking_notes = ?, \
             dress_code = ?, cover_image_url = ?, rsvp_enabled = ?, status = ?, youtube_link = ?, \
             custom_social_links = ?, google_photos_url = ?, google_drive_url = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(&fields.event_name)
        .bind(fields.event_type.as_str())
        .bind(fields.description.as_deref())
        .bind(fields.host_names.as_deref())
        .bind(format_timestamp(fields.start_date))
        .bind(fields.end_date.map(format_timestamp))
        .bind(fields.venue_name.as_deref())
        .bind(fields.venue_address.as_deref())
        .bind(fields.parking_notes.as_deref())
        .bind(fields.dress_code.as_deref())
        .bind(fields.cover_image_url.as_deref())
        .bind(fields.rsvp_enabled)
        .bind(fields.status.as_str())
        .bind(fields.youtube_link.as_deref())
        .bind(fields.social_links_json()?)
        .bind(fields.google_photos_url.as_deref())
        .bind(fields.google_drive_url.as_deref())
        .bind(format_timestamp(Utc::now()))
        .bind(event_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(EventError::event_not_found(event_id.to_string()));
        }

        let existing: Vec<String> =
            sqlx::query_scalar("SELECT public_id FROM sub_events WHERE event_id = ?")
                .bind(event_id)
                .fetch_all(&mut *tx)
                .await?;

        let mut kept = HashSet::new();
        for sub_event in sub_events {
            match &sub_event.public_id {
                Some(public_id) => {
                    if !existing.contains(public_id) {
                        return Err(EventError::validation(format!(
                            "Sub-event {public_id} does not belong to this event"
                        )));
                    }
                    sqlx::query(
                        "UPDATE sub_events SET name = ?, date_time = ?, location_name = ? \
                         WHERE public_id = ? AND event_id = ?",
                    )
                    .bind(&sub_event.name)
                    .bind(format_timestamp(sub_event.date_time))
                    .bind(sub_event.location_name.as_deref())
                    .bind(public_id)
                    .bind(event_id)
                    .execute(&mut *tx)
                    .await?;
                    kept.insert(public_id.clone());
                }
                None => insert_sub_event(&mut tx, event_id, sub_event).await?,
            }
        }

        for public_id in existing.iter().filter(|id| !kept.contains(*id)) {
            sqlx::query("DELETE FROM sub_events WHERE public_id = ? AND event_id = ?")
                .bind(public_id)
                .bind(event_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        self.fetch_event(event_id).await
    }

    async fn set_cover_image(&self, event_id: i64, url: &str) -> EventResult<()> {
        let result = sqlx::query("UPDATE events SET cover_image_url = ?, updated_at = ? WHERE id = ?")
            .bind(url)
            .bind(format_timestamp(Utc::now()))
            .bind(event_id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(EventError::event_not_found(event_id.to_string()));
        }
        Ok(())
    }

    async fn delete_event(&self, event_id: i64, owner_id: i64) -> EventResult<bool> {
        let mut tx = self.pool().begin().await?;

        sqlx::query(
            "DELETE FROM rsvps WHERE event_id = ? \
             AND event_id IN (SELECT id FROM events WHERE id = ? AND user_id = ?)",
        )
        .bind(event_id)
        .bind(event_id)
        .bind(owner_id)
        .execute(&mut *tx)
        .await?;

        let deleted = sqlx::query("DELETE FROM events WHERE id = ? AND user_id = ?")
            .bind(event_id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }
}
