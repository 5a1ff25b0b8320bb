//! In-memory implementation of every repository trait.
//!
//! Mirrors the SQLite store closely enough to run the service layer in
//! tests, and records RSVP create calls so tests can assert on them.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{
    new_public_id, EventRepository, NotificationRepository, RsvpRepository, ViewRepository,
};
use crate::entities::{
    sort_sub_events, Event, EventFields, NewEvent, NewNotification, Notification, Rsvp,
    RsvpSubmission, SubEvent, SubEventFields,
};
use crate::types::{EventError, EventResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewRecord {
    pub event_id: i64,
    pub viewer_id: Option<i64>,
}

#[derive(Default)]
struct MemoryState {
    next_id: i64,
    events: BTreeMap<i64, Event>,
    sub_events: BTreeMap<i64, SubEvent>,
    rsvps: BTreeMap<i64, Rsvp>,
    views: Vec<ViewRecord>,
    notifications: BTreeMap<i64, Notification>,
}

impl MemoryState {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn insert_sub_event(&mut self, event_id: i64, fields: &SubEventFields) {
        let id = self.allocate_id();
        self.sub_events.insert(
            id,
            SubEvent {
                id,
                public_id: new_public_id(),
                event_id,
                name: fields.name.clone(),
                date_time: fields.date_time,
                location_name: fields.location_name.clone(),
            },
        );
    }
}

fn apply_fields(event: &mut Event, fields: &EventFields) {
    event.event_name = fields.event_name.clone();
    event.event_type = fields.event_type;
    event.host_names = fields.host_names.clone();
    event.description = fields.description.clone();
    event.start_date = fields.start_date;
    event.end_date = fields.end_date;
    event.venue_name = fields.venue_name.clone();
    event.venue_address = fields.venue_address.clone();
    event.parking_notes = fields.parking_notes.clone();
    event.dress_code = fields.dress_code.clone();
    event.cover_image_url = fields.cover_image_url.clone();
    event.rsvp_enabled = fields.rsvp_enabled;
    event.status = fields.status;
    event.youtube_link = fields.youtube_link.clone();
    event.custom_social_links = fields.custom_social_links.clone();
    event.google_photos_url = fields.google_photos_url.clone();
    event.google_drive_url = fields.google_drive_url.clone();
    event.updated_at = Utc::now();
}

#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
    rsvp_calls: RwLock<Vec<(i64, RsvpSubmission)>>,
    create_delay: RwLock<Option<Duration>>,
    fail_views: AtomicBool,
    fail_notifications: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every payload passed to `create_rsvp`, in call order.
    pub async fn rsvp_create_calls(&self) -> Vec<(i64, RsvpSubmission)> {
        self.rsvp_calls.read().await.clone()
    }

    pub async fn views(&self) -> Vec<ViewRecord> {
        self.state.read().await.views.clone()
    }

    pub async fn notification_count(&self) -> usize {
        self.state.read().await.notifications.len()
    }

    /// Hold every `create_rsvp` call for `delay` before it touches state.
    pub async fn set_create_delay(&self, delay: Option<Duration>) {
        *self.create_delay.write().await = delay;
    }

    pub fn set_fail_views(&self, fail: bool) {
        self.fail_views.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_notifications(&self, fail: bool) {
        self.fail_notifications.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl EventRepository for InMemoryStore {
    async fn find_event_by_slug(&self, slug: &str) -> EventResult<Option<Event>> {
        let state = self.state.read().await;
        Ok(state.events.values().find(|e| e.slug == slug).cloned())
    }

    async fn find_event_by_public_id(&self, public_id: &str) -> EventResult<Option<Event>> {
        let state = self.state.read().await;
        Ok(state.events.values().find(|e| e.public_id == public_id).cloned())
    }

    async fn list_sub_events(&self, event_id: i64) -> EventResult<Vec<SubEvent>> {
        let state = self.state.read().await;
        let mut sub_events: Vec<_> = state
            .sub_events
            .values()
            .filter(|s| s.event_id == event_id)
            .cloned()
            .collect();
        sort_sub_events(&mut sub_events);
        Ok(sub_events)
    }

    async fn list_events_by_owner(&self, user_id: i64) -> EventResult<Vec<Event>> {
        let state = self.state.read().await;
        let mut events: Vec<_> = state
            .events
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(events)
    }

    async fn list_events_by_ids(&self, ids: &[i64]) -> EventResult<Vec<Event>> {
        let state = self.state.read().await;
        let mut events: Vec<_> = ids
            .iter()
            .collect::<HashSet<_>>()
            .into_iter()
            .filter_map(|id| state.events.get(id).cloned())
            .collect();
        events.sort_by(|a, b| a.start_date.cmp(&b.start_date).then(a.id.cmp(&b.id)));
        Ok(events)
    }

    async fn create_event(&self, new_event: &NewEvent) -> EventResult<Event> {
        let mut state = self.state.write().await;
        if state.events.values().any(|e| e.slug == new_event.slug) {
            return Err(EventError::SlugTaken {
                slug: new_event.slug.clone(),
            });
        }

        let id = state.allocate_id();
        let now = Utc::now();
        let fields = &new_event.fields;
        let event = Event {
            id,
            public_id: new_event.public_id.clone(),
            user_id: new_event.user_id,
            slug: new_event.slug.clone(),
            event_name: fields.event_name.clone(),
            event_type: fields.event_type,
            description: fields.description.clone(),
            host_names: fields.host_names.clone(),
            start_date: fields.start_date,
            end_date: fields.end_date,
            venue_name: fields.venue_name.clone(),
            venue_address: fields.venue_address.clone(),
            parking_notes: fields.parking_notes.clone(),
            dress_code: fields.dress_code.clone(),
            cover_image_url: fields.cover_image_url.clone(),
            rsvp_enabled: fields.rsvp_enabled,
            status: fields.status,
            view_count: 0,
            youtube_link: fields.youtube_link.clone(),
            custom_social_links: fields.custom_social_links.clone(),
            google_photos_url: fields.google_photos_url.clone(),
            google_drive_url: fields.google_drive_url.clone(),
            created_at: now,
            updated_at: now,
        };
        state.events.insert(id, event.clone());
        for sub_event in &new_event.sub_events {
            state.insert_sub_event(id, sub_event);
        }
        Ok(event)
    }

    async fn update_event(
        &self,
        event_id: i64,
        fields: &EventFields,
        sub_events: &[SubEventFields],
    ) -> EventResult<Event> {
        let mut state = self.state.write().await;
        if !state.events.contains_key(&event_id) {
            return Err(EventError::event_not_found(event_id.to_string()));
        }

        let existing: Vec<(i64, String)> = state
            .sub_events
            .values()
            .filter(|s| s.event_id == event_id)
            .map(|s| (s.id, s.public_id.clone()))
            .collect();
        for sub_event in sub_events {
            if let Some(public_id) = &sub_event.public_id {
                if !existing.iter().any(|(_, id)| id == public_id) {
                    return Err(EventError::validation(format!(
                        "Sub-event {public_id} does not belong to this event"
                    )));
                }
            }
        }

        if let Some(event) = state.events.get_mut(&event_id) {
            apply_fields(event, fields);
        }

        let mut kept = HashSet::new();
        for sub_event in sub_events {
            match &sub_event.public_id {
                Some(public_id) => {
                    if let Some((row_id, _)) = existing.iter().find(|(_, id)| id == public_id) {
                        if let Some(row) = state.sub_events.get_mut(row_id) {
                            row.name = sub_event.name.clone();
                            row.date_time = sub_event.date_time;
                            row.location_name = sub_event.location_name.clone();
                        }
                        kept.insert(*row_id);
                    }
                }
                None => state.insert_sub_event(event_id, sub_event),
            }
        }
        for (row_id, _) in existing {
            if !kept.contains(&row_id) {
                state.sub_events.remove(&row_id);
            }
        }

        state
            .events
            .get(&event_id)
            .cloned()
            .ok_or_else(|| EventError::event_not_found(event_id.to_string()))
    }

    async fn set_cover_image(&self, event_id: i64, url: &str) -> EventResult<()> {
        let mut state = self.state.write().await;
        let event = state
            .events
            .get_mut(&event_id)
            .ok_or_else(|| EventError::event_not_found(event_id.to_string()))?;
        event.cover_image_url = Some(url.to_string());
        event.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_event(&self, event_id: i64, owner_id: i64) -> EventResult<bool> {
        let mut state = self.state.write().await;
        let owned = state
            .events
            .get(&event_id)
            .is_some_and(|e| e.user_id == owner_id);
        if !owned {
            return Ok(false);
        }
        state.rsvps.retain(|_, r| r.event_id != event_id);
        state.sub_events.retain(|_, s| s.event_id != event_id);
        state.views.retain(|v| v.event_id != event_id);
        state.events.remove(&event_id);
        Ok(true)
    }
}

#[async_trait]
impl RsvpRepository for InMemoryStore {
    async fn create_rsvp(&self, event_id: i64, submission: &RsvpSubmission) -> EventResult<Rsvp> {
        self.rsvp_calls
            .write()
            .await
            .push((event_id, submission.clone()));

        let delay = *self.create_delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.write().await;
        if !state.events.contains_key(&event_id) {
            return Err(EventError::event_not_found(event_id.to_string()));
        }
        let duplicate = state.rsvps.values().any(|r| {
            r.event_id == event_id && r.guest_email.eq_ignore_ascii_case(&submission.guest_email)
        });
        if duplicate {
            return Err(EventError::RsvpAlreadyExists);
        }

        let id = state.allocate_id();
        let rsvp = Rsvp {
            id,
            public_id: new_public_id(),
            event_id,
            guest_name: submission.guest_name.clone(),
            guest_email: submission.guest_email.clone(),
            guest_phone: submission.guest_phone.clone(),
            status: submission.status,
            guest_count: submission.guest_count,
            message: submission.message.clone(),
            submitted_at: Utc::now(),
        };
        state.rsvps.insert(id, rsvp.clone());
        Ok(rsvp)
    }

    async fn find_latest_rsvp(&self, event_id: i64, email: &str) -> EventResult<Option<Rsvp>> {
        let email = email.trim();
        let state = self.state.read().await;
        Ok(state
            .rsvps
            .values()
            .filter(|r| r.event_id == event_id && r.guest_email.eq_ignore_ascii_case(email))
            .max_by(|a, b| a.submitted_at.cmp(&b.submitted_at).then(a.id.cmp(&b.id)))
            .cloned())
    }

    async fn list_rsvps_for_event(&self, event_id: i64) -> EventResult<Vec<Rsvp>> {
        let state = self.state.read().await;
        let mut rsvps: Vec<_> = state
            .rsvps
            .values()
            .filter(|r| r.event_id == event_id)
            .cloned()
            .collect();
        rsvps.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at).then(b.id.cmp(&a.id)));
        Ok(rsvps)
    }

    async fn list_event_ids_for_guest(&self, email: &str) -> EventResult<Vec<i64>> {
        let email = email.trim();
        let state = self.state.read().await;
        let ids: HashSet<i64> = state
            .rsvps
            .values()
            .filter(|r| r.guest_email.eq_ignore_ascii_case(email))
            .map(|r| r.event_id)
            .collect();
        Ok(ids.into_iter().collect())
    }
}

#[async_trait]
impl ViewRepository for InMemoryStore {
    async fn record_view(&self, event_id: i64, viewer_id: Option<i64>) -> EventResult<()> {
        if self.fail_views.load(Ordering::SeqCst) {
            return Err(EventError::storage("view log unavailable"));
        }
        self.state
            .write()
            .await
            .views
            .push(ViewRecord { event_id, viewer_id });
        Ok(())
    }

    async fn increment_view_count(&self, event_id: i64) -> EventResult<i64> {
        if self.fail_views.load(Ordering::SeqCst) {
            return Err(EventError::storage("view counter unavailable"));
        }
        let mut state = self.state.write().await;
        let event = state
            .events
            .get_mut(&event_id)
            .ok_or_else(|| EventError::event_not_found(event_id.to_string()))?;
        event.view_count += 1;
        Ok(event.view_count)
    }
}

#[async_trait]
impl NotificationRepository for InMemoryStore {
    async fn create_notification(&self, notification: &NewNotification) -> EventResult<Notification> {
        if self.fail_notifications.load(Ordering::SeqCst) {
            return Err(EventError::storage("notifications unavailable"));
        }
        let mut state = self.state.write().await;
        let id = state.allocate_id();
        let event_id = notification
            .related_event_id
            .and_then(|event_id| state.events.get(&event_id))
            .map(|event| event.public_id.clone());
        let stored = Notification {
            id,
            public_id: new_public_id(),
            user_id: notification.user_id,
            title: notification.title.clone(),
            message: notification.message.clone(),
            kind: notification.kind.clone(),
            event_id,
            is_read: false,
            created_at: Utc::now(),
        };
        state.notifications.insert(id, stored.clone());
        Ok(stored)
    }

    async fn list_notifications(&self, user_id: i64) -> EventResult<Vec<Notification>> {
        let state = self.state.read().await;
        Ok(state
            .notifications
            .values()
            .rev()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect())
    }
}
