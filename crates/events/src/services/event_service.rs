use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use dewana_auth::Identity;

use crate::entities::{Event, EventDraft, NewEvent};
use crate::lifecycle::LifecycleStatus;
use crate::media::{map_search_link, MediaHighlights};
use crate::repositories::{new_public_id, CoverStore, CoverUpload, Repositories};
use crate::settings::EventSettings;
use crate::types::{
    EventDetails, EventError, EventPage, EventResult, EventSummary, GuestList, GuestSummary,
    ShareLink,
};
use crate::utils::{generate_slug, random_token, utc_offset};

const SLUG_ATTEMPTS: usize = 5;

/// Event pages, host dashboard and event editing.
#[derive(Clone)]
pub struct EventService {
    repos: Repositories,
    covers: Arc<dyn CoverStore>,
    settings: EventSettings,
}

impl EventService {
    pub fn new(repos: Repositories, covers: Arc<dyn CoverStore>, settings: EventSettings) -> Self {
        Self {
            repos,
            covers,
            settings,
        }
    }

    pub fn settings(&self) -> &EventSettings {
        &self.settings
    }

    pub async fn event_by_slug(&self, slug: &str) -> EventResult<Event> {
        self.repos
            .events
            .find_event_by_slug(slug)
            .await?
            .ok_or_else(|| EventError::event_not_found(slug))
    }

    pub async fn event_by_id(&self, public_id: &str) -> EventResult<Event> {
        self.repos
            .events
            .find_event_by_public_id(public_id)
            .await?
            .ok_or_else(|| EventError::event_not_found(public_id))
    }

    pub fn status_at(&self, event: &Event, now: DateTime<Utc>) -> LifecycleStatus {
        event.schedule().status_at(now, self.settings.grace_window)
    }

    /// Everything the public page for `slug` shows, with the status at `now`.
    pub async fn page_by_slug(&self, slug: &str, now: DateTime<Utc>) -> EventResult<EventPage> {
        let event = self.event_by_slug(slug).await?;
        let sub_events = self.repos.events.list_sub_events(event.id).await?;

        Ok(EventPage {
            lifecycle_status: self.status_at(&event, now),
            media: MediaHighlights::for_event(&event),
            map_link: map_search_link(event.venue_name.as_deref(), event.venue_address.as_deref()),
            share: self.share_link(&event),
            sub_events,
            event,
        })
    }

    /// Log a page view and bump the counter. Both writes are best-effort.
    pub async fn record_view(&self, event: &Event, viewer: Option<&Identity>) {
        let viewer_id = viewer.map(|identity| identity.user_id);
        let (logged, counted) = tokio::join!(
            self.repos.views.record_view(event.id, viewer_id),
            self.repos.views.increment_view_count(event.id),
        );

        if let Err(err) = logged {
            warn!(event = %event.public_id, error = %err, "failed to record event view");
        }
        match counted {
            Ok(count) => debug!(event = %event.public_id, count, "event view counted"),
            Err(err) => warn!(event = %event.public_id, error = %err, "failed to increment view count"),
        }
    }

    pub fn share_link(&self, event: &Event) -> ShareLink {
        ShareLink {
            url: format!("{}/event/{}", self.settings.public_base_url, event.slug),
            title: event.event_name.clone(),
            text: format!("You're invited to {}!", event.event_name),
        }
    }

    pub async fn create_event(
        &self,
        identity: &Identity,
        draft: &EventDraft,
    ) -> EventResult<EventDetails> {
        let (fields, sub_events) = draft.resolve()?;
        let mut new_event = NewEvent {
            user_id: identity.user_id,
            public_id: new_public_id(),
            slug: generate_slug(&fields.event_name),
            fields,
            sub_events,
        };

        let mut attempts = 0;
        let event = loop {
            attempts += 1;
            match self.repos.events.create_event(&new_event).await {
                Ok(event) => break event,
                Err(EventError::SlugTaken { slug }) if attempts < SLUG_ATTEMPTS => {
                    debug!(slug, attempts, "slug collision, retrying");
                    new_event.slug = generate_slug(&new_event.fields.event_name);
                }
                Err(err) => return Err(err),
            }
        };

        info!(event = %event.public_id, slug = %event.slug, host = %identity.public_id, "event created");
        self.details(event).await
    }

    /// The edit form for an event, with times shown at `offset_minutes` from UTC.
    pub async fn load_for_edit(
        &self,
        identity: &Identity,
        public_id: &str,
        offset_minutes: i32,
    ) -> EventResult<EventDraft> {
        let offset = utc_offset(offset_minutes)?;
        let event = self.owned_event(identity, public_id).await?;
        let sub_events = self.repos.events.list_sub_events(event.id).await?;
        Ok(EventDraft::from_event(&event, &sub_events, offset))
    }

    /// Save the edit form. A failed cover upload keeps the previous cover.
    pub async fn update_event(
        &self,
        identity: &Identity,
        public_id: &str,
        draft: &EventDraft,
        cover: Option<CoverUpload>,
    ) -> EventResult<EventDetails> {
        let event = self.owned_event(identity, public_id).await?;
        let (mut fields, sub_events) = draft.resolve()?;

        if let Some(upload) = cover {
            match self.store_cover(identity, upload).await {
                Ok(url) => fields.cover_image_url = Some(url),
                Err(err) => {
                    warn!(event = %event.public_id, error = %err, "cover upload failed, keeping previous cover");
                    fields.cover_image_url = event.cover_image_url.clone();
                }
            }
        }

        let updated = self
            .repos
            .events
            .update_event(event.id, &fields, &sub_events)
            .await?;
        info!(event = %updated.public_id, "event updated");
        self.details(updated).await
    }

    /// Store a new cover image and attach it to the event.
    pub async fn upload_cover(
        &self,
        identity: &Identity,
        public_id: &str,
        upload: CoverUpload,
    ) -> EventResult<String> {
        let event = self.owned_event(identity, public_id).await?;
        let url = self.store_cover(identity, upload).await?;
        self.repos.events.set_cover_image(event.id, &url).await?;
        Ok(url)
    }

    pub async fn delete_event(&self, identity: &Identity, public_id: &str) -> EventResult<()> {
        let event = self.owned_event(identity, public_id).await?;
        if !self
            .repos
            .events
            .delete_event(event.id, identity.user_id)
            .await?
        {
            return Err(EventError::event_not_found(public_id));
        }
        info!(event = %event.public_id, host = %identity.public_id, "event deleted");
        Ok(())
    }

    pub async fn event_details(
        &self,
        identity: &Identity,
        public_id: &str,
    ) -> EventResult<EventDetails> {
        let event = self.owned_event(identity, public_id).await?;
        self.details(event).await
    }

    /// Events the identity hosts, newest first.
    pub async fn hosted_events(
        &self,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> EventResult<Vec<EventSummary>> {
        let events = self.repos.events.list_events_by_owner(identity.user_id).await?;
        Ok(self.summaries(events, now))
    }

    /// Events the identity's email has responded to, soonest first.
    pub async fn attending_events(
        &self,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> EventResult<Vec<EventSummary>> {
        let Some(email) = identity.email.as_deref() else {
            return Ok(Vec::new());
        };
        let ids = self.repos.rsvps.list_event_ids_for_guest(email).await?;
        let events = self.repos.events.list_events_by_ids(&ids).await?;
        Ok(self.summaries(events, now))
    }

    /// Responses to an event, visible to its host only.
    pub async fn guest_list(&self, identity: &Identity, public_id: &str) -> EventResult<GuestList> {
        let event = self.owned_event(identity, public_id).await?;
        let rsvps = self.repos.rsvps.list_rsvps_for_event(event.id).await?;
        Ok(GuestList {
            event_id: event.public_id,
            summary: GuestSummary::from_rsvps(&rsvps),
            rsvps,
        })
    }

    async fn owned_event(&self, identity: &Identity, public_id: &str) -> EventResult<Event> {
        let event = self.event_by_id(public_id).await?;
        event.ensure_owner(identity)?;
        Ok(event)
    }

    async fn details(&self, event: Event) -> EventResult<EventDetails> {
        let sub_events = self.repos.events.list_sub_events(event.id).await?;
        Ok(EventDetails { event, sub_events })
    }

    fn summaries(&self, events: Vec<Event>, now: DateTime<Utc>) -> Vec<EventSummary> {
        events
            .into_iter()
            .map(|event| EventSummary {
                lifecycle_status: self.status_at(&event, now),
                event,
            })
            .collect()
    }

    async fn store_cover(&self, identity: &Identity, upload: CoverUpload) -> EventResult<String> {
        let size = upload.bytes.len() as u64;
        if size == 0 {
            return Err(EventError::validation("Cover image is empty"));
        }
        if size > self.settings.max_cover_bytes {
            return Err(EventError::validation(format!(
                "Cover image must be at most {} bytes",
                self.settings.max_cover_bytes
            )));
        }
        let extension = upload.extension()?;
        let key = format!("{}/{}.{}", identity.public_id, random_token(16), extension);
        self.covers.put_cover(&key, upload.bytes).await
    }
}
