use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use dewana_auth::Identity;

use super::sub_event::{SubEvent, SubEventDraft, SubEventFields};
use crate::lifecycle::EventSchedule;
use crate::types::{EventError, EventResult};
use crate::utils::{combine_local, non_empty, split_local, utc_offset, Validator};

const MAX_NAME_CHARS: usize = 255;
const MAX_TEXT_CHARS: usize = 5_000;
const MAX_SOCIAL_LINKS: usize = 20;

/// A hosted occasion with a shareable page.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    /// Database primary key
    #[serde(skip)]
    pub id: i64,
    /// Identifier exposed through the API
    #[serde(rename = "id")]
    pub public_id: String,
    /// Host's user id
    #[serde(skip)]
    pub user_id: i64,
    pub slug: String,
    pub event_name: String,
    pub event_type: EventCategory,
    pub description: Option<String>,
    pub host_names: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub venue_name: Option<String>,
    pub venue_address: Option<String>,
    pub parking_notes: Option<String>,
    pub dress_code: Option<String>,
    pub cover_image_url: Option<String>,
    pub rsvp_enabled: bool,
    pub status: PublicationState,
    pub view_count: i64,
    pub youtube_link: Option<String>,
    pub custom_social_links: Vec<SocialLink>,
    pub google_photos_url: Option<String>,
    pub google_drive_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn schedule(&self) -> EventSchedule {
        EventSchedule::new(self.start_date, self.end_date)
    }

    pub fn is_published(&self) -> bool {
        self.status == PublicationState::Published
    }

    pub fn is_owned_by(&self, identity: &Identity) -> bool {
        self.user_id == identity.user_id
    }

    /// Venue name and address joined for calendars and maps.
    pub fn location_label(&self) -> String {
        format!(
            "{} {}",
            self.venue_name.as_deref().unwrap_or_default(),
            self.venue_address.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string()
    }

    /// Check the event takes guest responses right now.
    pub fn ensure_accepts_rsvps(&self) -> EventResult<()> {
        if !self.is_published() {
            return Err(EventError::NotPublished);
        }
        if !self.rsvp_enabled {
            return Err(EventError::RsvpClosed);
        }
        Ok(())
    }

    pub fn ensure_owner(&self, identity: &Identity) -> EventResult<()> {
        if self.is_owned_by(identity) {
            Ok(())
        } else {
            Err(EventError::access_denied("only the host can manage this event"))
        }
    }
}

/// Event category enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventCategory {
    Wedding,
    Birthday,
    Festival,
    Graduation,
    BabyShower,
    Corporate,
    #[default]
    #[serde(other)]
    Other,
}

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Wedding => "wedding",
            EventCategory::Birthday => "birthday",
            EventCategory::Festival => "festival",
            EventCategory::Graduation => "graduation",
            EventCategory::BabyShower => "baby-shower",
            EventCategory::Corporate => "corporate",
            EventCategory::Other => "other",
        }
    }
}

impl From<&str> for EventCategory {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "wedding" => EventCategory::Wedding,
            "birthday" => EventCategory::Birthday,
            "festival" => EventCategory::Festival,
            "graduation" => EventCategory::Graduation,
            "baby-shower" | "baby_shower" => EventCategory::BabyShower,
            "corporate" => EventCategory::Corporate,
            _ => EventCategory::Other,
        }
    }
}

impl From<EventCategory> for String {
    fn from(category: EventCategory) -> Self {
        category.as_str().to_string()
    }
}

/// Publication state enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicationState {
    #[default]
    Draft,
    Published,
    Past,
}

impl PublicationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublicationState::Draft => "draft",
            PublicationState::Published => "published",
            PublicationState::Past => "past",
        }
    }
}

impl From<&str> for PublicationState {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "published" => PublicationState::Published,
            "past" => PublicationState::Past,
            _ => PublicationState::Draft,
        }
    }
}

impl From<PublicationState> for String {
    fn from(state: PublicationState) -> Self {
        state.as_str().to_string()
    }
}

/// One entry of an event's ordered social links. Platforms may repeat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLink {
    pub platform: String,
    pub url: String,
}

/// Read social links from their stored or submitted JSON form.
///
/// Accepts the ordered list form and the older object form keyed by
/// `<platform>_url`, e.g. `{"instagram_url": "..."}`.
pub fn social_links_from_value(value: &Value) -> Vec<SocialLink> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| serde_json::from_value::<SocialLink>(item.clone()).ok())
            .collect(),
        Value::Object(map) => map
            .iter()
            .filter_map(|(key, value)| {
                let platform = key.strip_suffix("_url")?;
                let url = value.as_str().filter(|url| !url.trim().is_empty())?;
                Some(SocialLink {
                    platform: capitalize(platform),
                    url: url.trim().to_string(),
                })
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Parse the `custom_social_links` column.
pub fn parse_social_links(raw: &str) -> Vec<SocialLink> {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => social_links_from_value(&value),
        Err(err) => {
            warn!(error = %err, "ignoring unreadable social links");
            Vec::new()
        }
    }
}

fn capitalize(platform: &str) -> String {
    let mut chars = platform.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn deserialize_social_links<'de, D>(deserializer: D) -> Result<Vec<SocialLink>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(social_links_from_value(&value))
}

/// Editable form of an event, with dates split into day and time fields.
///
/// Used both as the create/update payload and as the pre-filled form
/// returned when a host opens an event for editing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventDraft {
    pub event_name: String,
    pub event_type: EventCategory,
    pub host_names: Option<String>,
    pub description: Option<String>,
    /// `YYYY-MM-DD`
    pub start_date: String,
    /// `HH:MM`, noon when empty
    pub start_time: Option<String>,
    pub end_date: Option<String>,
    pub end_time: Option<String>,
    /// Offset of the form's clock from UTC in minutes
    pub utc_offset_minutes: i32,
    pub venue_name: Option<String>,
    pub venue_address: Option<String>,
    pub parking_notes: Option<String>,
    pub dress_code: Option<String>,
    pub cover_image_url: Option<String>,
    pub rsvp_enabled: bool,
    pub status: PublicationState,
    pub youtube_link: Option<String>,
    #[serde(deserialize_with = "deserialize_social_links")]
    pub custom_social_links: Vec<SocialLink>,
    pub google_photos_url: Option<String>,
    pub google_drive_url: Option<String>,
    pub sub_events: Vec<SubEventDraft>,
}

impl Default for EventDraft {
    fn default() -> Self {
        Self {
            event_name: String::new(),
            event_type: EventCategory::default(),
            host_names: None,
            description: None,
            start_date: String::new(),
            start_time: None,
            end_date: None,
            end_time: None,
            utc_offset_minutes: 0,
            venue_name: None,
            venue_address: None,
            parking_notes: None,
            dress_code: None,
            cover_image_url: None,
            rsvp_enabled: true,
            status: PublicationState::default(),
            youtube_link: None,
            custom_social_links: Vec::new(),
            google_photos_url: None,
            google_drive_url: None,
            sub_events: Vec::new(),
        }
    }
}

impl EventDraft {
    /// Build the edit form for an existing event as seen at `offset`.
    pub fn from_event(event: &Event, sub_events: &[SubEvent], offset: FixedOffset) -> Self {
        let (start_date, start_time) = split_local(event.start_date, offset);
        let (end_date, end_time) = match event.end_date {
            Some(end) => {
                let (date, time) = split_local(end, offset);
                (Some(date), Some(time))
            }
            None => (None, None),
        };

        Self {
            event_name: event.event_name.clone(),
            event_type: event.event_type,
            host_names: event.host_names.clone(),
            description: event.description.clone(),
            start_date,
            start_time: Some(start_time),
            end_date,
            end_time,
            utc_offset_minutes: offset.local_minus_utc() / 60,
            venue_name: event.venue_name.clone(),
            venue_address: event.venue_address.clone(),
            parking_notes: event.parking_notes.clone(),
            dress_code: event.dress_code.clone(),
            cover_image_url: event.cover_image_url.clone(),
            rsvp_enabled: event.rsvp_enabled,
            status: event.status,
            youtube_link: event.youtube_link.clone(),
            custom_social_links: event.custom_social_links.clone(),
            google_photos_url: event.google_photos_url.clone(),
            google_drive_url: event.google_drive_url.clone(),
            sub_events: sub_events
                .iter()
                .map(|sub_event| SubEventDraft::from_sub_event(sub_event, offset))
                .collect(),
        }
    }

    /// Validate the form and convert it into storable fields.
    pub fn resolve(&self) -> EventResult<(EventFields, Vec<SubEventFields>)> {
        let offset = utc_offset(self.utc_offset_minutes)?;

        let event_name = self.event_name.trim().to_string();
        Validator::required_text("Event name", &event_name, MAX_NAME_CHARS)?;

        if self.start_date.trim().is_empty() {
            return Err(EventError::validation("Start date is required"));
        }
        let start_date = combine_local(&self.start_date, self.start_time.as_deref(), offset)?;

        let end_date = match non_empty(self.end_date.clone()) {
            Some(date) => Some(combine_local(&date, self.end_time.as_deref(), offset)?),
            None => None,
        };
        if let Some(end) = end_date {
            if end < start_date {
                return Err(EventError::validation("End date cannot be before the start date"));
            }
        }

        let fields = EventFields {
            event_name,
            event_type: self.event_type,
            host_names: non_empty(self.host_names.clone()),
            description: non_empty(self.description.clone()),
            start_date,
            end_date,
            venue_name: non_empty(self.venue_name.clone()),
            venue_address: non_empty(self.venue_address.clone()),
            parking_notes: non_empty(self.parking_notes.clone()),
            dress_code: non_empty(self.dress_code.clone()),
            cover_image_url: non_empty(self.cover_image_url.clone()),
            rsvp_enabled: self.rsvp_enabled,
            status: self.status,
            youtube_link: non_empty(self.youtube_link.clone()),
            custom_social_links: self
                .custom_social_links
                .iter()
                .map(|link| SocialLink {
                    platform: link.platform.trim().to_string(),
                    url: link.url.trim().to_string(),
                })
                .filter(|link| !link.url.is_empty())
                .collect(),
            google_photos_url: non_empty(self.google_photos_url.clone()),
            google_drive_url: non_empty(self.google_drive_url.clone()),
        };
        fields.validate()?;

        let sub_events = self
            .sub_events
            .iter()
            .map(|draft| draft.resolve(offset))
            .collect::<EventResult<Vec<_>>>()?;

        Ok((fields, sub_events))
    }
}

/// Validated event columns written by create and update.
#[derive(Debug, Clone, PartialEq)]
pub struct EventFields {
    pub event_name: String,
    pub event_type: EventCategory,
    pub host_names: Option<String>,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub venue_name: Option<String>,
    pub venue_address: Option<String>,
    pub parking_notes: Option<String>,
    pub dress_code: Option<String>,
    pub cover_image_url: Option<String>,
    pub rsvp_enabled: bool,
    pub status: PublicationState,
    pub youtube_link: Option<String>,
    pub custom_social_links: Vec<SocialLink>,
    pub google_photos_url: Option<String>,
    pub google_drive_url: Option<String>,
}

impl EventFields {
    fn validate(&self) -> EventResult<()> {
        for (field, value) in [
            ("Host names", &self.host_names),
            ("Venue name", &self.venue_name),
            ("Venue address", &self.venue_address),
            ("Dress code", &self.dress_code),
        ] {
            Validator::optional_text(field, value.as_deref(), MAX_NAME_CHARS)?;
        }
        Validator::optional_text("Description", self.description.as_deref(), MAX_TEXT_CHARS)?;
        Validator::optional_text("Parking notes", self.parking_notes.as_deref(), MAX_TEXT_CHARS)?;

        Validator::http_url("Video link", self.youtube_link.as_deref())?;
        Validator::http_url("Photo album link", self.google_photos_url.as_deref())?;
        Validator::http_url("Drive link", self.google_drive_url.as_deref())?;

        if self.custom_social_links.len() > MAX_SOCIAL_LINKS {
            return Err(EventError::validation(format!(
                "At most {MAX_SOCIAL_LINKS} social links are allowed"
            )));
        }
        for link in &self.custom_social_links {
            Validator::required_text("Social link platform", &link.platform, 64)?;
            Validator::http_url("Social link", Some(&link.url))?;
        }

        Ok(())
    }

    /// JSON stored in the `custom_social_links` column.
    pub fn social_links_json(&self) -> EventResult<String> {
        Ok(serde_json::to_string(&self.custom_social_links)?)
    }
}

/// Everything needed to insert a new event.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub user_id: i64,
    pub public_id: String,
    pub slug: String,
    pub fields: EventFields,
    pub sub_events: Vec<SubEventFields>,
}
