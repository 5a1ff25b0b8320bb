use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::types::EventResult;
use crate::utils::{combine_local, non_empty, split_local, Validator};

/// A scheduled item within an event's itinerary.
#[derive(Debug, Clone, Serialize)]
pub struct SubEvent {
    #[serde(skip)]
    pub id: i64,
    #[serde(rename = "id")]
    pub public_id: String,
    #[serde(skip)]
    pub event_id: i64,
    pub name: String,
    pub date_time: DateTime<Utc>,
    pub location_name: Option<String>,
}

/// Itinerary order: ascending by date-time, insertion order on ties.
pub fn sort_sub_events(sub_events: &mut [SubEvent]) {
    sub_events.sort_by(|a, b| a.date_time.cmp(&b.date_time).then(a.id.cmp(&b.id)));
}

/// Sub-event row of the event edit form.
///
/// Rows carrying an `id` update that sub-event; rows without one are new.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubEventDraft {
    pub id: Option<String>,
    pub name: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`, noon when empty
    pub time: Option<String>,
    pub location_name: Option<String>,
}

impl SubEventDraft {
    pub fn from_sub_event(sub_event: &SubEvent, offset: FixedOffset) -> Self {
        let (date, time) = split_local(sub_event.date_time, offset);
        Self {
            id: Some(sub_event.public_id.clone()),
            name: sub_event.name.clone(),
            date,
            time: Some(time),
            location_name: sub_event.location_name.clone(),
        }
    }

    pub fn resolve(&self, offset: FixedOffset) -> EventResult<SubEventFields> {
        let name = self.name.trim().to_string();
        Validator::required_text("Sub-event name", &name, 255)?;
        let location_name = non_empty(self.location_name.clone());
        Validator::optional_text("Sub-event location", location_name.as_deref(), 255)?;

        Ok(SubEventFields {
            public_id: non_empty(self.id.clone()),
            name,
            date_time: combine_local(&self.date, self.time.as_deref(), offset)?,
            location_name,
        })
    }
}

/// Validated sub-event columns; `public_id` is set for existing rows.
#[derive(Debug, Clone, PartialEq)]
pub struct SubEventFields {
    pub public_id: Option<String>,
    pub name: String,
    pub date_time: DateTime<Utc>,
    pub location_name: Option<String>,
}
