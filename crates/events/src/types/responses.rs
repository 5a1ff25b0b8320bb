//! Composite values returned by the event services.

use serde::Serialize;

use crate::entities::{Event, Rsvp, RsvpStatus, SubEvent};
use crate::lifecycle::LifecycleStatus;
use crate::media::MediaHighlights;

/// Everything the public event page shows.
#[derive(Debug, Clone, Serialize)]
pub struct EventPage {
    #[serde(flatten)]
    pub event: Event,
    /// Ascending by date-time
    pub sub_events: Vec<SubEvent>,
    pub lifecycle_status: LifecycleStatus,
    pub media: MediaHighlights,
    pub map_link: Option<String>,
    pub share: ShareLink,
}

/// An event with its itinerary, as seen by its host.
#[derive(Debug, Clone, Serialize)]
pub struct EventDetails {
    #[serde(flatten)]
    pub event: Event,
    pub sub_events: Vec<SubEvent>,
}

/// Dashboard card.
#[derive(Debug, Clone, Serialize)]
pub struct EventSummary {
    #[serde(flatten)]
    pub event: Event,
    pub lifecycle_status: LifecycleStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareLink {
    pub url: String,
    pub title: String,
    pub text: String,
}

/// Responses to one event, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct GuestList {
    pub event_id: String,
    pub summary: GuestSummary,
    pub rsvps: Vec<Rsvp>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GuestSummary {
    pub responses: usize,
    pub attending: usize,
    pub maybe: usize,
    pub declined: usize,
    /// Head count across `yes` responses
    pub total_guests: u32,
}

impl GuestSummary {
    pub fn from_rsvps(rsvps: &[Rsvp]) -> Self {
        rsvps.iter().fold(Self::default(), |mut summary, rsvp| {
            summary.responses += 1;
            match rsvp.status {
                RsvpStatus::Yes => {
                    summary.attending += 1;
                    summary.total_guests += u32::from(rsvp.guest_count.unwrap_or(1));
                }
                RsvpStatus::Maybe => summary.maybe += 1,
                RsvpStatus::No => summary.declined += 1,
            }
            summary
        })
    }
}
