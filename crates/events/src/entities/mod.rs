//! Domain entities for events.

pub mod event;
pub mod notification;
pub mod rsvp;
pub mod sub_event;

pub use event::{
    parse_social_links, social_links_from_value, Event, EventCategory, EventDraft, EventFields,
    NewEvent, PublicationState, SocialLink,
};
pub use notification::{NewNotification, Notification};
pub use rsvp::{
    Rsvp, RsvpForm, RsvpFormState, RsvpSession, RsvpStatus, RsvpSubmission, MAX_GUEST_COUNT,
    MIN_GUEST_COUNT,
};
pub use sub_event::{sort_sub_events, SubEvent, SubEventDraft, SubEventFields};
