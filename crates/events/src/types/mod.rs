//! Shared types for the events domain.

pub mod errors;
pub mod responses;

pub use errors::{EventError, EventResult};
pub use responses::{
    EventDetails, EventPage, EventSummary, GuestList, GuestSummary, ShareLink,
};
