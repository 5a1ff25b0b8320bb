//! Dewana Events Crate
//!
//! Event pages, guest responses and the live lifecycle status shown on them.
//!
//! - [`lifecycle`] derives `Upcoming`, `Live` or `Completed` from an event's
//!   schedule and streams changes over time.
//! - [`services::RsvpService`] runs the RSVP form workflow against the
//!   store's atomic create call.
//! - [`repositories`] holds the narrow storage traits with SQLite and
//!   in-memory implementations.

pub mod calendar;
pub mod entities;
pub mod lifecycle;
pub mod media;
pub mod repositories;
pub mod services;
pub mod settings;
pub mod types;
pub mod utils;

pub use entities::*;
pub use lifecycle::{derive_status, status_updates, EventSchedule, GraceWindow, LifecycleStatus};
pub use repositories::{
    CoverStore, CoverUpload, EventRepository, InMemoryStore, LocalCoverStore,
    NotificationRepository, Repositories, RsvpRepository, SqliteStore, ViewRepository,
};
pub use services::{
    EventService, EventServices, NotificationService, RsvpService, SubmissionGuard,
};
pub use settings::EventSettings;
pub use types::*;
