//! Business logic over the repository traits.

use std::sync::Arc;

pub mod event_service;
pub mod notification_service;
pub mod rsvp_service;
pub mod submission_guard;

pub use event_service::EventService;
pub use notification_service::NotificationService;
pub use rsvp_service::RsvpService;
pub use submission_guard::{SubmissionGuard, SubmissionPermit};

use crate::repositories::{CoverStore, Repositories};
use crate::settings::EventSettings;

/// The event services wired over one set of repositories.
#[derive(Clone)]
pub struct EventServices {
    pub events: EventService,
    pub rsvps: RsvpService,
    pub notifications: NotificationService,
}

impl EventServices {
    pub fn new(repos: Repositories, covers: Arc<dyn CoverStore>, settings: EventSettings) -> Self {
        let notifications = NotificationService::new(repos.notifications.clone());
        let rsvps = RsvpService::new(
            repos.rsvps.clone(),
            notifications.clone(),
            settings.grace_window,
        );
        let events = EventService::new(repos, covers, settings);
        Self {
            events,
            rsvps,
            notifications,
        }
    }
}
