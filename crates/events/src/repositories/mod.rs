//! Data access for events, RSVPs, views and notifications.
//!
//! Each concern is a narrow async trait with one method per query or
//! command. [`SqliteStore`] implements all of them over one pool and
//! [`InMemoryStore`] is the fake used by tests.

use std::sync::Arc;

use cuid2::CuidConstructor;
use once_cell::sync::Lazy;
use sqlx::SqlitePool;

pub mod cover_store;
pub mod event_repository;
pub mod memory;
pub mod notification_repository;
pub mod rsvp_repository;
pub mod view_repository;

pub use cover_store::{CoverStore, CoverUpload, LocalCoverStore};
pub use event_repository::EventRepository;
pub use memory::{InMemoryStore, ViewRecord};
pub use notification_repository::NotificationRepository;
pub use rsvp_repository::RsvpRepository;
pub use view_repository::ViewRepository;

static CUID: Lazy<CuidConstructor> = Lazy::new(CuidConstructor::new);

pub(crate) fn new_public_id() -> String {
    CUID.create_id()
}

/// SQLite-backed implementation of every repository trait.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// The repositories a service layer needs, as trait objects.
#[derive(Clone)]
pub struct Repositories {
    pub events: Arc<dyn EventRepository>,
    pub rsvps: Arc<dyn RsvpRepository>,
    pub views: Arc<dyn ViewRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
}

impl Repositories {
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: EventRepository + RsvpRepository + ViewRepository + NotificationRepository + 'static,
    {
        Self {
            events: store.clone(),
            rsvps: store.clone(),
            views: store.clone(),
            notifications: store,
        }
    }

    pub fn sqlite(pool: SqlitePool) -> Self {
        Self::from_store(Arc::new(SqliteStore::new(pool)))
    }
}
