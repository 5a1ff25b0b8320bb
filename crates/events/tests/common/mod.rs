#![allow(dead_code)]

use std::sync::Arc;

use dewana_auth::{Authenticator, Identity};
use dewana_config::{AuthConfig, DatabaseConfig};
use dewana_events::{
    EventDraft, EventServices, EventSettings, GraceWindow, InMemoryStore, LocalCoverStore,
    PublicationState, Repositories, SqliteStore, SubEventDraft,
};
use sqlx::SqlitePool;
use tempfile::TempDir;

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

pub fn grace() -> GraceWindow {
    GraceWindow::from_hours(3).expect("three hours is a valid grace window")
}

pub fn settings() -> EventSettings {
    EventSettings::new(grace(), "https://dewana.test/")
}

pub fn identity(user_id: i64, email: Option<&str>, name: Option<&str>) -> Identity {
    Identity {
        user_id,
        public_id: format!("user-{user_id}"),
        email: email.map(str::to_owned),
        display_name: name.map(str::to_owned),
    }
}

pub fn draft(name: &str, status: PublicationState) -> EventDraft {
    EventDraft {
        event_name: name.into(),
        start_date: "2030-06-01".into(),
        start_time: Some("18:00".into()),
        venue_name: Some("Lotus Hall".into()),
        venue_address: Some("12 Lake Road".into()),
        status,
        ..EventDraft::default()
    }
}

pub fn sub_event(name: &str, date: &str, time: &str) -> SubEventDraft {
    SubEventDraft {
        id: None,
        name: name.into(),
        date: date.into(),
        time: Some(time.into()),
        location_name: None,
    }
}

pub struct MemoryHarness {
    pub store: Arc<InMemoryStore>,
    pub services: EventServices,
    _covers: TempDir,
}

impl MemoryHarness {
    pub fn new() -> TestResult<Self> {
        let store = Arc::new(InMemoryStore::new());
        let covers = TempDir::new()?;
        let services = EventServices::new(
            Repositories::from_store(store.clone()),
            Arc::new(LocalCoverStore::new(covers.path(), "/covers")),
            settings(),
        );
        Ok(Self {
            store,
            services,
            _covers: covers,
        })
    }
}

pub struct SqliteHarness {
    pub pool: SqlitePool,
    pub store: SqliteStore,
    pub services: EventServices,
    pub authenticator: Authenticator,
    _dir: TempDir,
}

impl SqliteHarness {
    pub async fn new() -> TestResult<Self> {
        let dir = TempDir::new()?;
        let database = DatabaseConfig {
            url: format!("sqlite://{}", dir.path().join("events.sqlite").display()),
            max_connections: 5,
        };
        let pool = dewana_database::initialize_database(&database).await?;
        let store = SqliteStore::new(pool.clone());
        let services = EventServices::new(
            Repositories::from_store(Arc::new(store.clone())),
            Arc::new(LocalCoverStore::new(dir.path().join("covers"), "/covers")),
            settings(),
        );
        let authenticator = Authenticator::new(pool.clone(), &AuthConfig::default());

        Ok(Self {
            pool,
            store,
            services,
            authenticator,
            _dir: dir,
        })
    }

    pub async fn register(&self, email: &str, name: &str) -> TestResult<Identity> {
        Ok(self
            .authenticator
            .register_with_password(email, "s3cret!", Some(name))
            .await?)
    }
}
