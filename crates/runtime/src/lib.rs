use std::sync::Arc;

use anyhow::{Context, Result};
use dewana_auth::Authenticator;
use dewana_config::AppConfig;
use dewana_database::initialize_database;
use dewana_events::{EventServices, EventSettings, LocalCoverStore, Repositories};
use sqlx::SqlitePool;
use tracing::info;

pub mod telemetry {
    use anyhow::Result;
    use tracing::Level;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_max_level(Level::TRACE)
            .with_env_filter(env_filter)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

#[derive(Clone)]
pub struct BackendServices {
    pub db_pool: SqlitePool,
    pub authenticator: Authenticator,
    pub events: EventServices,
    pub settings: EventSettings,
}

impl BackendServices {
    pub async fn initialise(config: &AppConfig) -> Result<Self> {
        let settings = EventSettings::from_config(config)
            .context("invalid event configuration")?;

        let db_pool = initialize_database(&config.database)
            .await
            .context("failed to initialise database")?;
        let authenticator = Authenticator::new(db_pool.clone(), &config.auth);

        let covers = Arc::new(LocalCoverStore::new(
            &config.storage.cover_dir,
            config.storage.cover_url_prefix.clone(),
        ));
        let events = EventServices::new(
            Repositories::sqlite(db_pool.clone()),
            covers,
            settings.clone(),
        );

        info!(
            grace_window_seconds = settings.grace_window.as_duration().num_seconds(),
            cover_dir = %config.storage.cover_dir,
            "event services ready"
        );

        Ok(Self {
            db_pool,
            authenticator,
            events,
            settings,
        })
    }
}

pub async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(?error, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
