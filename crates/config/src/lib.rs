use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "dewana.toml",
    "config/dewana.toml",
    "crates/config/dewana.toml",
    "../dewana.toml",
    "../config/dewana.toml",
];

const MIN_STATUS_REFRESH_SECONDS: u64 = 5;
const MAX_STATUS_REFRESH_SECONDS: u64 = 300;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub events: EventsConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
    /// Origin used when building shareable event links.
    pub public_base_url: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 7070,
            public_base_url: "http://127.0.0.1:7070".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://dewana.db".to_string(),
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "AuthConfig::default_session_ttl")]
    pub session_ttl_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_seconds: Self::default_session_ttl(),
        }
    }
}

impl AuthConfig {
    const fn default_session_ttl() -> u64 {
        86_400
    }
}

/// Event lifecycle settings.
///
/// The live grace window for events without a declared end has no built-in
/// default and must be supplied by the deployment.
///
/// ```
/// use dewana_config::EventsConfig;
///
/// let events = EventsConfig::default();
/// assert!(events.live_grace_window_seconds.is_none());
/// assert!(events.grace_window().is_err());
/// assert_eq!(events.status_refresh_seconds, 30);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    #[serde(default)]
    pub live_grace_window_seconds: Option<u64>,
    #[serde(default = "EventsConfig::default_status_refresh")]
    pub status_refresh_seconds: u64,
}

impl EventsConfig {
    const fn default_status_refresh() -> u64 {
        30
    }

    pub fn grace_window(&self) -> anyhow::Result<Duration> {
        match self.live_grace_window_seconds {
            Some(0) => bail!("events.live_grace_window_seconds must be greater than zero"),
            Some(seconds) => Ok(Duration::from_secs(seconds)),
            None => bail!(
                "events.live_grace_window_seconds is required (set it in dewana.toml or DEWANA__EVENTS__LIVE_GRACE_WINDOW_SECONDS)"
            ),
        }
    }

    pub fn status_refresh(&self) -> Duration {
        Duration::from_secs(
            self.status_refresh_seconds
                .clamp(MIN_STATUS_REFRESH_SECONDS, MAX_STATUS_REFRESH_SECONDS),
        )
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            live_grace_window_seconds: None,
            status_refresh_seconds: Self::default_status_refresh(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory cover images are written to.
    pub cover_dir: String,
    /// Path prefix covers are served under.
    pub cover_url_prefix: String,
    pub max_cover_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            cover_dir: "data/covers".to_string(),
            cover_url_prefix: "/covers".to_string(),
            max_cover_bytes: 5 * 1024 * 1024,
        }
    }
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// Fails when the live grace window is not configured.
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let session_ttl_i64 = i64::try_from(defaults.auth.session_ttl_seconds).unwrap_or(i64::MAX);
    let max_cover_i64 = i64::try_from(defaults.storage.max_cover_bytes).unwrap_or(i64::MAX);

    let mut builder = config::Config::builder()
        .set_default("http.address", defaults.http.address.clone())?
        .set_default("http.port", i64::from(defaults.http.port))?
        .set_default("http.public_base_url", defaults.http.public_base_url.clone())?
        .set_default("database.url", defaults.database.url.clone())?
        .set_default(
            "database.max_connections",
            i64::from(defaults.database.max_connections),
        )?
        .set_default("auth.session_ttl_seconds", session_ttl_i64)?
        .set_default(
            "events.status_refresh_seconds",
            i64::try_from(defaults.events.status_refresh_seconds).unwrap_or(30),
        )?
        .set_default("storage.cover_dir", defaults.storage.cover_dir.clone())?
        .set_default(
            "storage.cover_url_prefix",
            defaults.storage.cover_url_prefix.clone(),
        )?
        .set_default("storage.max_cover_bytes", max_cover_i64)?;

    let environment_overrides = config::Environment::with_prefix("DEWANA").separator("__");

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("DEWANA_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via DEWANA_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    config.events.grace_window().context("invalid events configuration")?;

    debug!(?config, "loaded backend configuration");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_grace_window_is_rejected() {
        let events = EventsConfig {
            live_grace_window_seconds: Some(0),
            ..EventsConfig::default()
        };
        assert!(events.grace_window().is_err());
    }

    #[test]
    fn status_refresh_is_bounded() {
        let mut events = EventsConfig::default();
        events.status_refresh_seconds = 1;
        assert_eq!(events.status_refresh(), Duration::from_secs(5));
        events.status_refresh_seconds = 3_600;
        assert_eq!(events.status_refresh(), Duration::from_secs(300));
    }
}
