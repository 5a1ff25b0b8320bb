use std::time::Duration;

use dewana_config::AppConfig;

use crate::lifecycle::GraceWindow;
use crate::types::{EventError, EventResult};

/// Runtime knobs the event services read from configuration.
#[derive(Debug, Clone)]
pub struct EventSettings {
    pub grace_window: GraceWindow,
    pub status_refresh: Duration,
    /// Origin used for shareable links, without a trailing slash.
    pub public_base_url: String,
    pub max_cover_bytes: u64,
}

impl EventSettings {
    pub fn new(grace_window: GraceWindow, public_base_url: impl Into<String>) -> Self {
        Self {
            grace_window,
            status_refresh: Duration::from_secs(30),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            max_cover_bytes: 5 * 1024 * 1024,
        }
    }

    pub fn from_config(config: &AppConfig) -> EventResult<Self> {
        let grace = config
            .events
            .grace_window()
            .map_err(|err| EventError::configuration(format!("{err:#}")))?;
        let grace_window = GraceWindow::new(grace).ok_or_else(|| {
            EventError::configuration("events.live_grace_window_seconds is out of range")
        })?;

        Ok(Self {
            grace_window,
            status_refresh: config.events.status_refresh(),
            public_base_url: config.http.public_base_url.trim_end_matches('/').to_string(),
            max_cover_bytes: config.storage.max_cover_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_grace_window_is_a_configuration_error() {
        let config = AppConfig::default();
        assert!(matches!(
            EventSettings::from_config(&config),
            Err(EventError::Configuration { .. })
        ));
    }

    #[test]
    fn reads_events_and_http_sections() {
        let mut config = AppConfig::default();
        config.events.live_grace_window_seconds = Some(10_800);
        config.http.public_base_url = "https://dewana.example/".into();

        let settings = EventSettings::from_config(&config).unwrap();
        assert_eq!(settings.grace_window, GraceWindow::from_hours(3).unwrap());
        assert_eq!(settings.public_base_url, "https://dewana.example");
        assert_eq!(settings.status_refresh, Duration::from_secs(30));
    }
}
