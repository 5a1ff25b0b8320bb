//! Shared application state for the gateway

use std::path::PathBuf;

use axum::http::HeaderMap;
use tracing::debug;

use dewana_auth::{Authenticator, Identity};
use dewana_events::{EventService, EventServices, EventSettings, NotificationService, RsvpService};

use crate::error::GatewayResult;
use crate::rest::util::{bearer_token, require_bearer};

/// Directory of uploaded covers and the URL prefix it is served under.
#[derive(Debug, Clone)]
pub struct CoverMount {
    pub dir: PathBuf,
    pub url_prefix: String,
}

/// Shared application state containing all services
#[derive(Clone)]
pub struct GatewayState {
    authenticator: Authenticator,
    services: EventServices,
    covers: Option<CoverMount>,
}

impl GatewayState {
    pub fn new(authenticator: Authenticator, services: EventServices) -> Self {
        Self {
            authenticator,
            services,
            covers: None,
        }
    }

    /// Serve uploaded covers from `dir` under `url_prefix`.
    pub fn with_cover_mount(mut self, dir: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        self.covers = Some(CoverMount {
            dir: dir.into(),
            url_prefix: url_prefix.into(),
        });
        self
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    pub fn events(&self) -> &EventService {
        &self.services.events
    }

    pub fn rsvps(&self) -> &RsvpService {
        &self.services.rsvps
    }

    pub fn notifications(&self) -> &NotificationService {
        &self.services.notifications
    }

    pub fn settings(&self) -> &EventSettings {
        self.services.events.settings()
    }

    pub fn cover_mount(&self) -> Option<&CoverMount> {
        self.covers.as_ref()
    }

    /// The signed-in identity; fails without a valid bearer token.
    pub async fn identity(&self, headers: &HeaderMap) -> GatewayResult<Identity> {
        let token = require_bearer(headers)?;
        let (identity, _session) = self.authenticator.authenticate_token(&token).await?;
        Ok(identity)
    }

    /// The viewer behind a public request. Missing or stale tokens count as
    /// anonymous.
    pub async fn viewer(&self, headers: &HeaderMap) -> Option<Identity> {
        let token = bearer_token(headers)?;
        match self.authenticator.authenticate_token(&token).await {
            Ok((identity, _session)) => Some(identity),
            Err(error) => {
                debug!(%error, "ignoring unusable token on public route");
                None
            }
        }
    }
}
