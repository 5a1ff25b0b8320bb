//! REST API endpoints for the gateway

pub mod auth;
pub mod events;
pub mod health;
pub mod notifications;
pub mod public;
pub mod util;

use axum::{routing::get, Router};

use crate::state::GatewayState;

/// Create all REST API routes
pub fn create_rest_routes(max_cover_bytes: u64) -> Router<GatewayState> {
    Router::new()
        .route("/health", get(health::health_check))
        .merge(auth::create_auth_routes())
        .merge(events::create_event_routes(max_cover_bytes))
        .merge(public::create_public_routes())
        .merge(notifications::create_notification_routes())
}
