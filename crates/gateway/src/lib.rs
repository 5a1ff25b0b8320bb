//! # Dewana Gateway Crate
//!
//! HTTP and WebSocket surface of the Dewana backend. Routes authenticate the
//! caller from a bearer token, hand the resulting identity to the event
//! services and translate their errors into JSON responses.
//!
//! - **REST**: accounts, host dashboard, public event pages and RSVPs
//! - **WebSocket**: live lifecycle status of an event
//! - **Static**: uploaded cover images

pub mod error;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod websocket;

pub use error::{ErrorResponse, GatewayError, GatewayResult};
pub use state::{CoverMount, GatewayState};

use axum::{middleware as axum_middleware, Router};
use tower_http::services::ServeDir;
use tracing::warn;

/// Create the main application router with all routes
pub fn build_router(state: GatewayState) -> Router {
    let max_cover_bytes = state.settings().max_cover_bytes;
    let covers = state.cover_mount().cloned();

    let mut router = rest::create_rest_routes(max_cover_bytes).with_state(state);

    if let Some(mount) = covers {
        let prefix = format!("/{}", mount.url_prefix.trim_matches('/'));
        if prefix == "/" {
            warn!("cover url prefix is empty, covers are not served");
        } else {
            router = router.nest_service(&prefix, ServeDir::new(mount.dir));
        }
    }

    #[cfg(debug_assertions)]
    {
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        router = router
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs::ApiDoc::openapi()));
    }

    router
        .layer(middleware::cors_layer())
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
}

#[cfg(debug_assertions)]
mod docs {
    use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
    use utoipa::{Modify, OpenApi};

    use crate::{rest, websocket};

    #[derive(OpenApi)]
    #[openapi(
        paths(
            rest::health::health_check,
            rest::auth::register,
            rest::auth::login,
            rest::auth::me,
            rest::events::list_hosted_events,
            rest::events::list_attending_events,
            rest::events::create_event,
            rest::events::get_event,
            rest::events::edit_form,
            rest::events::update_event,
            rest::events::delete_event,
            rest::events::guest_list,
            rest::events::upload_cover,
            rest::events::share_link,
            rest::public::event_page,
            rest::public::event_status,
            rest::public::rsvp_lookup,
            rest::public::submit_rsvp,
            rest::notifications::list_notifications,
            websocket::status_websocket_handler,
        ),
        components(
            schemas(
                crate::error::ErrorResponse,
                rest::health::HealthResponse,
                rest::auth::RegisterRequest,
                rest::auth::LoginRequest,
                rest::auth::SessionResponse,
                rest::auth::UserResponse,
                rest::events::CoverResponse,
                rest::public::StatusResponse,
            )
        ),
        tags(
            (name = "Health", description = "Service health endpoints"),
            (name = "Auth", description = "Accounts and sessions"),
            (name = "Events", description = "Host dashboard and event editing"),
            (name = "Public", description = "Public event pages and RSVPs"),
            (name = "Notifications", description = "User notifications"),
            (name = "WebSocket", description = "Live event status"),
        ),
        modifiers(&SecurityAddon)
    )]
    pub struct ApiDoc;

    struct SecurityAddon;

    impl Modify for SecurityAddon {
        fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
            let components = openapi.components.get_or_insert_with(Default::default);
            components.add_security_scheme(
                "bearerAuth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}
