//! Guest-facing endpoints keyed by the event slug

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use dewana_events::{EventPage, LifecycleStatus, RsvpForm, RsvpSession};

use crate::error::GatewayResult;
use crate::state::GatewayState;
use crate::websocket::status_websocket_handler;

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    /// `Upcoming`, `Live` or `Completed`
    #[schema(value_type = String)]
    pub status: LifecycleStatus,
    pub starts_at: String,
    /// Last instant the event counts as live
    pub closes_at: String,
    pub checked_at: String,
}

pub fn create_public_routes() -> Router<GatewayState> {
    Router::new()
        .route("/api/e/:slug", get(event_page))
        .route("/api/e/:slug/status", get(event_status))
        .route("/api/e/:slug/status/ws", get(status_websocket_handler))
        .route("/api/e/:slug/rsvp", get(rsvp_lookup).post(submit_rsvp))
}

#[utoipa::path(
    get,
    path = "/api/e/{slug}",
    tag = "Public",
    params(("slug" = String, Path, description = "Event slug")),
    responses(
        (status = 200, description = "Public event page"),
        (status = 404, description = "Event not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn event_page(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
) -> GatewayResult<Json<EventPage>> {
    let page = state.events().page_by_slug(&slug, Utc::now()).await?;
    let viewer = state.viewer(&headers).await;
    state.events().record_view(&page.event, viewer.as_ref()).await;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/e/{slug}/status",
    tag = "Public",
    params(("slug" = String, Path, description = "Event slug")),
    responses(
        (status = 200, description = "Lifecycle status right now", body = StatusResponse),
        (status = 404, description = "Event not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn event_status(
    State(state): State<GatewayState>,
    Path(slug): Path<String>,
) -> GatewayResult<Json<StatusResponse>> {
    let event = state.events().event_by_slug(&slug).await?;
    let now = Utc::now();
    let schedule = event.schedule();

    Ok(Json(StatusResponse {
        status: state.events().status_at(&event, now),
        starts_at: schedule.start.to_rfc3339(),
        closes_at: schedule.closes_at(state.settings().grace_window).to_rfc3339(),
        checked_at: now.to_rfc3339(),
    }))
}

/// The RSVP form for the caller, already confirmed when their email has
/// responded before.
#[utoipa::path(
    get,
    path = "/api/e/{slug}/rsvp",
    tag = "Public",
    params(("slug" = String, Path, description = "Event slug")),
    responses(
        (status = 200, description = "RSVP form state"),
        (status = 404, description = "Event not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn rsvp_lookup(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
) -> GatewayResult<Json<RsvpSession>> {
    let event = state.events().event_by_slug(&slug).await?;
    let viewer = state.viewer(&headers).await;
    let session = state.rsvps().open_session(&event, viewer.as_ref()).await?;
    Ok(Json(session))
}

#[utoipa::path(
    post,
    path = "/api/e/{slug}/rsvp",
    tag = "Public",
    params(("slug" = String, Path, description = "Event slug")),
    request_body = Object,
    responses(
        (status = 200, description = "Response recorded or already on file"),
        (status = 400, description = "Invalid form", body = crate::error::ErrorResponse),
        (status = 404, description = "Event not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Event not accepting responses, or a response already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn submit_rsvp(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
    payload: Result<Json<RsvpForm>, JsonRejection>,
) -> GatewayResult<Json<RsvpSession>> {
    let Json(form) = payload?;
    let event = state.events().event_by_slug(&slug).await?;
    let viewer = state.viewer(&headers).await;

    let mut session = RsvpSession::new(form);
    state
        .rsvps()
        .submit(&mut session, &event, viewer.as_ref())
        .await?;
    Ok(Json(session))
}
