use axum::{extract::State, http::HeaderMap, routing::get, Json, Router};

use dewana_events::Notification;

use crate::error::GatewayResult;
use crate::state::GatewayState;

pub fn create_notification_routes() -> Router<GatewayState> {
    Router::new().route("/api/notifications", get(list_notifications))
}

#[utoipa::path(
    get,
    path = "/api/notifications",
    tag = "Notifications",
    responses(
        (status = 200, description = "Notifications for the caller, newest first"),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_notifications(
    State(state): State<GatewayState>,
    headers: HeaderMap,
) -> GatewayResult<Json<Vec<Notification>>> {
    let identity = state.identity(&headers).await?;
    let notifications = state.notifications().list_for_user(&identity).await?;
    Ok(Json(notifications))
}
