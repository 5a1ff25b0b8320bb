//! Live lifecycle status over WebSocket

use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tracing::{debug, warn};

use dewana_events::{status_updates, EventSchedule, GraceWindow, LifecycleStatus};

use crate::error::GatewayResult;
use crate::state::GatewayState;

/// Frame pushed whenever the derived status changes.
#[derive(Debug, Serialize)]
pub struct StatusFrame {
    pub event_id: String,
    pub status: LifecycleStatus,
    pub checked_at: String,
}

/// Streams the event's status: the current value first, then every change.
/// The server closes the socket after `Completed`.
#[utoipa::path(
    get,
    path = "/api/e/{slug}/status/ws",
    tag = "WebSocket",
    params(("slug" = String, Path, description = "Event slug")),
    responses(
        (status = 101, description = "Switching protocols to a status stream"),
        (status = 404, description = "Event not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn status_websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<GatewayState>,
    Path(slug): Path<String>,
) -> GatewayResult<Response> {
    let event = state.events().event_by_slug(&slug).await?;
    let settings = state.settings();
    let grace = settings.grace_window;
    let period = settings.status_refresh;
    let schedule = event.schedule();
    let event_id = event.public_id;

    Ok(ws.on_upgrade(move |socket| stream_status(socket, event_id, schedule, grace, period)))
}

async fn stream_status(
    socket: WebSocket,
    event_id: String,
    schedule: EventSchedule,
    grace: GraceWindow,
    period: Duration,
) {
    let (mut sender, mut receiver) = socket.split();
    let updates = status_updates(schedule, grace, period, Utc::now);
    tokio::pin!(updates);

    loop {
        tokio::select! {
            update = updates.next() => {
                let Some(status) = update else {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                };
                let frame = StatusFrame {
                    event_id: event_id.clone(),
                    status,
                    checked_at: Utc::now().to_rfc3339(),
                };
                let json = match serde_json::to_string(&frame) {
                    Ok(json) => json,
                    Err(error) => {
                        warn!(%error, "failed to encode status frame");
                        break;
                    }
                };
                if sender.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    debug!(event = %event_id, "status stream closed");
}
