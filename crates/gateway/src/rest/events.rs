//! Host endpoints: dashboard, event editing, covers and guest lists

use axum::{
    extract::{
        rejection::JsonRejection, DefaultBodyLimit, FromRequest, Multipart, Path, Query,
        Request, State,
    },
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use dewana_events::{
    CoverUpload, EventDetails, EventDraft, EventSummary, GuestList, ShareLink,
};

use crate::error::{GatewayError, GatewayResult};
use crate::state::GatewayState;

/// Room left for multipart framing and the event JSON next to the image.
const MULTIPART_OVERHEAD_BYTES: usize = 256 * 1024;

#[derive(Debug, Serialize, ToSchema)]
pub struct CoverResponse {
    pub cover_image_url: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(default)]
#[into_params(parameter_in = Query)]
pub struct EditFormQuery {
    /// Offset of the host's clock from UTC in minutes
    pub utc_offset_minutes: i32,
}

pub fn create_event_routes(max_cover_bytes: u64) -> Router<GatewayState> {
    let body_limit = usize::try_from(max_cover_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/api/events", get(list_hosted_events).post(create_event))
        .route("/api/events/attending", get(list_attending_events))
        .route(
            "/api/events/:event_id",
            get(get_event)
                .put(update_event)
                .delete(delete_event)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/api/events/:event_id/edit", get(edit_form))
        .route("/api/events/:event_id/rsvps", get(guest_list))
        .route(
            "/api/events/:event_id/cover",
            post(upload_cover).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/api/events/:event_id/share", get(share_link))
}

#[utoipa::path(
    get,
    path = "/api/events",
    tag = "Events",
    responses(
        (status = 200, description = "Events hosted by the caller, newest first"),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_hosted_events(
    State(state): State<GatewayState>,
    headers: HeaderMap,
) -> GatewayResult<Json<Vec<EventSummary>>> {
    let identity = state.identity(&headers).await?;
    let events = state.events().hosted_events(&identity, Utc::now()).await?;
    Ok(Json(events))
}

#[utoipa::path(
    get,
    path = "/api/events/attending",
    tag = "Events",
    responses(
        (status = 200, description = "Events the caller responded to, soonest first"),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_attending_events(
    State(state): State<GatewayState>,
    headers: HeaderMap,
) -> GatewayResult<Json<Vec<EventSummary>>> {
    let identity = state.identity(&headers).await?;
    let events = state.events().attending_events(&identity, Utc::now()).await?;
    Ok(Json(events))
}

#[utoipa::path(
    post,
    path = "/api/events",
    tag = "Events",
    request_body = Object,
    responses(
        (status = 201, description = "Event created"),
        (status = 400, description = "Invalid event form", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_event(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    payload: Result<Json<EventDraft>, JsonRejection>,
) -> GatewayResult<(StatusCode, Json<EventDetails>)> {
    let identity = state.identity(&headers).await?;
    let Json(draft) = payload?;
    let details = state.events().create_event(&identity, &draft).await?;
    Ok((StatusCode::CREATED, Json(details)))
}

#[utoipa::path(
    get,
    path = "/api/events/{event_id}",
    tag = "Events",
    params(("event_id" = String, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event with its itinerary"),
        (status = 403, description = "Caller is not the host", body = crate::error::ErrorResponse),
        (status = 404, description = "Event not found", body = crate::error::ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_event(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Path(event_id): Path<String>,
) -> GatewayResult<Json<EventDetails>> {
    let identity = state.identity(&headers).await?;
    let details = state.events().event_details(&identity, &event_id).await?;
    Ok(Json(details))
}

#[utoipa::path(
    get,
    path = "/api/events/{event_id}/edit",
    tag = "Events",
    params(
        ("event_id" = String, Path, description = "Event id"),
        EditFormQuery
    ),
    responses(
        (status = 200, description = "Pre-filled edit form"),
        (status = 403, description = "Caller is not the host", body = crate::error::ErrorResponse),
        (status = 404, description = "Event not found", body = crate::error::ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
pub async fn edit_form(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Path(event_id): Path<String>,
    Query(query): Query<EditFormQuery>,
) -> GatewayResult<Json<EventDraft>> {
    let identity = state.identity(&headers).await?;
    let draft = state
        .events()
        .load_for_edit(&identity, &event_id, query.utc_offset_minutes)
        .await?;
    Ok(Json(draft))
}

/// Save the edit form.
///
/// Accepts either a JSON event form or a multipart body with the form as
/// JSON in an `event` field and an optional `cover` image.
#[utoipa::path(
    put,
    path = "/api/events/{event_id}",
    tag = "Events",
    params(("event_id" = String, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event updated"),
        (status = 400, description = "Invalid event form", body = crate::error::ErrorResponse),
        (status = 403, description = "Caller is not the host", body = crate::error::ErrorResponse),
        (status = 404, description = "Event not found", body = crate::error::ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_event(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Path(event_id): Path<String>,
    request: Request,
) -> GatewayResult<Json<EventDetails>> {
    let identity = state.identity(&headers).await?;

    let (draft, cover) = if is_multipart(&headers) {
        let multipart = Multipart::from_request(request, &state).await?;
        let form = read_event_form(multipart).await?;
        let draft = form
            .draft
            .ok_or_else(|| GatewayError::InvalidRequest("missing event field".into()))?;
        (draft, form.cover)
    } else {
        let Json(draft) = Json::<EventDraft>::from_request(request, &state).await?;
        (draft, None)
    };

    let details = state
        .events()
        .update_event(&identity, &event_id, &draft, cover)
        .await?;
    Ok(Json(details))
}

#[utoipa::path(
    delete,
    path = "/api/events/{event_id}",
    tag = "Events",
    params(("event_id" = String, Path, description = "Event id")),
    responses(
        (status = 204, description = "Event and its responses deleted"),
        (status = 403, description = "Caller is not the host", body = crate::error::ErrorResponse),
        (status = 404, description = "Event not found", body = crate::error::ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_event(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Path(event_id): Path<String>,
) -> GatewayResult<StatusCode> {
    let identity = state.identity(&headers).await?;
    state.events().delete_event(&identity, &event_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/events/{event_id}/rsvps",
    tag = "Events",
    params(("event_id" = String, Path, description = "Event id")),
    responses(
        (status = 200, description = "Responses with a head count summary"),
        (status = 403, description = "Caller is not the host", body = crate::error::ErrorResponse),
        (status = 404, description = "Event not found", body = crate::error::ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
pub async fn guest_list(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Path(event_id): Path<String>,
) -> GatewayResult<Json<GuestList>> {
    let identity = state.identity(&headers).await?;
    let guests = state.events().guest_list(&identity, &event_id).await?;
    Ok(Json(guests))
}

#[utoipa::path(
    post,
    path = "/api/events/{event_id}/cover",
    tag = "Events",
    params(("event_id" = String, Path, description = "Event id")),
    responses(
        (status = 200, description = "Cover stored and attached", body = CoverResponse),
        (status = 400, description = "Missing or unsupported image", body = crate::error::ErrorResponse),
        (status = 403, description = "Caller is not the host", body = crate::error::ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
pub async fn upload_cover(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Path(event_id): Path<String>,
    multipart: Multipart,
) -> GatewayResult<Json<CoverResponse>> {
    let identity = state.identity(&headers).await?;
    let cover = read_event_form(multipart)
        .await?
        .cover
        .ok_or_else(|| GatewayError::InvalidRequest("missing cover file".into()))?;

    let cover_image_url = state
        .events()
        .upload_cover(&identity, &event_id, cover)
        .await?;
    Ok(Json(CoverResponse { cover_image_url }))
}

#[utoipa::path(
    get,
    path = "/api/events/{event_id}/share",
    tag = "Events",
    params(("event_id" = String, Path, description = "Event id")),
    responses(
        (status = 200, description = "Shareable link to the public page"),
        (status = 403, description = "Caller is not the host", body = crate::error::ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
pub async fn share_link(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Path(event_id): Path<String>,
) -> GatewayResult<Json<ShareLink>> {
    let identity = state.identity(&headers).await?;
    let details = state.events().event_details(&identity, &event_id).await?;
    Ok(Json(state.events().share_link(&details.event)))
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"))
}

#[derive(Default)]
struct EventForm {
    draft: Option<EventDraft>,
    cover: Option<CoverUpload>,
}

async fn read_event_form(mut multipart: Multipart) -> GatewayResult<EventForm> {
    let mut form = EventForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("event") => {
                let text = field.text().await?;
                let draft = serde_json::from_str(&text).map_err(|err| {
                    GatewayError::InvalidRequest(format!("Invalid event form: {err}"))
                })?;
                form.draft = Some(draft);
            }
            Some("cover") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field.bytes().await?;
                // browsers send an empty part when no file was picked
                if !bytes.is_empty() || !file_name.is_empty() {
                    form.cover = Some(CoverUpload {
                        file_name,
                        content_type,
                        bytes,
                    });
                }
            }
            _ => {}
        }
    }

    Ok(form)
}
