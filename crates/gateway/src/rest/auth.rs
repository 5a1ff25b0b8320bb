//! Account and session endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use dewana_auth::{AuthSession, Identity};

use crate::error::GatewayResult;
use crate::state::GatewayState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserResponse,
    pub expires_at: String,
}

impl SessionResponse {
    pub fn new(session: AuthSession, identity: Identity) -> Self {
        Self {
            token: session.token,
            user: identity.into(),
            expires_at: session.expires_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl From<Identity> for UserResponse {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.public_id,
            email: identity.email,
            display_name: identity.display_name,
        }
    }
}

pub fn create_auth_routes() -> Router<GatewayState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created and signed in", body = SessionResponse),
        (status = 400, description = "Invalid email or password", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::error::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<GatewayState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> GatewayResult<(StatusCode, Json<SessionResponse>)> {
    let Json(payload) = payload?;
    let authenticator = state.authenticator();

    let identity = authenticator
        .register_with_password(
            &payload.email,
            &payload.password,
            payload.display_name.as_deref(),
        )
        .await?;
    let session = authenticator
        .login_with_password(&payload.email, &payload.password)
        .await?;

    info!(user = %identity.public_id, "account registered");
    Ok((StatusCode::CREATED, Json(SessionResponse::new(session, identity))))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = SessionResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<GatewayState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> GatewayResult<Json<SessionResponse>> {
    let Json(payload) = payload?;
    let authenticator = state.authenticator();

    let session = authenticator
        .login_with_password(&payload.email, &payload.password)
        .await?;
    let identity = authenticator.identity(session.user_id).await?;

    Ok(Json(SessionResponse::new(session, identity)))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
pub async fn me(
    State(state): State<GatewayState>,
    headers: HeaderMap,
) -> GatewayResult<Json<UserResponse>> {
    let identity = state.identity(&headers).await?;
    Ok(Json(identity.into()))
}
