//! Error types for the gateway layer

use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

use dewana_auth::AuthError;
use dewana_events::EventError;

/// Gateway error types
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("{0}")]
    AuthenticationFailed(String),

    #[error("{0}")]
    AuthorizationFailed(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InternalError(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::AuthenticationFailed(_) => StatusCode::UNAUTHORIZED,
            GatewayError::AuthorizationFailed(_) => StatusCode::FORBIDDEN,
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Conflict(_) => StatusCode::CONFLICT,
            GatewayError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Canonical reason of the status code
    pub error: String,
    pub message: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: status
                .canonical_reason()
                .unwrap_or(status.as_str())
                .to_string(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

impl From<EventError> for GatewayError {
    fn from(error: EventError) -> Self {
        let message = error.to_string();
        match error {
            EventError::EventNotFound { .. } => GatewayError::NotFound(message),
            EventError::AccessDenied { .. } => GatewayError::AuthorizationFailed(message),
            EventError::Unauthenticated => GatewayError::AuthenticationFailed(message),
            EventError::Validation { .. } => GatewayError::InvalidRequest(message),
            EventError::NotPublished
            | EventError::RsvpClosed
            | EventError::RsvpAlreadyExists
            | EventError::SubmissionInProgress
            | EventError::SlugTaken { .. } => GatewayError::Conflict(message),
            EventError::Database(_)
            | EventError::Storage { .. }
            | EventError::Configuration { .. }
            | EventError::Internal { .. } => {
                error!(error = %message, "event operation failed");
                GatewayError::InternalError(message)
            }
        }
    }
}

impl From<AuthError> for GatewayError {
    fn from(error: AuthError) -> Self {
        let message = error.to_string();
        match error {
            AuthError::InvalidCredentials
            | AuthError::SessionNotFound
            | AuthError::SessionExpired
            | AuthError::InvalidSession
            | AuthError::UserNotFound => GatewayError::AuthenticationFailed(message),
            AuthError::UserExists => GatewayError::Conflict(message),
            AuthError::InvalidInput(_) => GatewayError::InvalidRequest(message),
            AuthError::Database(_) | AuthError::PasswordHash(_) => {
                error!(error = %message, "auth operation failed");
                GatewayError::InternalError(message)
            }
        }
    }
}

impl From<JsonRejection> for GatewayError {
    fn from(rejection: JsonRejection) -> Self {
        GatewayError::InvalidRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for GatewayError {
    fn from(rejection: MultipartRejection) -> Self {
        GatewayError::InvalidRequest(rejection.body_text())
    }
}

impl From<MultipartError> for GatewayError {
    fn from(error: MultipartError) -> Self {
        GatewayError::InvalidRequest(format!("Invalid multipart body: {}", error.body_text()))
    }
}
