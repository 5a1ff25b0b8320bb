//! Error types for the events domain.

use thiserror::Error;

/// Result type alias for event operations
pub type EventResult<T> = Result<T, EventError>;

/// Main error type for events, RSVPs and notifications
#[derive(Debug, Error)]
pub enum EventError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Event Not Found")]
    EventNotFound { id: String },

    #[error("Event not yet published.")]
    NotPublished,

    #[error("RSVPs are currently closed for this event.")]
    RsvpClosed,

    #[error("A response from this guest has already been recorded for this event.")]
    RsvpAlreadyExists,

    #[error("A response for this guest is already being submitted.")]
    SubmissionInProgress,

    #[error("Slug already taken: {slug}")]
    SlugTaken { slug: String },

    #[error("{message}")]
    Validation { message: String },

    #[error("Access denied: {reason}")]
    AccessDenied { reason: String },

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl EventError {
    pub fn event_not_found(id: impl Into<String>) -> Self {
        Self::EventNotFound { id: id.into() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn access_denied(reason: impl Into<String>) -> Self {
        Self::AccessDenied {
            reason: reason.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Errors detected before any store call was made.
    pub fn is_local_rejection(&self) -> bool {
        matches!(
            self,
            Self::NotPublished
                | Self::RsvpClosed
                | Self::Validation { .. }
                | Self::SubmissionInProgress
                | Self::Unauthenticated
        )
    }
}

impl From<serde_json::Error> for EventError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal {
            message: format!("JSON serialization error: {err}"),
        }
    }
}

impl From<chrono::ParseError> for EventError {
    fn from(err: chrono::ParseError) -> Self {
        Self::Validation {
            message: format!("Date parsing error: {err}"),
        }
    }
}

impl From<std::io::Error> for EventError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage {
            message: err.to_string(),
        }
    }
}
