//! Validation utilities.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{EventError, EventResult};

static EMAIL_PATTERN: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$"));

/// Validation utilities
pub struct Validator;

impl Validator {
    /// Validate email format
    pub fn email(email: &str) -> EventResult<()> {
        if email.trim().is_empty() {
            return Err(EventError::validation("Email is required"));
        }

        if email.len() > 255 {
            return Err(EventError::validation("Email too long (max 255 characters)"));
        }

        let pattern = EMAIL_PATTERN
            .as_ref()
            .map_err(|err| EventError::internal(format!("email pattern failed to compile: {err}")))?;

        if !pattern.is_match(email) {
            return Err(EventError::validation("Invalid email format"));
        }

        Ok(())
    }

    /// Validate a required free-text field
    pub fn required_text(field: &str, value: &str, max_chars: usize) -> EventResult<()> {
        if value.trim().is_empty() {
            return Err(EventError::validation(format!("{field} cannot be empty")));
        }
        Self::optional_text(field, Some(value), max_chars)
    }

    pub fn optional_text(field: &str, value: Option<&str>, max_chars: usize) -> EventResult<()> {
        match value {
            Some(value) if value.chars().count() > max_chars => Err(EventError::validation(
                format!("{field} too long (max {max_chars} characters)"),
            )),
            _ => Ok(()),
        }
    }

    /// Validate an optional absolute http(s) link
    pub fn http_url(field: &str, value: Option<&str>) -> EventResult<()> {
        let Some(value) = value else {
            return Ok(());
        };

        match url::Url::parse(value) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
            _ => Err(EventError::validation(format!("{field} must be an http(s) link"))),
        }
    }
}
