use axum::http::{header::AUTHORIZATION, HeaderMap};

use crate::error::{GatewayError, GatewayResult};

pub fn require_bearer(headers: &HeaderMap) -> GatewayResult<String> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| GatewayError::AuthenticationFailed("missing authorization header".into()))?;

    let mut parts = value.split_whitespace();
    let scheme = parts.next().unwrap_or("");
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return Err(GatewayError::AuthenticationFailed(
            "invalid authorization scheme".into(),
        ));
    }

    let token = parts.next().unwrap_or("");
    if token.is_empty() {
        return Err(GatewayError::AuthenticationFailed("missing bearer token".into()));
    }

    Ok(token.to_string())
}

/// Bearer token if the request carries a well-formed one.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers.get(AUTHORIZATION)?;
    require_bearer(headers).ok()
}
