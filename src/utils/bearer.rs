//! `Authorization: Bearer` header parsing.

use crate::error::ApiError;
use actix_web::{HttpRequest, http::header};

/// True when the request carries any `Authorization` header
pub fn has_authorization(req: &HttpRequest) -> bool {
    req.headers().contains_key(header::AUTHORIZATION)
}

/// Extract the bearer credential. The scheme is matched case-insensitively.
pub fn extract_bearer_token(req: &HttpRequest) -> Result<String, ApiError> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(ApiError::MissingCredentials)?;

    let (scheme, credential) = value
        .trim()
        .split_once(' ')
        .ok_or(ApiError::MissingCredentials)?;
    let credential = credential.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || credential.is_empty() {
        return Err(ApiError::MissingCredentials);
    }
    Ok(credential.to_string())
}
