//! Admin token management handlers.

use crate::{
    error::ApiError,
    models::{AuthEventOutcome, AuthEventType, CreateTokenRequest, MessageResponse, TokenRecord, token_hint},
    services::{AuditContext, TokenStore, require_admin},
};
use actix_web::{Error, HttpRequest, Result, web};
use paperclip::actix::api_v2_operation;

/// List active tokens (admin only)
#[api_v2_operation(
    summary = "List Tokens",
    description = "Returns every active bearer token, oldest first.",
    tags("Authentication"),
    responses(
        (status = 200, description = "Active tokens"),
        (status = 401, description = "Invalid or expired token"),
        (status = 403, description = "Admin privileges required")
    )
)]
pub async fn list_tokens(
    req: HttpRequest,
    store: web::Data<TokenStore>,
) -> Result<web::Json<Vec<TokenRecord>>, Error> {
    require_admin(&req, &store)?;
    Ok(web::Json(store.list_active()))
}

/// Create a token (admin only)
///
/// The body is read raw and parsed only after the caller is known to be an
/// admin, so anonymous and non-admin callers never learn about body errors.
#[api_v2_operation(
    summary = "Create Token",
    description = "Issues a new random bearer token. Body: `{\"isAdmin\": bool, \"description\": string?}`; an empty body creates a non-admin token. Set isAdmin to grant token management rights.",
    tags("Authentication"),
    responses(
        (status = 200, description = "Created token", body = TokenRecord),
        (status = 401, description = "Invalid or expired token"),
        (status = 403, description = "Admin privileges required"),
        (status = 422, description = "Invalid request body")
    )
)]
pub async fn create_token(
    req: HttpRequest,
    store: web::Data<TokenStore>,
    body: web::Bytes,
) -> Result<web::Json<TokenRecord>, Error> {
    let admin = require_admin(&req, &store)?;
    let request = parse_create_request(&body)?;
    let record = store.create_token(&request).map_err(ApiError::from)?;

    AuditContext::from_request(&req)
        .event(AuthEventType::TokenCreated, AuthEventOutcome::Success)
        .with_token_hint(Some(record.hint()))
        .with_context(Some(format!(
            "issued_by={} is_admin={}",
            admin.hint(),
            record.is_admin
        )))
        .log();

    Ok(web::Json(record))
}

/// An empty body means all defaults
fn parse_create_request(body: &[u8]) -> Result<CreateTokenRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(CreateTokenRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::InvalidBody(e.to_string()))
}

/// Revoke a token (admin only)
#[api_v2_operation(
    summary = "Delete Token",
    description = "Revokes a token. Revoked tokens stop authenticating immediately.",
    tags("Authentication"),
    responses(
        (status = 200, description = "Token revoked", body = MessageResponse),
        (status = 401, description = "Invalid or expired token"),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "Token not found")
    )
)]
pub async fn delete_token(
    req: HttpRequest,
    store: web::Data<TokenStore>,
    path: web::Path<String>,
) -> Result<web::Json<MessageResponse>, Error> {
    let admin = require_admin(&req, &store)?;
    let token = path.into_inner();

    if !store.revoke(&token).map_err(ApiError::from)? {
        return Err(ApiError::TokenNotFound.into());
    }

    AuditContext::from_request(&req)
        .event(AuthEventType::TokenRevoked, AuthEventOutcome::Success)
        .with_token_hint(Some(token_hint(&token)))
        .with_context(Some(format!("revoked_by={}", admin.hint())))
        .log();

    Ok(web::Json(MessageResponse {
        message: "Token deleted successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_create_request() {
        let request = parse_create_request(b"").unwrap();
        assert!(!request.is_admin);

        let request = parse_create_request(br#"{"isAdmin": true}"#).unwrap();
        assert!(request.is_admin);

        assert!(matches!(
            parse_create_request(b"{not json"),
            Err(ApiError::InvalidBody(_))
        ));
        assert!(matches!(
            parse_create_request(br#"{"isAdmin": "yes"}"#),
            Err(ApiError::InvalidBody(_))
        ));
    }
}
