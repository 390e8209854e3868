//! Bearer-token authentication and authorization.

use crate::{
    error::ApiError,
    models::{AuthAuditEvent, AuthEventOutcome, AuthEventType, TokenRecord, token_hint},
    services::{SuspiciousActivityTracker, TokenStore},
    utils::{extract_bearer_token, extract_client_ip, extract_request_id, extract_user_agent},
};
use actix_web::{HttpRequest, web};

/// Request attributes recorded on every audit event
pub struct AuditContext {
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub method: String,
    pub endpoint: String,
    pub request_id: Option<String>,
}

impl AuditContext {
    pub fn from_request(req: &HttpRequest) -> Self {
        Self {
            ip_address: extract_client_ip(req),
            user_agent: extract_user_agent(req),
            method: req.method().to_string(),
            endpoint: req.path().to_string(),
            request_id: extract_request_id(req),
        }
    }

    pub fn event(&self, event_type: AuthEventType, outcome: AuthEventOutcome) -> AuthAuditEvent {
        AuthAuditEvent::new(
            event_type,
            outcome,
            self.ip_address.clone(),
            self.method.clone(),
            self.endpoint.clone(),
        )
        .with_user_agent(self.user_agent.clone())
        .with_request_id(self.request_id.clone())
    }
}

/// Resolve the caller's bearer token to an active record.
///
/// Missing or malformed credentials and unknown or revoked tokens are audited
/// and counted against the client IP.
pub fn authenticate(req: &HttpRequest, store: &TokenStore) -> Result<TokenRecord, ApiError> {
    let context = AuditContext::from_request(req);

    let token = match extract_bearer_token(req) {
        Ok(token) => token,
        Err(err) => {
            context
                .event(AuthEventType::MissingCredentials, AuthEventOutcome::Failure)
                .log();
            record_failure(req, &context);
            return Err(err);
        }
    };

    match store.get_active(&token) {
        Some(record) => {
            context
                .event(AuthEventType::TokenValidationSuccess, AuthEventOutcome::Success)
                .with_token_hint(Some(record.hint()))
                .log();
            Ok(record)
        }
        None => {
            context
                .event(AuthEventType::TokenValidationFailure, AuthEventOutcome::Failure)
                .with_token_hint(Some(token_hint(&token)))
                .log();
            record_failure(req, &context);
            Err(ApiError::InvalidToken)
        }
    }
}

/// [`authenticate`], then require the admin flag
pub fn require_admin(req: &HttpRequest, store: &TokenStore) -> Result<TokenRecord, ApiError> {
    let record = authenticate(req, store)?;
    if record.is_admin {
        return Ok(record);
    }

    AuditContext::from_request(req)
        .event(AuthEventType::AdminCheckFailure, AuthEventOutcome::Failure)
        .with_token_hint(Some(record.hint()))
        .log();
    Err(ApiError::AdminRequired)
}

fn record_failure(req: &HttpRequest, context: &AuditContext) {
    let Some(tracker) = req.app_data::<web::Data<SuspiciousActivityTracker>>() else {
        return;
    };
    if tracker.record_failure(&context.ip_address) {
        context
            .event(AuthEventType::SuspiciousActivity, AuthEventOutcome::Failure)
            .with_context(Some("repeated bearer token failures".to_string()))
            .log();
    }
}
