//! Audit logging data structures and types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Types of authentication events for audit logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthEventType {
    MissingCredentials,
    TokenValidationSuccess,
    TokenValidationFailure,
    AdminCheckFailure,
    TokenCreated,
    TokenRevoked,
    SuspiciousActivity,
    RateLimitExceeded,
}

/// Outcomes of authentication events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthEventOutcome {
    Success,
    Failure,
}

/// Structured audit log entry for authentication events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthAuditEvent {
    pub event_type: AuthEventType,
    pub outcome: AuthEventOutcome,
    pub timestamp: DateTime<Utc>,
    pub ip_address: String,
    pub user_agent: Option<String>,
    /// Truncated token, never the full credential
    pub token_hint: Option<String>,
    pub method: String,
    pub endpoint: String,
    pub request_id: Option<String>,
    pub additional_context: Option<String>,
}

impl AuthAuditEvent {
    pub fn new(
        event_type: AuthEventType,
        outcome: AuthEventOutcome,
        ip_address: String,
        method: String,
        endpoint: String,
    ) -> Self {
        Self {
            event_type,
            outcome,
            timestamp: Utc::now(),
            ip_address,
            user_agent: None,
            token_hint: None,
            method,
            endpoint,
            request_id: None,
            additional_context: None,
        }
    }

    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn with_token_hint(mut self, token_hint: Option<String>) -> Self {
        self.token_hint = token_hint;
        self
    }

    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }

    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.additional_context = context;
        self
    }

    /// Emit the event on the `auth_audit` target. Failures log at warn level.
    pub fn log(&self) {
        match self.outcome {
            AuthEventOutcome::Success => info!(
                target: "auth_audit",
                event_type = ?self.event_type,
                outcome = ?self.outcome,
                timestamp = %self.timestamp,
                ip_address = %self.ip_address,
                user_agent = ?self.user_agent,
                token_hint = ?self.token_hint,
                method = %self.method,
                endpoint = %self.endpoint,
                request_id = ?self.request_id,
                additional_context = ?self.additional_context,
                "Authentication audit event"
            ),
            AuthEventOutcome::Failure => warn!(
                target: "auth_audit",
                event_type = ?self.event_type,
                outcome = ?self.outcome,
                timestamp = %self.timestamp,
                ip_address = %self.ip_address,
                user_agent = ?self.user_agent,
                token_hint = ?self.token_hint,
                method = %self.method,
                endpoint = %self.endpoint,
                request_id = ?self.request_id,
                additional_context = ?self.additional_context,
                "Authentication audit event"
            ),
        }
    }
}
