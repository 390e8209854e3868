//! Bearer token records.

use chrono::{DateTime, Utc};
use paperclip::actix::Apiv2Schema;
use serde::{Deserialize, Serialize};

/// A stored bearer token. Also the body returned by the token endpoints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    pub token: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_active() -> bool {
    true
}

impl TokenRecord {
    /// A fresh active token created now
    pub fn new(token: impl Into<String>, is_admin: bool, description: Option<String>) -> Self {
        Self {
            token: token.into(),
            is_admin,
            created_at: Utc::now(),
            is_active: true,
            description,
        }
    }

    /// Short prefix safe to put in logs
    pub fn hint(&self) -> String {
        token_hint(&self.token)
    }
}

/// Request body for `POST /auth/tokens`
#[derive(Clone, Debug, Default, Serialize, Deserialize, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTokenRequest {
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub description: Option<String>,
}

const HINT_MAX_CHARS: usize = 8;

/// Log-safe token prefix: at most eight characters and never more than half
/// the token, always followed by an ellipsis.
pub fn token_hint(token: &str) -> String {
    let shown = HINT_MAX_CHARS.min(token.chars().count() / 2);
    let prefix: String = token.chars().take(shown).collect();
    format!("{prefix}…")
}
