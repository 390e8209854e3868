//! Response models for the service-level endpoints.

use paperclip::actix::Apiv2Schema;
use serde::{Deserialize, Serialize};

pub const SERVICE_NAME: &str = "Image Moderation API";

/// Response model for the root endpoint
#[derive(Clone, Debug, Serialize, Deserialize, Apiv2Schema)]
pub struct ServiceInfo {
    pub message: String,
    pub version: String,
}

impl ServiceInfo {
    pub fn current() -> Self {
        Self {
            message: SERVICE_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Response model for the health check endpoint
#[derive(Clone, Debug, Serialize, Deserialize, Apiv2Schema)]
pub struct HealthResponse {
    pub status: String,
}

/// Plain acknowledgement body
#[derive(Clone, Debug, Serialize, Deserialize, Apiv2Schema)]
pub struct MessageResponse {
    pub message: String,
}

/// Build metadata embedded at compile time
pub struct BuildInfo;

impl BuildInfo {
    pub fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    pub fn commit() -> &'static str {
        option_env!("VERGEN_GIT_SHA").unwrap_or("unknown")
    }

    pub fn build_time() -> &'static str {
        option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown")
    }
}
