//! HTTP server configuration.

use super::{env_or, env_string};
use std::env;

/// Output format for the tracing subscriber
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Listener, CORS and logging settings
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    /// `*` allows any origin
    pub cors_allowed_origins: Vec<String>,
    pub log_format: LogFormat,
    pub workers: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:7000".to_string(),
            cors_allowed_origins: vec!["*".to_string()],
            log_format: LogFormat::Pretty,
            workers: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let in_container = env::var("KUBERNETES_SERVICE_HOST").is_ok()
            || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            bind_address: detect_bind_address(env_string("BIND_ADDRESS"), in_container),
            cors_allowed_origins: env_string("CORS_ALLOWED_ORIGINS")
                .map(|v| parse_origins(&v))
                .unwrap_or_else(|| vec!["*".to_string()]),
            log_format: env_string("LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or(LogFormat::Pretty),
            workers: Some(env_or::<usize>("SERVER_WORKERS", 0)).filter(|w| *w > 0),
        }
    }

    /// True when the wildcard origin is configured
    pub fn allows_any_origin(&self) -> bool {
        self.cors_allowed_origins.iter().any(|o| o == "*")
    }
}

/// Containers need to listen on all interfaces; local runs stay on loopback.
fn detect_bind_address(bind_override: Option<String>, in_container: bool) -> String {
    if let Some(bind) = bind_override {
        return bind;
    }
    if in_container {
        "0.0.0.0:7000".to_string()
    } else {
        "127.0.0.1:7000".to_string()
    }
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
