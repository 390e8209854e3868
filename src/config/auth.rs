//! Authentication failure tracking configuration.

use super::env_or;

/// Thresholds for flagging repeated bearer-token failures from one client
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub max_failures: usize,
    pub failure_window_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            max_failures: 5,
            failure_window_seconds: 300,
        }
    }
}

impl AuthConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_failures: env_or("AUTH_MAX_FAILURES", defaults.max_failures),
            failure_window_seconds: env_or("AUTH_FAILURE_WINDOW", defaults.failure_window_seconds),
        }
    }
}
