//! Rate limiting configuration.

use super::env_or;

/// Per-token request budget for the moderation endpoint
#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    pub requests_per_minute: usize,
    pub period_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 100,
            period_seconds: 60,
        }
    }
}

impl RateLimitConfig {
    /// Load configuration from `RATE_LIMIT_RPM` and `RATE_LIMIT_PERIOD`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            requests_per_minute: env_or("RATE_LIMIT_RPM", defaults.requests_per_minute),
            period_seconds: env_or("RATE_LIMIT_PERIOD", defaults.period_seconds),
        }
    }
}
