//! Fixed-window rate limiting keyed by caller.

use crate::config::RateLimitConfig;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

/// Simple in-memory rate limiter
///
/// Tracks a request count per key (bearer token for `/moderate`) inside a
/// window of `period_seconds`. Expired windows are swept on every check.
#[derive(Clone)]
pub struct SimpleRateLimiter {
    config: RateLimitConfig,
    storage: Arc<Mutex<HashMap<String, (usize, Instant)>>>,
}

impl SimpleRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            storage: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns `true` if the request should be allowed, `false` if rate limited.
    pub fn check_rate_limit(&self, key: &str) -> bool {
        let mut storage = self
            .storage
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let now = Instant::now();
        let period = Duration::from_secs(self.config.period_seconds);

        storage.retain(|_, (_, started)| now.duration_since(*started) < period);

        match storage.get_mut(key) {
            Some((count, _)) if *count >= self.config.requests_per_minute => false,
            Some((count, _)) => {
                *count += 1;
                true
            }
            None => {
                if self.config.requests_per_minute == 0 {
                    return false;
                }
                storage.insert(key.to_string(), (1, now));
                true
            }
        }
    }
}
