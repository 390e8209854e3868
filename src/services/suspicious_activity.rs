//! Suspicious activity tracking and monitoring service.

use crate::config::AuthConfig;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

/// Counts failed bearer-token checks per client IP
///
/// A client that reaches `max_failures` inside `failure_window_seconds` is
/// considered suspicious until its window lapses.
#[derive(Clone)]
pub struct SuspiciousActivityTracker {
    failed_attempts: Arc<Mutex<HashMap<String, (usize, Instant)>>>,
    max_failures: usize,
    window: Duration,
}

impl Default for SuspiciousActivityTracker {
    fn default() -> Self {
        Self::new(AuthConfig::default())
    }
}

impl SuspiciousActivityTracker {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            failed_attempts: Arc::new(Mutex::new(HashMap::new())),
            max_failures: config.max_failures.max(1),
            window: Duration::from_secs(config.failure_window_seconds),
        }
    }

    /// Record a failed attempt. Returns `true` exactly when this failure makes
    /// the IP cross the threshold, so callers alert once per window.
    pub fn record_failure(&self, ip: &str) -> bool {
        let mut attempts = self
            .failed_attempts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let now = Instant::now();

        attempts.retain(|_, (_, started)| now.duration_since(*started) < self.window);

        let count = match attempts.get_mut(ip) {
            Some((count, _)) => {
                *count += 1;
                *count
            }
            None => {
                attempts.insert(ip.to_string(), (1, now));
                1
            }
        };
        count == self.max_failures
    }

    pub fn is_suspicious(&self, ip: &str) -> bool {
        let attempts = self
            .failed_attempts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        attempts.get(ip).is_some_and(|(count, started)| {
            started.elapsed() < self.window && *count >= self.max_failures
        })
    }
}
