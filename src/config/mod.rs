//! Configuration structures and loading utilities.
//!
//! Every concern gets its own struct with a `Default` impl and a `from_env()`
//! constructor. Values that are missing or fail to parse fall back to the default.

pub mod auth;
pub mod metrics;
pub mod moderation;
pub mod rate_limit;
pub mod security;
pub mod server;
pub mod store;

pub use auth::*;
pub use metrics::*;
pub use moderation::*;
pub use rate_limit::*;
pub use security::*;
pub use server::*;
pub use store::*;

use std::{env, str::FromStr};

/// Read and parse an environment variable, returning `default` when it is unset or invalid.
pub(crate) fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Read a boolean flag. Only `true` (any case) enables it.
pub(crate) fn env_flag(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

/// Read a string variable, treating empty values as unset.
pub(crate) fn env_string(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    /// Serializes tests that modify process environment variables.
    pub static ENV_MUTEX: Mutex<()> = Mutex::new(());
}
