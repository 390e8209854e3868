//! Token store configuration.

use super::{env_or, env_string};
use std::path::PathBuf;

pub const DEFAULT_BOOTSTRAP_DESCRIPTION: &str = "Initial admin token for setup";

/// Persistence and bootstrap settings for [`crate::services::TokenStore`]
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// JSON snapshot location; `None` keeps everything in memory
    pub data_file: Option<PathBuf>,
    /// Oldest usage records are evicted past this many entries
    pub usage_log_capacity: usize,
    pub bootstrap_admin_token: Option<String>,
    pub bootstrap_admin_description: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_file: None,
            usage_log_capacity: 10_000,
            bootstrap_admin_token: None,
            bootstrap_admin_description: DEFAULT_BOOTSTRAP_DESCRIPTION.to_string(),
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            data_file: env_string("DATA_FILE").map(PathBuf::from),
            usage_log_capacity: env_or("USAGE_LOG_CAPACITY", defaults.usage_log_capacity),
            bootstrap_admin_token: env_string("BOOTSTRAP_ADMIN_TOKEN"),
            bootstrap_admin_description: env_string("BOOTSTRAP_ADMIN_DESCRIPTION")
                .unwrap_or(defaults.bootstrap_admin_description),
        }
    }
}
