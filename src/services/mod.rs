//! Business logic and service layer modules.
//!
//! Token storage, authentication, image moderation, metrics collection and
//! rate limiting.

pub mod auth;
pub mod edges;
pub mod metrics;
pub mod moderation;
pub mod rate_limit;
pub mod skin;
pub mod suspicious_activity;
pub mod token_store;

pub use auth::*;
pub use metrics::*;
pub use moderation::*;
pub use rate_limit::*;
pub use suspicious_activity::*;
pub use token_store::*;
