//! HTTP request handlers for API endpoints.

pub mod health;
pub mod metrics;
pub mod moderate;
pub mod openapi;
pub mod tokens;
pub mod usage;

pub use health::*;
pub use metrics::*;
pub use moderate::*;
pub use openapi::*;
pub use tokens::*;
pub use usage::*;
