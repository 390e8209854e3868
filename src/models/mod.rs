//! Data models and schemas for the Image Moderation API.
//!
//! Wire-level request/response types, stored records, and audit event types.

pub mod api;
pub mod audit;
pub mod moderation;
pub mod token;
pub mod usage;

pub use api::*;
pub use audit::*;
pub use moderation::*;
pub use token::*;
pub use usage::*;
