//! Utility functions and helper modules.
//!
//! Request inspection helpers shared by handlers and middleware.

pub mod bearer;
pub mod http;
pub mod route;

pub use bearer::*;
pub use http::*;
pub use route::*;
