//! Image Moderation API - bearer-token protected image content moderation
//!
//! An Actix Web + Paperclip service that:
//! - issues, lists and revokes bearer tokens (admin only)
//! - records per-token usage and aggregates it on demand
//! - classifies uploaded images with skin-tone and edge-density heuristics
//! - exposes Prometheus metrics, security headers and an OpenAPI document
//!
//! ## Architecture
//!
//! - `models/` - wire types, stored records and audit events
//! - `handlers/` - HTTP handlers and the app factory
//! - `middleware/` - request IDs, security headers, request metrics
//! - `services/` - token store, authentication, detectors, rate limiting
//! - `utils/` - header and route helpers
//! - `config/` - environment-driven configuration
//!
//! ## Quick Start
//!
//! ```no_run
//! use actix_web::HttpServer;
//! use image_moderation_api::{AppContext, TokenStore, create_app};
//!
//! #[actix_web::main]
//! async fn main() -> std::io::Result<()> {
//!     let context = AppContext::new(TokenStore::in_memory())?;
//!     HttpServer::new(move || create_app(context.clone()))
//!         .bind("127.0.0.1:7000")?
//!         .run()
//!         .await
//! }
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

pub use config::{
    AuthConfig, LogFormat, MetricsConfig, ModerationConfig, RateLimitConfig, SecurityHeadersConfig,
    ServerConfig, StoreConfig,
};
pub use error::{ApiError, StartupError, StoreError};
pub use handlers::{AppContext, OPENAPI_SPEC_PATH, create_app, create_openapi_spec};
pub use middleware::{MetricsMiddleware, REQUEST_ID_HEADER, RequestId, RequestIdMiddleware, SecurityHeaders};
pub use models::{
    CreateTokenRequest, HealthResponse, ModerationCategory, ModerationResult, ServiceInfo,
    TokenRecord, UsageRecord, UsageStats,
};
pub use services::{
    AppMetrics, ModerationService, SimpleRateLimiter, SuspiciousActivityTracker, TOKEN_LENGTH,
    TokenStore, generate_token,
};
