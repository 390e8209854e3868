//! OpenAPI specification generation and app factory.

use crate::{
    config::{
        AuthConfig, MetricsConfig, ModerationConfig, RateLimitConfig, SecurityHeadersConfig,
        ServerConfig, StoreConfig,
    },
    error::StartupError,
    handlers::{create_token, delete_token, get_metrics, health, list_tokens, moderate_image, root, usage_stats},
    middleware::{MetricsMiddleware, RequestIdMiddleware, SecurityHeaders},
    services::{AppMetrics, ModerationService, SimpleRateLimiter, SuspiciousActivityTracker, TokenStore},
};
use actix_cors::Cors;
use actix_web::App;
use paperclip::actix::{OpenApiExt, web};
use paperclip::v2::models::{DefaultApiRaw, Info};

pub const OPENAPI_SPEC_PATH: &str = "/api/spec/v2";

/// Creates the OpenAPI document served at [`OPENAPI_SPEC_PATH`]
pub fn create_openapi_spec() -> DefaultApiRaw {
    DefaultApiRaw {
        info: Info {
            title: "Image Moderation API".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            description: Some(
                "Heuristic image content moderation behind bearer-token authentication.\n\n\
                ## Authentication\n\
                Send `Authorization: Bearer <token>` on every protected route.\n\
                - A missing or malformed header yields `403 Not authenticated`\n\
                - An unknown or revoked token yields `401 Invalid or expired token`\n\
                - Token management (`/auth/*`) requires an admin token (`403 Admin privileges required`)\n\
                \n\
                ## Moderation\n\
                `POST /moderate` takes a multipart form with an image in the `file` field \
                (10MB by default) and returns `is_safe`, `confidence`, `message`, \
                `categories` and per-detector `details`.\n\
                \n\
                ## Errors\n\
                Error responses carry `{\"error\": <reason phrase>, \"detail\": <message>}`."
                    .into(),
            ),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Shared state handed to every worker's [`App`]
///
/// The `web::Data` handles are `Arc`s, so cloning the context per worker
/// shares one token store, limiter and metrics registry across the server.
#[derive(Clone)]
pub struct AppContext {
    pub server: ServerConfig,
    pub security: SecurityHeadersConfig,
    pub metrics_config: web::Data<MetricsConfig>,
    pub store: web::Data<TokenStore>,
    pub moderation: web::Data<ModerationService>,
    pub limiter: web::Data<SimpleRateLimiter>,
    pub tracker: web::Data<SuspiciousActivityTracker>,
    pub metrics: web::Data<AppMetrics>,
}

impl AppContext {
    /// Context with default configuration around the given store
    pub fn new(store: TokenStore) -> Result<Self, StartupError> {
        Ok(Self {
            server: ServerConfig::default(),
            security: SecurityHeadersConfig::default(),
            metrics_config: web::Data::new(MetricsConfig::default()),
            store: web::Data::new(store),
            moderation: web::Data::new(ModerationService::new(ModerationConfig::default())),
            limiter: web::Data::new(SimpleRateLimiter::new(RateLimitConfig::default())),
            tracker: web::Data::new(SuspiciousActivityTracker::default()),
            metrics: web::Data::new(AppMetrics::new()?),
        })
    }

    /// Load every config section from the environment and open the store
    pub fn from_env() -> Result<Self, StartupError> {
        let store = TokenStore::open(&StoreConfig::from_env())?;
        Ok(Self {
            server: ServerConfig::from_env(),
            security: SecurityHeadersConfig::from_env(),
            metrics_config: web::Data::new(MetricsConfig::from_env()),
            moderation: web::Data::new(ModerationService::new(ModerationConfig::from_env())),
            limiter: web::Data::new(SimpleRateLimiter::new(RateLimitConfig::from_env())),
            tracker: web::Data::new(SuspiciousActivityTracker::new(AuthConfig::from_env())),
            ..Self::new(store)?
        })
    }

    pub fn with_moderation(mut self, config: ModerationConfig) -> Self {
        self.moderation = web::Data::new(ModerationService::new(config));
        self
    }

    pub fn with_rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.limiter = web::Data::new(SimpleRateLimiter::new(config));
        self
    }

    pub fn with_metrics_config(mut self, config: MetricsConfig) -> Self {
        self.metrics_config = web::Data::new(config);
        self
    }
}

fn build_cors(config: &ServerConfig) -> Cors {
    let cors = Cors::default()
        .allow_any_method()
        .allow_any_header()
        .supports_credentials()
        .max_age(3600);

    if config.allows_any_origin() {
        cors.allow_any_origin()
    } else {
        config
            .cors_allowed_origins
            .iter()
            .fold(cors, |cors, origin| cors.allowed_origin(origin))
    }
}

/// Builds the application: middleware stack, shared state, routes and the
/// OpenAPI document. Used by `main` and by the integration tests.
pub fn create_app(
    context: AppContext,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse<
            actix_web::body::EitherBody<actix_web::body::BoxBody>,
        >,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .wrap(build_cors(&context.server))
        .wrap(SecurityHeaders::new(context.security.clone()))
        .wrap(RequestIdMiddleware)
        .wrap(MetricsMiddleware)
        .wrap_api_with_spec(create_openapi_spec())
        .app_data(context.metrics_config.clone())
        .app_data(context.store.clone())
        .app_data(context.moderation.clone())
        .app_data(context.limiter.clone())
        .app_data(context.tracker.clone())
        .app_data(context.metrics.clone())
        .service(web::resource("/").route(web::get().to(root)))
        .service(web::resource("/health").route(web::get().to(health)))
        .service(web::resource("/metrics").route(web::get().to(get_metrics)))
        .service(
            web::scope("/auth")
                .service(
                    web::resource("/tokens")
                        .route(web::get().to(list_tokens))
                        .route(web::post().to(create_token)),
                )
                .service(web::resource("/tokens/{token}").route(web::delete().to(delete_token)))
                .service(web::resource("/usage").route(web::get().to(usage_stats))),
        )
        .service(web::resource("/moderate").route(web::post().to(moderate_image)))
        .with_json_spec_at(OPENAPI_SPEC_PATH)
        .build()
}
