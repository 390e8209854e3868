use actix_web::HttpServer;
use image_moderation_api::{AppContext, LogFormat, ServerConfig, create_app, models::BuildInfo};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Json => registry.with(fmt::layer().with_target(true).json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).init(),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // A missing .env file is normal outside local development
    let _ = dotenvy::dotenv();

    init_tracing(ServerConfig::from_env().log_format);
    let context = AppContext::from_env()?;

    let bind_address = context.server.bind_address.clone();
    let workers = context.server.workers;
    info!(
        bind_address = %bind_address,
        version = BuildInfo::version(),
        commit = BuildInfo::commit(),
        "Starting Image Moderation API"
    );

    let server = HttpServer::new(move || create_app(context.clone()));
    let server = match workers {
        Some(count) => server.workers(count),
        None => server,
    };

    server.bind(&bind_address)?.run().await
}
