mod applications;
mod cache;
mod config;
mod db;
mod errors;
mod jobs;
mod matching;
mod models;
mod onboarding;
mod parser_client;
mod resume;
mod routes;
mod session;
mod state;
mod storage;
mod store;
#[cfg(test)]
mod testing;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cache::RedisCache;
use crate::config::Config;
use crate::db::{create_pool, ensure_schema};
use crate::matching::scoring::OverlapMatchScorer;
use crate::parser_client::HttpResumeParser;
use crate::routes::build_router;
use crate::session::HttpAuthService;
use crate::state::AppState;
use crate::storage::S3Storage;
use crate::store::postgres::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Hireboard API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let store = PgStore::new(create_pool(&config.database_url).await?);
    ensure_schema(store.pool()).await?;

    // Initialize Redis
    let redis = redis::Client::open(config.redis_url.clone())?;
    let cache = RedisCache::connect(&redis).await?;
    info!("Redis cache connected");

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    let storage = S3Storage::new(s3, config.s3_bucket.clone(), config.s3_public_url.clone());
    info!("S3 storage initialized (bucket: {})", config.s3_bucket);

    let auth = HttpAuthService::new(config.auth_url.clone(), config.auth_api_key.clone())?;
    let parser = HttpResumeParser::new(config.resume_parser_url.clone())?;
    info!("Auth and resume parser clients initialized");

    // Build app state
    let state = AppState::new(
        config.clone(),
        Arc::new(store),
        Arc::new(storage),
        Arc::new(cache),
        Arc::new(parser),
        Arc::new(auth),
        Arc::new(OverlapMatchScorer),
    );

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "hireboard-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(true)
        .build();
    aws_sdk_s3::Client::from_conf(s3_config)
}
