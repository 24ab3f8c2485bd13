//! Standalone REST API server binary.
//!
//! Runs the report API on its own, without the workspace runner. Useful during frontend
//! development together with the Swagger UI at `/docs`.

use api_rest::{create_router, parse_cors_origins, AppState, DEFAULT_CORS_ORIGINS};
use saathi_core::CoreConfig;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the Swasthya Saathi REST API server.
///
/// # Environment Variables
/// - `SAATHI_REST_ADDR`: bind address (default: `0.0.0.0:8000`)
/// - `CORS_ORIGINS`: comma-separated allowed origins
/// - everything read by [`CoreConfig::from_lookup`]
///
/// # Errors
/// Returns an error if:
/// - the configuration is invalid,
/// - the report storage cannot be opened,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("saathi=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = Arc::new(CoreConfig::from_lookup(|key| std::env::var(key).ok())?);
    let origins = std::env::var("CORS_ORIGINS").unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.into());
    let origins = parse_cors_origins(&origins)?;

    let state = AppState::from_config(cfg).await?;
    let app = create_router(state, &origins);

    let addr = std::env::var("SAATHI_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".into());
    tracing::info!("++ Starting Swasthya Saathi REST on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
