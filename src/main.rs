use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, DEFAULT_CORS_ORIGINS, create_router, parse_cors_origins};
use saathi_core::CoreConfig;

/// Main entry point for the Swasthya Saathi backend
///
/// Resolves configuration once, opens report storage and serves the REST API (with Swagger UI
/// at `/docs`) until Ctrl-C.
///
/// # Environment Variables
/// - `SAATHI_REST_ADDR`: REST server address (default: "0.0.0.0:8000")
/// - `CORS_ORIGINS`: comma-separated allowed origins
/// - `SAATHI_DATA_DIR`, `SAATHI_STORAGE`: where and how reports are stored
/// - `SAATHI_OCR_ENGINE`, `TESSERACT_BIN`, `PDFTOPPM_BIN`: OCR backend
/// - `OPENROUTER_API_KEY`, `OLLAMA_ENABLED` and friends: optional LLM providers
///
/// # Returns
/// * `Ok(())` - If the server starts and shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration, storage or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("saathi=info".parse()?)
                .add_directive("saathi_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr: SocketAddr = std::env::var("SAATHI_REST_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8000".into())
        .parse()?;
    let origins = std::env::var("CORS_ORIGINS").unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.into());
    let origins = parse_cors_origins(&origins)?;

    let cfg = Arc::new(CoreConfig::from_lookup(|key| std::env::var(key).ok())?);
    tracing::info!("++ Report data directory: {}", cfg.data_dir().display());

    let state = AppState::from_config(cfg).await?;
    let app = create_router(state, &origins);

    tracing::info!("++ Starting Swasthya Saathi REST on {}", rest_addr);
    let listener = tokio::net::TcpListener::bind(rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("failed to listen for shutdown signal: {:?}", e);
            }
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}
