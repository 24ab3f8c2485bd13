//! Router assembly.

use crate::docs::ApiDoc;
use crate::handlers;
use crate::session::session_layer;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, header::InvalidHeaderValue, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Frontend dev-server origins allowed when `CORS_ORIGINS` is unset.
pub const DEFAULT_CORS_ORIGINS: &str =
    "http://localhost:5173,http://localhost:3000,http://127.0.0.1:5173";

/// Parses a comma-separated origin list, ignoring blank entries.
pub fn parse_cors_origins(list: &str) -> Result<Vec<HeaderValue>, InvalidHeaderValue> {
    list.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(HeaderValue::from_str)
        .collect()
}

/// Create the application router.
///
/// Report routes run behind the session middleware. `/reports/{report_id}` is registered
/// last among the report routes but axum prefers static segments, so `/reports/latest` and
/// friends are never captured by it.
pub fn create_router(state: AppState, cors_origins: &[HeaderValue]) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors_origins.to_vec())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let reports = Router::new()
        .route("/upload", post(handlers::upload_report))
        .route("/latest", get(handlers::latest_report))
        .route("/history", get(handlers::report_history))
        .route("/trends/data", get(handlers::trends))
        .route("/explain", post(handlers::explain_parameter))
        .route("/health/clarity-score", get(handlers::clarity_score))
        .route("/action-timeline", get(handlers::action_timeline))
        .route("/timeline", get(handlers::action_timeline))
        .route("/:report_id", get(handlers::report_by_id))
        .layer(middleware::from_fn(session_layer));

    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .nest("/reports", reports)
        .layer(DefaultBodyLimit::max(state.body_limit()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
