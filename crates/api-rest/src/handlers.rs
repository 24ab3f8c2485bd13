//! HTTP handlers for the REST API.
//!
//! Report handlers read the caller's [`Session`] from the request extensions and delegate to
//! [`saathi_core::ReportService`].

use crate::error::AppError;
use crate::session::Session;
use crate::state::AppState;
use api_shared::{
    ActionTimelineRes, ErrorRes, ExplainReq, ExplainRes, HealthRes, HealthService, ReportDetail,
    ReportHistory, RootRes, ScoreSummary, TrendRes, UploadRes,
};
use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use saathi_core::ReportError;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

pub type HandlerResult<T> = Result<Json<T>, AppError>;

const UPLOAD_FIELD: &str = "file";

/// Multipart body of `POST /reports/upload`.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    /// PDF, PNG or JPEG lab report
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TrendsQuery {
    /// Parameter display name to build a series for, e.g. `Hemoglobin`
    pub parameter: Option<String>,
}

#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Welcome message", body = RootRes))
)]
pub async fn root() -> Json<RootRes> {
    Json(HealthService::welcome())
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Health check response", body = HealthRes))
)]
/// Liveness check used by load balancers and monitoring.
pub async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

fn multipart_error(err: MultipartError, state: &AppState) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::Report(ReportError::FileTooLarge {
            max_mb: state.service.config().max_file_size_mb(),
        });
    }
    AppError::BadRequest(format!("Invalid multipart body: {}", err.body_text()))
}

#[utoipa::path(
    post,
    path = "/reports/upload",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Report processed", body = UploadRes),
        (status = 400, description = "Invalid file type or size", body = ErrorRes),
        (status = 422, description = "No parameters could be extracted", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Upload a lab report (PDF or image) for processing.
///
/// The file is read from the multipart field `file`, processed in memory and discarded; only
/// the extracted parameters and score are stored.
///
/// # Errors
/// - `400` if the field is missing, the extension is not allowed or the file is too large.
/// - `422` if no parameters could be extracted and demo fallback is disabled.
pub async fn upload_report(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    mut multipart: Multipart,
) -> HandlerResult<UploadRes> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, &state))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(|e| multipart_error(e, &state))?;

        let res = state
            .service
            .upload(&session.patient_id, filename.as_deref(), &bytes)
            .await?;
        return Ok(Json(res));
    }

    Err(AppError::BadRequest(format!(
        "Missing multipart field '{}'",
        UPLOAD_FIELD
    )))
}

#[utoipa::path(
    get,
    path = "/reports/latest",
    responses(
        (status = 200, description = "Most recent report, or the demo report for new sessions", body = ReportDetail),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
pub async fn latest_report(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> HandlerResult<ReportDetail> {
    Ok(Json(state.service.latest(&session.patient_id).await?))
}

#[utoipa::path(
    get,
    path = "/reports/history",
    responses(
        (status = 200, description = "Report summaries, oldest first", body = ReportHistory),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
pub async fn report_history(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> HandlerResult<ReportHistory> {
    Ok(Json(state.service.history(&session.patient_id).await?))
}

#[utoipa::path(
    get,
    path = "/reports/{report_id}",
    params(("report_id" = String, Path, description = "Report id, or a `demo-*` id")),
    responses(
        (status = 200, description = "Report details", body = ReportDetail),
        (status = 404, description = "Report not found", body = ErrorRes)
    )
)]
/// Fetch one of the caller's reports.
///
/// Reports belonging to other sessions are reported as not found.
pub async fn report_by_id(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(report_id): Path<String>,
) -> HandlerResult<ReportDetail> {
    Ok(Json(
        state
            .service
            .report_by_id(&session.patient_id, &report_id)
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/reports/trends/data",
    params(TrendsQuery),
    responses(
        (status = 200, description = "Trend data (demo data with fewer than two reports)", body = TrendRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
pub async fn trends(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<TrendsQuery>,
) -> HandlerResult<TrendRes> {
    Ok(Json(
        state
            .service
            .trends(&session.patient_id, query.parameter.as_deref())
            .await?,
    ))
}

#[utoipa::path(
    post,
    path = "/reports/explain",
    request_body = ExplainReq,
    responses(
        (status = 200, description = "Plain-language explanation", body = ExplainRes),
        (status = 400, description = "Blank parameter name or status", body = ErrorRes)
    )
)]
/// Explain a parameter in plain language.
///
/// Only the parameter name, status and trend are ever forwarded to an LLM.
pub async fn explain_parameter(
    State(state): State<AppState>,
    Json(req): Json<ExplainReq>,
) -> HandlerResult<ExplainRes> {
    Ok(Json(state.service.explain(&req).await?))
}

#[utoipa::path(
    get,
    path = "/reports/health/clarity-score",
    responses(
        (status = 200, description = "Current Health Clarity Score", body = ScoreSummary),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
pub async fn clarity_score(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> HandlerResult<ScoreSummary> {
    Ok(Json(state.service.clarity_score(&session.patient_id).await?))
}

#[utoipa::path(
    get,
    path = "/reports/action-timeline",
    responses(
        (status = 200, description = "Phased follow-up actions", body = ActionTimelineRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Follow-up actions for the latest report's severity. Also served at `/reports/timeline`.
pub async fn action_timeline(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> HandlerResult<ActionTimelineRes> {
    Ok(Json(
        state.service.action_timeline(&session.patient_id).await?,
    ))
}
