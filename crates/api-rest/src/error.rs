//! HTTP error mapping.
//!
//! Every error response has the body `{"detail": "..."}`. Client errors carry the core error's
//! message; internal failures are logged and answered with a generic message.

use api_shared::ErrorRes;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use saathi_core::ReportError;

#[derive(Debug)]
pub enum AppError {
    /// Malformed request that never reached the core (e.g. a broken multipart body)
    BadRequest(String),
    Report(ReportError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Report(e) => match e {
                ReportError::InvalidInput(_)
                | ReportError::InvalidFileType { .. }
                | ReportError::FileTooLarge { .. } => StatusCode::BAD_REQUEST,
                ReportError::NotFound(_) => StatusCode::NOT_FOUND,
                ReportError::NoParameters => StatusCode::UNPROCESSABLE_ENTITY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            AppError::BadRequest(msg) => msg.clone(),
            AppError::Report(e) if status.is_server_error() => {
                tracing::error!("request failed: {:?}", e);
                "Internal server error".to_string()
            }
            AppError::Report(e) => e.to_string(),
        };

        (status, Json(ErrorRes { detail })).into_response()
    }
}

impl From<ReportError> for AppError {
    fn from(err: ReportError) -> Self {
        AppError::Report(err)
    }
}
