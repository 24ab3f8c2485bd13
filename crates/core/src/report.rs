//! Persisted report shape and its API projections.

use crate::analysis::{get_abnormal_parameters, get_normal_parameters};
use api_shared::{
    ExtractionSource, HealthClarityScore, Parameter, ReportDetail, ReportSummary, SeverityLevel,
};
use chrono::{DateTime, Utc};
use saathi_types::{PatientId, ReportId};
use serde::{Deserialize, Serialize};

/// Display format for report dates, e.g. `January 03, 2026`.
pub const REPORT_DATE_FORMAT: &str = "%B %d, %Y";

/// A processed report as stored by a [`crate::repositories::ReportRepository`].
///
/// Only derived values are kept; the uploaded file itself is never persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredReport {
    pub report_id: ReportId,
    pub patient_id: PatientId,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub report_date: String,
    pub parameters: Vec<Parameter>,
    pub health_clarity_score: HealthClarityScore,
    pub ocr_confidence: f64,
    pub severity_level: SeverityLevel,
    pub extraction_source: ExtractionSource,
}

impl StoredReport {
    pub fn abnormal_count(&self) -> usize {
        self.parameters
            .iter()
            .filter(|p| !p.status.is_normal())
            .count()
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            report_id: self.report_id.to_string(),
            report_date: self.report_date.clone(),
            health_clarity_score: self.health_clarity_score.score,
            severity_level: self.severity_level,
            abnormal_count: self.abnormal_count(),
            total_parameters: self.parameters.len(),
        }
    }

    pub fn detail(&self) -> ReportDetail {
        ReportDetail {
            report_id: self.report_id.to_string(),
            patient_id: self.patient_id.clone(),
            report_date: self.report_date.clone(),
            upload_date: self.uploaded_at.to_rfc3339(),
            filename: self.filename.clone(),
            ocr_confidence: self.ocr_confidence,
            extraction_source: self.extraction_source,
            parameters: self.parameters.clone(),
            health_clarity_score: self.health_clarity_score.clone(),
            abnormal_parameters: get_abnormal_parameters(&self.parameters),
            normal_parameters: get_normal_parameters(&self.parameters),
            severity_level: self.severity_level,
        }
    }
}

pub fn format_report_date(at: DateTime<Utc>) -> String {
    at.format(REPORT_DATE_FORMAT).to_string()
}
