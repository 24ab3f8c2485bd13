//! Request and response bodies for the report API.

use saathi_types::{PatientId, ReportId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Status of a lab parameter relative to its reference range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ParameterStatus {
    Normal,
    High,
    Low,
}

impl ParameterStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterStatus::Normal => "normal",
            ParameterStatus::High => "high",
            ParameterStatus::Low => "low",
        }
    }

    pub fn is_normal(&self) -> bool {
        matches!(self, ParameterStatus::Normal)
    }
}

/// Direction of change for a parameter across reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ParameterTrend {
    Up,
    Down,
    Stable,
}

/// A single extracted lab measurement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Parameter {
    pub name: String,
    pub value: String,
    pub unit: String,
    #[serde(rename = "referenceRange", alias = "reference_range")]
    pub reference_range: String,
    pub status: ParameterStatus,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub trend: Option<ParameterTrend>,
    #[serde(default)]
    pub explanation: Option<String>,
}

fn default_category() -> String {
    "General".into()
}

impl Parameter {
    /// Numeric value, if the stored value parses as a finite number.
    ///
    /// `NaN` and infinities are rejected so they never reach score or trend arithmetic.
    pub fn numeric_value(&self) -> Option<f64> {
        self.value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    }
}

/// Severity classification for health clarity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum SeverityLevel {
    #[serde(rename = "Low Attention")]
    Low,
    #[serde(rename = "Moderate Attention")]
    Moderate,
    #[serde(rename = "High Attention")]
    High,
}

impl SeverityLevel {
    pub fn label(&self) -> &'static str {
        match self {
            SeverityLevel::Low => "Low Attention",
            SeverityLevel::Moderate => "Moderate Attention",
            SeverityLevel::High => "High Attention",
        }
    }

    /// Parses a display label (`"Moderate Attention"`) or a bare level (`"moderate"`).
    pub fn from_label(label: &str) -> Option<Self> {
        let lowered = label.trim().to_lowercase();
        match lowered.strip_suffix(" attention").unwrap_or(&lowered) {
            "low" => Some(SeverityLevel::Low),
            "moderate" => Some(SeverityLevel::Moderate),
            "high" => Some(SeverityLevel::High),
            _ => None,
        }
    }
}

/// Health clarity score with severity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthClarityScore {
    /// Score from 0-100
    pub score: u8,
    pub severity_level: SeverityLevel,
    pub severity_color: String,
    pub parameters_in_range: usize,
    pub parameters_needing_attention: usize,
    pub total_parameters: usize,
}

/// Direction of the overall score compared with the previous report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ScoreTrend {
    Improving,
    Declining,
    Stable,
}

/// Score plus plain-language interpretation, as shown on the dashboard.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScoreSummary {
    pub score: u8,
    pub severity_level: SeverityLevel,
    pub severity_color: String,
    pub parameters_in_range: usize,
    pub parameters_needing_attention: usize,
    pub total_parameters: usize,
    pub interpretation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<ScoreTrend>,
}

/// Which strategy produced a report's parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionSource {
    Ai,
    Ocr,
    Demo,
}

/// Response after a report upload has been processed.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadRes {
    pub success: bool,
    pub message: String,
    #[schema(value_type = String)]
    pub report_id: ReportId,
    #[schema(value_type = String)]
    pub upload_id: ReportId,
    #[schema(value_type = String)]
    pub patient_id: PatientId,
    pub report_date: String,
    pub ocr_confidence: f64,
    pub confidence_acceptable: bool,
    pub confidence_message: String,
    pub extraction_source: ExtractionSource,
    pub health_clarity_score: ScoreSummary,
    pub total_parameters: usize,
    pub parameters_in_range: usize,
    pub parameters_needing_attention: usize,
    /// Up to five parameters outside their reference range
    pub abnormal_parameters: Vec<Parameter>,
    pub severity_level: SeverityLevel,
}

/// Full report details.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ReportDetail {
    /// Canonical report id, or `demo-*` for demo content
    pub report_id: String,
    #[schema(value_type = String)]
    pub patient_id: PatientId,
    pub report_date: String,
    pub upload_date: String,
    pub filename: String,
    pub ocr_confidence: f64,
    pub extraction_source: ExtractionSource,
    pub parameters: Vec<Parameter>,
    pub health_clarity_score: HealthClarityScore,
    pub abnormal_parameters: Vec<Parameter>,
    pub normal_parameters: Vec<Parameter>,
    pub severity_level: SeverityLevel,
}

/// Summary of a report for list views.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReportSummary {
    pub report_id: String,
    pub report_date: String,
    pub health_clarity_score: u8,
    pub severity_level: SeverityLevel,
    pub abnormal_count: usize,
    pub total_parameters: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ReportHistory {
    #[schema(value_type = String)]
    pub patient_id: PatientId,
    pub total_reports: usize,
    pub reports: Vec<ReportSummary>,
}

/// Single data point for trend visualisation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TrendDataPoint {
    pub date: String,
    pub value: f64,
    #[serde(rename = "refLow", alias = "ref_low")]
    pub ref_low: f64,
    #[serde(rename = "refHigh", alias = "ref_high")]
    pub ref_high: f64,
}

/// Trend data for a single parameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ParameterTrendData {
    pub parameter_id: String,
    pub parameter_name: String,
    pub unit: String,
    pub trend_direction: ParameterTrend,
    pub data_points: Vec<TrendDataPoint>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScoreTrendPoint {
    pub date: String,
    pub score: u8,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TrendRes {
    #[schema(value_type = String)]
    pub patient_id: PatientId,
    pub health_score_trend: Vec<ScoreTrendPoint>,
    pub parameter_trends: BTreeMap<String, ParameterTrendData>,
    pub available_parameters: Vec<String>,
}

/// Request for a plain-language parameter explanation.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ExplainReq {
    pub parameter_name: String,
    pub status: String,
    #[serde(default)]
    pub trend: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ExplainRes {
    pub parameter_name: String,
    pub explanation: String,
    pub educational_context: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_context: Option<String>,
    pub disclaimer: String,
}

/// Urgency tag on a timeline action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ActionPriority {
    Immediate,
    High,
    Moderate,
    Low,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ActionTimelineItem {
    pub title: String,
    pub description: String,
    pub priority: ActionPriority,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ActionTimelinePhase {
    pub timeframe: String,
    pub color: String,
    pub actions: Vec<ActionTimelineItem>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ActionTimelineRes {
    pub severity_level: SeverityLevel,
    pub phases: Vec<ActionTimelinePhase>,
    pub disclaimer: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub status: String,
    pub service: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RootRes {
    pub message: String,
    pub docs: String,
    pub health: String,
}

/// Error body returned for every non-2xx response.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_uses_camel_case_reference_range() {
        let p = Parameter {
            name: "Hemoglobin".into(),
            value: "11.2".into(),
            unit: "g/dL".into(),
            reference_range: "13.0 - 17.0".into(),
            status: ParameterStatus::Low,
            category: "Blood Count".into(),
            trend: None,
            explanation: None,
        };
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["referenceRange"], "13.0 - 17.0");
        assert_eq!(json["status"], "low");
        assert!(json["trend"].is_null());
    }

    #[test]
    fn parameter_accepts_snake_case_reference_range_and_default_category() {
        let p: Parameter = serde_json::from_str(
            r#"{"name":"TSH","value":"2.5","unit":"mIU/L","reference_range":"0.4 - 4.0","status":"normal"}"#,
        )
        .unwrap();
        assert_eq!(p.reference_range, "0.4 - 4.0");
        assert_eq!(p.category, "General");
        assert_eq!(p.numeric_value(), Some(2.5));
    }

    #[test]
    fn numeric_value_rejects_non_finite_numbers() {
        let with_value = |value: &str| Parameter {
            name: "Hemoglobin".into(),
            value: value.into(),
            unit: "g/dL".into(),
            reference_range: "13.0 - 17.0".into(),
            status: ParameterStatus::Normal,
            category: "Blood Count".into(),
            trend: None,
            explanation: None,
        };
        assert_eq!(with_value(" 11.2 ").numeric_value(), Some(11.2));
        for bad in ["NaN", "nan", "inf", "-inf", "infinity", "Infinity", "", "n/a"] {
            assert_eq!(with_value(bad).numeric_value(), None, "{}", bad);
        }
    }

    #[test]
    fn severity_level_serialises_as_label() {
        let json = serde_json::to_string(&SeverityLevel::Moderate).unwrap();
        assert_eq!(json, "\"Moderate Attention\"");
        assert_eq!(
            SeverityLevel::from_label("High Attention"),
            Some(SeverityLevel::High)
        );
        assert_eq!(SeverityLevel::from_label("low"), Some(SeverityLevel::Low));
        assert_eq!(SeverityLevel::from_label("severe"), None);
    }

    #[test]
    fn trend_point_uses_ref_low_ref_high_keys() {
        let point = TrendDataPoint {
            date: "Jun 2025".into(),
            value: 13.2,
            ref_low: 13.0,
            ref_high: 17.0,
        };
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json["refLow"], 13.0);
        assert_eq!(json["refHigh"], 17.0);
    }
}
