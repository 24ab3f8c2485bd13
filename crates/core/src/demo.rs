//! Demo content for sessions that have not uploaded anything yet.
//!
//! Demo reports use `demo-*` ids and are never persisted.

use crate::analysis::{get_abnormal_parameters, get_normal_parameters};
use crate::constants::ASSUMED_CONFIDENCE;
use crate::report::format_report_date;
use crate::score::calculate_health_clarity_score;
use api_shared::{
    ExtractionSource, Parameter, ParameterStatus, ParameterTrend, ParameterTrendData,
    ReportDetail, ReportSummary, ScoreTrendPoint, SeverityLevel, TrendDataPoint, TrendRes,
};
use chrono::{DateTime, Utc};
use saathi_types::PatientId;
use std::collections::BTreeMap;

pub const DEMO_ID_PREFIX: &str = "demo-";
pub const DEMO_LATEST_ID: &str = "demo-latest";
pub const DEMO_FILENAME: &str = "demo_report.pdf";

/// Text returned by the sample OCR engine: a complete blood count, lipid, metabolic, liver,
/// vitamin and thyroid panel.
pub const SAMPLE_REPORT_TEXT: &str = "
COMPLETE BLOOD COUNT REPORT

Patient ID: XXXXXX
Date: January 3, 2026

Test Results:

BLOOD COUNT
Hemoglobin: 11.2 g/dL (Reference: 13.0-17.0)
RBC Count: 4.2 ×10⁶/μL (Reference: 4.5-5.5)
WBC Count: 7.5 ×10³/μL (Reference: 4.0-11.0)
Platelet Count: 250 ×10³/μL (Reference: 150-400)
Hematocrit: 35% (Reference: 38-50)
MCV: 83 fL (Reference: 80-100)
MCH: 28 pg (Reference: 27-33)

LIPID PROFILE
Total Cholesterol: 245 mg/dL (Reference: <200)
HDL Cholesterol: 48 mg/dL (Reference: >40)
LDL Cholesterol: 165 mg/dL (Reference: <100)
Triglycerides: 142 mg/dL (Reference: <150)
VLDL: 28 mg/dL (Reference: <30)

METABOLIC PANEL
Fasting Glucose: 94 mg/dL (Reference: 70-100)
HbA1c: 5.6% (Reference: <5.7)
Creatinine: 0.9 mg/dL (Reference: 0.7-1.3)
BUN: 15 mg/dL (Reference: 7-20)
Uric Acid: 5.5 mg/dL (Reference: 3.5-7.2)

LIVER FUNCTION
SGPT (ALT): 32 U/L (Reference: 0-40)
SGOT (AST): 28 U/L (Reference: 0-40)
Alkaline Phosphatase: 85 U/L (Reference: 44-147)
Total Bilirubin: 0.8 mg/dL (Reference: 0.1-1.2)
Total Protein: 7.2 g/dL (Reference: 6.0-8.3)
Albumin: 4.2 g/dL (Reference: 3.5-5.0)

VITAMINS
Vitamin D: 18 ng/mL (Reference: 30-100)
Vitamin B12: 425 pg/mL (Reference: 200-900)
Folate: 8.5 ng/mL (Reference: 3.0-17.0)

THYROID
TSH: 2.5 mIU/L (Reference: 0.4-4.0)
T3: 120 ng/dL (Reference: 80-200)
T4: 8.0 μg/dL (Reference: 5.0-12.0)

---End of Report---
";

pub fn is_demo_id(report_id: &str) -> bool {
    report_id.starts_with(DEMO_ID_PREFIX)
}

fn demo_param(
    name: &str,
    value: &str,
    unit: &str,
    reference_range: &str,
    status: ParameterStatus,
    category: &str,
    explanation: Option<&str>,
) -> Parameter {
    Parameter {
        name: name.to_string(),
        value: value.to_string(),
        unit: unit.to_string(),
        reference_range: reference_range.to_string(),
        status,
        category: category.to_string(),
        trend: None,
        explanation: explanation.map(str::to_string),
    }
}

/// Fourteen representative parameters with five abnormal values.
pub fn demo_parameters() -> Vec<Parameter> {
    use ParameterStatus::{High, Low, Normal};

    vec![
        demo_param(
            "Hemoglobin",
            "11.2",
            "g/dL",
            "13.0 - 17.0",
            Low,
            "Blood Count",
            Some("Hemoglobin carries oxygen throughout the body. Lower values may indicate iron deficiency or other conditions."),
        ),
        demo_param("White Blood Cell Count", "7.5", "×10³/μL", "4.0 - 11.0", Normal, "Blood Count", None),
        demo_param("Platelet Count", "225", "×10³/μL", "150 - 400", Normal, "Blood Count", None),
        demo_param("Red Blood Cell Count", "4.2", "×10⁶/μL", "4.5 - 5.5", Low, "Blood Count", None),
        demo_param(
            "Total Cholesterol",
            "245",
            "mg/dL",
            "< 200",
            High,
            "Lipid Profile",
            Some("Total cholesterol includes HDL, LDL, and other lipid components. Values above 200 mg/dL are considered elevated."),
        ),
        demo_param("HDL Cholesterol", "48", "mg/dL", "> 40", Normal, "Lipid Profile", None),
        demo_param(
            "LDL Cholesterol",
            "165",
            "mg/dL",
            "< 100",
            High,
            "Lipid Profile",
            Some("LDL is often called 'bad cholesterol'. Elevated levels may contribute to cardiovascular risk factors."),
        ),
        demo_param("Triglycerides", "142", "mg/dL", "< 150", Normal, "Lipid Profile", None),
        demo_param("Fasting Glucose", "94", "mg/dL", "70 - 100", Normal, "Metabolic", None),
        demo_param("HbA1c", "5.6", "%", "< 5.7", Normal, "Metabolic", None),
        demo_param("Creatinine", "1.1", "mg/dL", "0.7 - 1.3", Normal, "Metabolic", None),
        demo_param("TSH", "2.5", "mIU/L", "0.4 - 4.0", Normal, "Thyroid", None),
        demo_param(
            "Vitamin D",
            "18",
            "ng/mL",
            "30 - 100",
            Low,
            "Vitamins",
            Some("Vitamin D supports bone health and immune function. Values below 30 ng/mL are considered insufficient."),
        ),
        demo_param("Vitamin B12", "425", "pg/mL", "200 - 900", Normal, "Vitamins", None),
    ]
}

/// The demo report for a session without uploads, dated `now`.
pub fn demo_report_detail(patient_id: &PatientId, now: DateTime<Utc>) -> ReportDetail {
    let parameters = demo_parameters();
    let score = calculate_health_clarity_score(&parameters);

    ReportDetail {
        report_id: DEMO_LATEST_ID.to_string(),
        patient_id: patient_id.clone(),
        report_date: format_report_date(now),
        upload_date: now.to_rfc3339(),
        filename: DEMO_FILENAME.to_string(),
        ocr_confidence: ASSUMED_CONFIDENCE,
        extraction_source: ExtractionSource::Demo,
        abnormal_parameters: get_abnormal_parameters(&parameters),
        normal_parameters: get_normal_parameters(&parameters),
        severity_level: score.severity_level,
        health_clarity_score: score,
        parameters,
    }
}

/// Five past reports showing a slowly declining score.
pub fn demo_history() -> Vec<ReportSummary> {
    let total = demo_parameters().len();
    [
        ("demo-1", "June 15, 2025", 78, SeverityLevel::Low, 2),
        ("demo-2", "August 20, 2025", 75, SeverityLevel::Moderate, 3),
        ("demo-3", "October 10, 2025", 72, SeverityLevel::Moderate, 3),
        ("demo-4", "December 5, 2025", 70, SeverityLevel::Moderate, 3),
        ("demo-5", "January 3, 2026", 68, SeverityLevel::Moderate, 3),
    ]
    .into_iter()
    .map(|(id, date, score, severity_level, abnormal_count)| ReportSummary {
        report_id: id.to_string(),
        report_date: date.to_string(),
        health_clarity_score: score,
        severity_level,
        abnormal_count,
        total_parameters: total,
    })
    .collect()
}

const DEMO_MONTHS: [&str; 5] = ["Jun 2025", "Aug 2025", "Oct 2025", "Dec 2025", "Jan 2026"];

fn demo_series(
    id: &str,
    name: &str,
    unit: &str,
    direction: ParameterTrend,
    values: [f64; 5],
    (ref_low, ref_high): (f64, f64),
) -> ParameterTrendData {
    ParameterTrendData {
        parameter_id: id.to_string(),
        parameter_name: name.to_string(),
        unit: unit.to_string(),
        trend_direction: direction,
        data_points: DEMO_MONTHS
            .iter()
            .zip(values)
            .map(|(date, value)| TrendDataPoint {
                date: date.to_string(),
                value,
                ref_low,
                ref_high,
            })
            .collect(),
    }
}

/// Trend data shown until a session has at least two reports.
pub fn demo_trends(patient_id: &PatientId) -> TrendRes {
    let series = [
        demo_series(
            "hemoglobin",
            "Hemoglobin",
            "g/dL",
            ParameterTrend::Down,
            [13.2, 12.8, 12.1, 11.6, 11.2],
            (13.0, 17.0),
        ),
        demo_series(
            "cholesterol",
            "Total Cholesterol",
            "mg/dL",
            ParameterTrend::Up,
            [210.0, 218.0, 232.0, 238.0, 245.0],
            (0.0, 200.0),
        ),
        demo_series(
            "vitaminD",
            "Vitamin D",
            "ng/mL",
            ParameterTrend::Down,
            [28.0, 25.0, 22.0, 20.0, 18.0],
            (30.0, 100.0),
        ),
    ];

    let available_parameters = series.iter().map(|s| s.parameter_id.clone()).collect();
    let health_score_trend = DEMO_MONTHS
        .iter()
        .zip([78, 75, 72, 70, 68])
        .map(|(date, score)| ScoreTrendPoint {
            date: date.to_string(),
            score,
        })
        .collect();

    TrendRes {
        patient_id: patient_id.clone(),
        health_score_trend,
        parameter_trends: series
            .into_iter()
            .map(|s| (s.parameter_id.clone(), s))
            .collect::<BTreeMap<_, _>>(),
        available_parameters,
    }
}
