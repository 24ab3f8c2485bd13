//! Longitudinal trends across a patient's reports.
//!
//! All functions expect reports in any order and sort them by upload time themselves.

use crate::parser::parse_reference_range;
use crate::report::StoredReport;
use api_shared::{ParameterTrend, ParameterTrendData, ScoreTrendPoint, TrendDataPoint};
use std::collections::HashMap;

const TREND_THRESHOLD: f64 = 0.05;

/// Bounds used for charting when a parameter has no usable reference range.
const DEFAULT_CHART_BOUNDS: (f64, f64) = (0.0, 100.0);

/// Overall direction of a series: the mean of the second half against the first.
///
/// Fewer than two values, or a first-half mean of zero, is stable.
pub fn calculate_trend_direction(values: &[f64]) -> ParameterTrend {
    if values.len() < 2 {
        return ParameterTrend::Stable;
    }

    let mid = values.len() / 2;
    let (first, second) = values.split_at(mid);
    let first_mean = first.iter().sum::<f64>() / first.len() as f64;
    let second_mean = second.iter().sum::<f64>() / second.len() as f64;
    if first_mean == 0.0 {
        return ParameterTrend::Stable;
    }

    let change = (second_mean - first_mean) / first_mean.abs();
    if change > TREND_THRESHOLD {
        ParameterTrend::Up
    } else if change < -TREND_THRESHOLD {
        ParameterTrend::Down
    } else {
        ParameterTrend::Stable
    }
}

/// Reference bounds for charting; `(0, 100)` when the range cannot be read.
pub fn parse_reference_for_trend(reference: &str) -> (f64, f64) {
    parse_reference_range(reference).unwrap_or(DEFAULT_CHART_BOUNDS)
}

pub fn parameter_id(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

fn chronological(reports: &[StoredReport]) -> Vec<&StoredReport> {
    let mut ordered: Vec<&StoredReport> = reports.iter().collect();
    ordered.sort_by_key(|r| r.uploaded_at);
    ordered
}

/// Builds the chart series for one parameter, matched by exact display name.
///
/// Returns `None` when no report carries a numeric value for the parameter.
pub fn generate_trend_data_for_parameter(
    name: &str,
    reports: &[StoredReport],
) -> Option<ParameterTrendData> {
    let mut unit = String::new();
    let mut points = Vec::new();

    for report in chronological(reports) {
        let Some(parameter) = report.parameters.iter().find(|p| p.name == name) else {
            continue;
        };
        let Some(value) = parameter.numeric_value() else {
            continue;
        };
        let (ref_low, ref_high) = parse_reference_for_trend(&parameter.reference_range);
        unit = parameter.unit.clone();
        points.push(TrendDataPoint {
            date: report.report_date.clone(),
            value,
            ref_low,
            ref_high,
        });
    }

    if points.is_empty() {
        return None;
    }

    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    Some(ParameterTrendData {
        parameter_id: parameter_id(name),
        parameter_name: name.to_string(),
        unit,
        trend_direction: calculate_trend_direction(&values),
        data_points: points,
    })
}

/// Clarity score per report in upload order.
pub fn generate_health_score_trend(reports: &[StoredReport]) -> Vec<ScoreTrendPoint> {
    chronological(reports)
        .into_iter()
        .map(|r| ScoreTrendPoint {
            date: r.report_date.clone(),
            score: r.health_clarity_score.score,
        })
        .collect()
}

/// Parameter names that appear in at least two reports, in first-seen order.
pub fn get_available_parameters_for_trends(reports: &[StoredReport]) -> Vec<String> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for report in chronological(reports) {
        let mut seen_in_report = Vec::new();
        for parameter in &report.parameters {
            let name = parameter.name.as_str();
            if name.is_empty() || seen_in_report.contains(&name) {
                continue;
            }
            seen_in_report.push(name);
            let count = counts.entry(name).or_insert(0);
            if *count == 0 {
                order.push(name);
            }
            *count += 1;
        }
    }

    order
        .into_iter()
        .filter(|name| counts.get(name).copied().unwrap_or(0) >= 2)
        .map(str::to_string)
        .collect()
}
