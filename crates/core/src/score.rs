//! Health Clarity Score.
//!
//! A 0-100 score describing how many values sit inside their reference ranges. The base is the
//! share of normal parameters; abnormal parameters then subtract a penalty proportional to
//! their severity weight (more for critical values), capped so that a single report cannot
//! lose more than [`MAX_PENALTY`] points to penalties.

use crate::analysis::{analyze_all_parameters, determine_severity_level, get_severity_color};
use api_shared::{HealthClarityScore, Parameter, ScoreSummary, ScoreTrend, SeverityLevel};

pub const MAX_PENALTY: f64 = 50.0;
const PENALTY_PER_WEIGHT: f64 = 5.0;
const CRITICAL_MULTIPLIER: f64 = 1.5;
/// Score movement (in points) below which the trend is reported as stable.
const SCORE_TREND_THRESHOLD: i32 = 3;

/// Computes the clarity score for a report's parameters.
///
/// An empty report scores 100 with low attention.
pub fn calculate_health_clarity_score(parameters: &[Parameter]) -> HealthClarityScore {
    if parameters.is_empty() {
        return HealthClarityScore {
            score: 100,
            severity_level: SeverityLevel::Low,
            severity_color: get_severity_color(SeverityLevel::Low).to_string(),
            parameters_in_range: 0,
            parameters_needing_attention: 0,
            total_parameters: 0,
        };
    }

    let results = analyze_all_parameters(parameters);
    let total = results.len();
    let normal = results
        .iter()
        .filter(|r| r.parameter.status.is_normal())
        .count();
    let abnormal = total - normal;

    let base = normal as f64 / total as f64 * 100.0;
    let penalty: f64 = results
        .iter()
        .filter(|r| !r.parameter.status.is_normal())
        .map(|r| {
            let penalty = r.severity_weight * PENALTY_PER_WEIGHT;
            if r.is_critical {
                penalty * CRITICAL_MULTIPLIER
            } else {
                penalty
            }
        })
        .sum();

    let score = (base - penalty.min(MAX_PENALTY))
        .clamp(0.0, 100.0)
        .round_ties_even() as u8;
    let severity = determine_severity_level(&results);

    HealthClarityScore {
        score,
        severity_level: severity,
        severity_color: get_severity_color(severity).to_string(),
        parameters_in_range: normal,
        parameters_needing_attention: abnormal,
        total_parameters: total,
    }
}

/// Compares two scores; a move of more than three points is a trend.
pub fn calculate_score_trend(current: u8, previous: Option<u8>) -> ScoreTrend {
    let Some(previous) = previous else {
        return ScoreTrend::Stable;
    };
    let diff = i32::from(current) - i32::from(previous);
    if diff > SCORE_TREND_THRESHOLD {
        ScoreTrend::Improving
    } else if diff < -SCORE_TREND_THRESHOLD {
        ScoreTrend::Declining
    } else {
        ScoreTrend::Stable
    }
}

pub fn get_score_interpretation(score: u8) -> &'static str {
    match score {
        85.. => "Most of your test values are within typical reference ranges.",
        70..=84 => "The majority of your test values are within reference ranges, with some requiring attention.",
        50..=69 => "Several test values are outside typical reference ranges. Consider consulting a healthcare provider.",
        _ => "Multiple test values require attention. Please consult with a healthcare professional.",
    }
}

/// Adds the plain-language interpretation and an optional trend to a score.
pub fn generate_score_summary(score: &HealthClarityScore, trend: Option<ScoreTrend>) -> ScoreSummary {
    ScoreSummary {
        score: score.score,
        severity_level: score.severity_level,
        severity_color: score.severity_color.clone(),
        parameters_in_range: score.parameters_in_range,
        parameters_needing_attention: score.parameters_needing_attention,
        total_parameters: score.total_parameters,
        interpretation: get_score_interpretation(score.score).to_string(),
        trend,
    }
}
