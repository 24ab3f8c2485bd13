//! Deterministic analysis of extracted parameters.
//!
//! Each parameter is compared against its reference range to get a deviation and a severity
//! weight. The per-parameter results feed [`determine_severity_level`] and the clarity score.

use crate::constants::NEUTRAL_COLOR;
use crate::reference_ranges::{get_reference_range, get_severity_weight};
use api_shared::{Parameter, ParameterStatus, ParameterTrend, SeverityLevel};
use std::collections::{BTreeMap, HashMap};

/// Deviation beyond which a value counts as critical (50 % past the violated bound).
const CRITICAL_DEVIATION: f64 = 0.5;

/// Relative change between reports that counts as a trend.
const TREND_THRESHOLD: f64 = 0.05;

/// Outcome of analysing a single parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisResult<'a> {
    pub parameter: &'a Parameter,
    /// Distance past the violated bound, as a fraction of that bound.
    pub deviation: f64,
    pub severity_weight: f64,
    pub is_critical: bool,
}

/// Analyses one parameter against the reference table.
///
/// Parameters with a non-numeric value carry no weight. Parameters missing from the table
/// weigh 1.0 when abnormal and are never critical.
pub fn analyze_parameter(parameter: &Parameter) -> AnalysisResult<'_> {
    let Some(value) = parameter.numeric_value() else {
        return AnalysisResult {
            parameter,
            deviation: 0.0,
            severity_weight: 0.0,
            is_critical: false,
        };
    };

    match get_reference_range(&parameter.name) {
        Some(range) => {
            let deviation = match parameter.status {
                ParameterStatus::Low if range.min > 0.0 => (range.min - value) / range.min,
                ParameterStatus::High if range.max > 0.0 => (value - range.max) / range.max,
                _ => 0.0,
            };
            AnalysisResult {
                parameter,
                deviation,
                severity_weight: get_severity_weight(&parameter.name, parameter.status, Some(value)),
                is_critical: deviation.abs() > CRITICAL_DEVIATION,
            }
        }
        None => AnalysisResult {
            parameter,
            deviation: 0.0,
            severity_weight: if parameter.status.is_normal() { 0.0 } else { 1.0 },
            is_critical: false,
        },
    }
}

pub fn analyze_all_parameters(parameters: &[Parameter]) -> Vec<AnalysisResult<'_>> {
    parameters.iter().map(analyze_parameter).collect()
}

/// Overall severity of a set of analysed parameters.
///
/// High when anything is critical or the mean weight exceeds 2; Moderate when two or more
/// parameters are abnormal or the mean weight exceeds 1; Low otherwise, including when empty.
pub fn determine_severity_level(results: &[AnalysisResult<'_>]) -> SeverityLevel {
    if results.is_empty() {
        return SeverityLevel::Low;
    }

    let critical = results.iter().filter(|r| r.is_critical).count();
    let abnormal = results
        .iter()
        .filter(|r| !r.parameter.status.is_normal())
        .count();
    let mean_weight =
        results.iter().map(|r| r.severity_weight).sum::<f64>() / results.len() as f64;

    if critical > 0 || mean_weight > 2.0 {
        SeverityLevel::High
    } else if abnormal >= 2 || mean_weight > 1.0 {
        SeverityLevel::Moderate
    } else {
        SeverityLevel::Low
    }
}

pub fn get_severity_color(severity: SeverityLevel) -> &'static str {
    match severity {
        SeverityLevel::Low => "#2E7D5B",
        SeverityLevel::Moderate => "#C89B3C",
        SeverityLevel::High => "#D64545",
    }
}

/// Looks up a colour by severity label, falling back to the neutral colour.
pub fn severity_color_for_label(label: &str) -> &'static str {
    SeverityLevel::from_label(label)
        .map(get_severity_color)
        .unwrap_or(NEUTRAL_COLOR)
}

/// Direction of change from `previous` to `current`; a move of more than 5 % is a trend.
pub fn calculate_parameter_trend(current: f64, previous: Option<f64>) -> ParameterTrend {
    let Some(previous) = previous else {
        return ParameterTrend::Stable;
    };
    if previous == 0.0 {
        return ParameterTrend::Stable;
    }

    let change = (current - previous) / previous.abs();
    if change > TREND_THRESHOLD {
        ParameterTrend::Up
    } else if change < -TREND_THRESHOLD {
        ParameterTrend::Down
    } else {
        ParameterTrend::Stable
    }
}

/// Sets `trend` on each current parameter by comparing with the previous report's value of
/// the same name. Without a previous report the parameters are returned unchanged.
pub fn enrich_parameters_with_trends(
    current: Vec<Parameter>,
    previous: Option<&[Parameter]>,
) -> Vec<Parameter> {
    let Some(previous) = previous.filter(|p| !p.is_empty()) else {
        return current;
    };

    let previous_values: HashMap<&str, f64> = previous
        .iter()
        .filter_map(|p| p.numeric_value().map(|v| (p.name.as_str(), v)))
        .collect();

    current
        .into_iter()
        .map(|mut parameter| {
            if let Some(value) = parameter.numeric_value() {
                let prior = previous_values.get(parameter.name.as_str()).copied();
                parameter.trend = Some(calculate_parameter_trend(value, prior));
            }
            parameter
        })
        .collect()
}

pub fn get_abnormal_parameters(parameters: &[Parameter]) -> Vec<Parameter> {
    parameters
        .iter()
        .filter(|p| !p.status.is_normal())
        .cloned()
        .collect()
}

pub fn get_normal_parameters(parameters: &[Parameter]) -> Vec<Parameter> {
    parameters
        .iter()
        .filter(|p| p.status.is_normal())
        .cloned()
        .collect()
}

/// Groups parameters by category; a blank category is grouped as "Other".
pub fn group_parameters_by_category(parameters: &[Parameter]) -> BTreeMap<String, Vec<Parameter>> {
    let mut grouped: BTreeMap<String, Vec<Parameter>> = BTreeMap::new();
    for parameter in parameters {
        let category = if parameter.category.trim().is_empty() {
            "Other".to_string()
        } else {
            parameter.category.clone()
        };
        grouped.entry(category).or_default().push(parameter.clone());
    }
    grouped
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn param(name: &str, value: &str, status: ParameterStatus, category: &str) -> Parameter {
        Parameter {
            name: name.into(),
            value: value.into(),
            unit: String::new(),
            reference_range: String::new(),
            status,
            category: category.into(),
            trend: None,
            explanation: None,
        }
    }

    #[test]
    fn deviation_is_relative_to_violated_bound() {
        let hb = param("Hemoglobin", "11.7", ParameterStatus::Low, "Blood Count");
        let r = analyze_parameter(&hb);
        assert!((r.deviation - 0.1).abs() < 1e-9);
        assert!(!r.is_critical);

        let ldl = param("LDL Cholesterol", "165", ParameterStatus::High, "Lipid Profile");
        let r = analyze_parameter(&ldl);
        assert!((r.deviation - 0.65).abs() < 1e-9);
        assert!(r.is_critical);
    }

    #[test]
    fn low_status_with_zero_lower_bound_has_no_deviation() {
        let ldl = param("LDL", "-5", ParameterStatus::Low, "Lipid Profile");
        assert_eq!(analyze_parameter(&ldl).deviation, 0.0);
    }

    #[test]
    fn unknown_parameters_weigh_one_when_abnormal() {
        let abnormal = param("Lipase", "90", ParameterStatus::High, "Other");
        let r = analyze_parameter(&abnormal);
        assert_eq!(r.severity_weight, 1.0);
        assert!(!r.is_critical);

        let normal = param("Lipase", "30", ParameterStatus::Normal, "Other");
        assert_eq!(analyze_parameter(&normal).severity_weight, 0.0);
    }

    #[test]
    fn non_numeric_values_carry_no_weight() {
        let p = param("Hemoglobin", "n/a", ParameterStatus::Low, "Blood Count");
        let r = analyze_parameter(&p);
        assert_eq!(r.severity_weight, 0.0);
        assert!(!r.is_critical);
    }

    #[test]
    fn severity_levels() {
        assert_eq!(determine_severity_level(&[]), SeverityLevel::Low);

        let all_normal = vec![
            param("Hemoglobin", "14", ParameterStatus::Normal, "Blood Count"),
            param("TSH", "2.5", ParameterStatus::Normal, "Thyroid"),
        ];
        assert_eq!(
            determine_severity_level(&analyze_all_parameters(&all_normal)),
            SeverityLevel::Low
        );

        let two_mild = vec![
            param("Hemoglobin", "12.5", ParameterStatus::Low, "Blood Count"),
            param("Vitamin D", "28", ParameterStatus::Low, "Vitamins"),
            param("TSH", "2.5", ParameterStatus::Normal, "Thyroid"),
            param("Creatinine", "1.0", ParameterStatus::Normal, "Metabolic"),
        ];
        assert_eq!(
            determine_severity_level(&analyze_all_parameters(&two_mild)),
            SeverityLevel::Moderate
        );

        let critical = vec![param("LDL", "165", ParameterStatus::High, "Lipid Profile")];
        assert_eq!(
            determine_severity_level(&analyze_all_parameters(&critical)),
            SeverityLevel::High
        );
    }

    #[test]
    fn severity_colors() {
        assert_eq!(get_severity_color(SeverityLevel::Low), "#2E7D5B");
        assert_eq!(get_severity_color(SeverityLevel::Moderate), "#C89B3C");
        assert_eq!(get_severity_color(SeverityLevel::High), "#D64545");
        assert_eq!(severity_color_for_label("High Attention"), "#D64545");
        assert_eq!(severity_color_for_label("unknown"), "#5E6C7A");
    }

    #[test]
    fn parameter_trend_uses_five_percent_threshold() {
        assert_eq!(calculate_parameter_trend(10.0, None), ParameterTrend::Stable);
        assert_eq!(calculate_parameter_trend(10.0, Some(0.0)), ParameterTrend::Stable);
        assert_eq!(calculate_parameter_trend(10.6, Some(10.0)), ParameterTrend::Up);
        assert_eq!(calculate_parameter_trend(9.4, Some(10.0)), ParameterTrend::Down);
        assert_eq!(calculate_parameter_trend(10.5, Some(10.0)), ParameterTrend::Stable);
    }

    #[test]
    fn enrich_sets_trends_by_name() {
        let previous = vec![
            param("Hemoglobin", "12.0", ParameterStatus::Low, "Blood Count"),
            param("TSH", "2.0", ParameterStatus::Normal, "Thyroid"),
        ];
        let current = vec![
            param("Hemoglobin", "11.0", ParameterStatus::Low, "Blood Count"),
            param("TSH", "2.05", ParameterStatus::Normal, "Thyroid"),
            param("Vitamin D", "18", ParameterStatus::Low, "Vitamins"),
        ];
        let enriched = enrich_parameters_with_trends(current.clone(), Some(previous.as_slice()));
        assert_eq!(enriched[0].trend, Some(ParameterTrend::Down));
        assert_eq!(enriched[1].trend, Some(ParameterTrend::Stable));
        assert_eq!(enriched[2].trend, Some(ParameterTrend::Stable));

        let untouched = enrich_parameters_with_trends(current.clone(), None);
        assert!(untouched.iter().all(|p| p.trend.is_none()));
        let untouched = enrich_parameters_with_trends(current, Some(&[][..]));
        assert!(untouched.iter().all(|p| p.trend.is_none()));
    }

    #[test]
    fn filters_and_grouping() {
        let params = vec![
            param("Hemoglobin", "11.2", ParameterStatus::Low, "Blood Count"),
            param("WBC", "7.5", ParameterStatus::Normal, "Blood Count"),
            param("Lipase", "30", ParameterStatus::Normal, ""),
        ];
        assert_eq!(get_abnormal_parameters(&params).len(), 1);
        assert_eq!(get_normal_parameters(&params).len(), 2);

        let grouped = group_parameters_by_category(&params);
        assert_eq!(grouped["Blood Count"].len(), 2);
        assert_eq!(grouped["Other"][0].name, "Lipase");
    }
}
