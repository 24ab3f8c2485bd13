//! Rule-based extraction of lab parameters from OCR text.
//!
//! Parsing is deterministic: three regular expressions are run over every line of the text,
//! the matches are de-duplicated by normalised parameter name, and each result is checked
//! against the reference table in [`crate::reference_ranges`].

use crate::constants::OPEN_RANGE_MAX;
use crate::reference_ranges::{
    classify_against, format_number, get_reference_range, normalize_parameter_name,
};
use api_shared::{Parameter, ParameterStatus};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

/// A raw match before it is checked against the reference table.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedParameter {
    pub name: String,
    pub value: f64,
    pub unit: String,
    /// Bounds parsed from the report's own reference column, if any.
    pub reference: Option<(f64, f64)>,
    pub raw_reference: String,
}

const NAME: &str = r"(?P<name>[A-Za-z][A-Za-z0-9 ()\-]*?)";
const VALUE: &str = r"(?P<value>[\d.]+)";
const UNIT: &str = r"(?P<unit>[a-zA-Z%×μµ][a-zA-Z0-9/%×⁶³μµ]*)";

/// `Hemoglobin: 11.2 g/dL (Reference: 13.0-17.0)`
static LABELLED: Lazy<Regex> = Lazy::new(|| {
    compile(&format!(
        r"(?i){NAME}[:\s]+{VALUE}\s*{UNIT}\s*(?:\((?:Reference|Ref|Normal)(?:\s+Range)?[:\s]*(?P<ref>[^)]+)\))?"
    ))
});

/// `Hemoglobin 11.2 g/dL Ref: 13.0-17.0`
static INLINE_REF: Lazy<Regex> = Lazy::new(|| {
    compile(&format!(
        r"(?i){NAME}[:\s]+{VALUE}\s*{UNIT}\s*(?:Ref(?:erence)?(?:\s+Range)?[:\s]*(?P<ref>[<>]?\s*[\d.]+(?:\s*[-–]\s*[\d.]+)?))?"
    ))
});

/// `Hemoglobin | 11.2 | g/dL | 13.0-17.0`, pipes or tabs.
static TABLE_ROW: Lazy<Regex> = Lazy::new(|| {
    compile(&format!(
        r"(?i){NAME}\s*[|\t]\s*{VALUE}\s*[|\t]\s*{UNIT}\s*[|\t]?\s*(?P<ref>[\d.\-–<> ]+)?"
    ))
});

static RANGE: Lazy<Regex> = Lazy::new(|| compile(r"^([\d.]+)\s*[-–]\s*([\d.]+)"));
static LESS_THAN: Lazy<Regex> = Lazy::new(|| compile(r"^<\s*([\d.]+)"));
static GREATER_THAN: Lazy<Regex> = Lazy::new(|| compile(r"^>\s*([\d.]+)"));
static SPACES: Lazy<Regex> = Lazy::new(|| compile(r" {2,}"));

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap()
}

/// Header labels that look like `Label: 12 Unit` but are not lab values.
const NON_PARAMETER_LABELS: [&str; 3] = ["reference", "normal", "result"];

/// A name containing any of these words is report metadata (`Report Date`, `Sample No`).
const METADATA_WORDS: [&str; 16] = [
    "age", "collected", "collection", "date", "id", "lab", "no", "page", "patient", "received",
    "registered", "report", "reported", "sample", "specimen", "visit",
];

const MONTH_NAMES: [&str; 24] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "sept", "oct", "nov", "dec",
    "january", "february", "march", "april", "june", "july", "august", "september", "october",
    "november", "december",
];

fn is_metadata_name(name: &str) -> bool {
    let lowered = name.to_lowercase();
    NON_PARAMETER_LABELS.contains(&lowered.as_str())
        || lowered
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| METADATA_WORDS.contains(&word))
}

/// `Jan`, `January`, `Sept`: the "unit" of a date such as `03 Jan 2026`.
fn is_month(unit: &str) -> bool {
    MONTH_NAMES.contains(&unit.to_lowercase().as_str())
}

/// Parses a reference string such as `13.0-17.0`, `< 200` or `>40` into bounds.
///
/// Open upper bounds use `999`; open lower bounds use `0`.
pub fn parse_reference_range(reference: &str) -> Option<(f64, f64)> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }
    if let Some(caps) = RANGE.captures(reference) {
        return Some((caps[1].parse().ok()?, caps[2].parse().ok()?));
    }
    if let Some(caps) = LESS_THAN.captures(reference) {
        return Some((0.0, caps[1].parse().ok()?));
    }
    if let Some(caps) = GREATER_THAN.captures(reference) {
        return Some((caps[1].parse().ok()?, OPEN_RANGE_MAX));
    }
    None
}

/// Runs every pattern over every line and returns the raw matches.
///
/// The first match for a normalised name wins. A later match for the same name and value may
/// still supply a reference range the first one lacked.
pub fn extract_parameters_from_text(text: &str) -> Vec<ParsedParameter> {
    let lines: Vec<String> = text
        .lines()
        .map(|line| SPACES.replace_all(line.trim_end_matches('\r'), " ").into_owned())
        .filter(|line| !line.trim().is_empty())
        .collect();

    let mut parameters: Vec<ParsedParameter> = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for pattern in [&*LABELLED, &*INLINE_REF, &*TABLE_ROW] {
        for line in &lines {
            for caps in pattern.captures_iter(line) {
                let Some(parsed) = parsed_from_captures(&caps) else {
                    continue;
                };
                let key = normalize_parameter_name(&parsed.name);
                match seen.get(&key) {
                    Some(&index) => {
                        let existing = &mut parameters[index];
                        if existing.reference.is_none()
                            && parsed.reference.is_some()
                            && existing.value == parsed.value
                        {
                            existing.reference = parsed.reference;
                            existing.raw_reference = parsed.raw_reference;
                        }
                    }
                    None => {
                        seen.insert(key, parameters.len());
                        parameters.push(parsed);
                    }
                }
            }
        }
    }

    parameters
}

fn parsed_from_captures(caps: &Captures<'_>) -> Option<ParsedParameter> {
    let name = caps.name("name")?.as_str().trim();
    if name.chars().count() < 2 {
        return None;
    }
    if is_metadata_name(name) {
        tracing::debug!("skipping report metadata '{}'", name);
        return None;
    }

    let raw_value = caps.name("value")?.as_str();
    let Ok(value) = raw_value.parse::<f64>() else {
        tracing::debug!("skipping '{}': unparseable value '{}'", name, raw_value);
        return None;
    };

    let unit = caps
        .name("unit")
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();
    if is_month(&unit) {
        tracing::debug!("skipping '{}': '{} {}' is a date", name, raw_value, unit);
        return None;
    }
    let raw_reference = caps
        .name("ref")
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();

    Some(ParsedParameter {
        name: name.to_string(),
        value,
        unit,
        reference: parse_reference_range(&raw_reference),
        raw_reference,
    })
}

/// Checks a raw match against the reference table and builds the final [`Parameter`].
///
/// Known parameters take their bounds, display name and category from the table. Unknown
/// parameters keep the report's own range when one was printed, and are otherwise reported
/// as normal with an unspecified range.
pub fn validate_and_enrich_parameter(parsed: &ParsedParameter) -> Parameter {
    let value = format_number(parsed.value);

    if let Some(range) = get_reference_range(&parsed.name) {
        let unit = if parsed.unit.is_empty() {
            range.unit.to_string()
        } else {
            parsed.unit.clone()
        };
        return Parameter {
            name: range.display_name.to_string(),
            value,
            unit,
            reference_range: range.display_range(),
            status: classify_against(parsed.value, range.min, range.max),
            category: range.category.to_string(),
            trend: None,
            explanation: None,
        };
    }

    let (reference_range, status) = match parsed.reference {
        Some((min, max)) => {
            let shown = if parsed.raw_reference.is_empty() {
                format!("{} - {}", format_number(min), format_number(max))
            } else {
                parsed.raw_reference.clone()
            };
            (shown, classify_against(parsed.value, min, max))
        }
        None => ("Not specified".to_string(), ParameterStatus::Normal),
    };

    Parameter {
        name: title_case(&parsed.name),
        value,
        unit: parsed.unit.clone(),
        reference_range,
        status,
        category: "Other".to_string(),
        trend: None,
        explanation: None,
    }
}

/// Parses OCR text into validated parameters. Returns an empty list when nothing matched.
pub fn parse_medical_report(text: &str) -> Vec<Parameter> {
    let parameters: Vec<Parameter> = extract_parameters_from_text(text)
        .iter()
        .map(validate_and_enrich_parameter)
        .collect();
    tracing::debug!("parsed {} parameters from report text", parameters.len());
    parameters
}

/// Capitalises the first letter of every word and lowercases the rest.
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut previous_is_letter = false;
    for ch in input.chars() {
        if ch.is_alphabetic() {
            if previous_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(ch);
            previous_is_letter = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patterns_compile() {
        Lazy::force(&LABELLED);
        Lazy::force(&INLINE_REF);
        Lazy::force(&TABLE_ROW);
    }

    #[test]
    fn parses_reference_range_forms() {
        assert_eq!(parse_reference_range("13.0-17.0"), Some((13.0, 17.0)));
        assert_eq!(parse_reference_range("70 – 100"), Some((70.0, 100.0)));
        assert_eq!(parse_reference_range("<200"), Some((0.0, 200.0)));
        assert_eq!(parse_reference_range("< 5.7"), Some((0.0, 5.7)));
        assert_eq!(parse_reference_range(">40"), Some((40.0, 999.0)));
        assert_eq!(parse_reference_range(""), None);
        assert_eq!(parse_reference_range("see note"), None);
    }

    #[test]
    fn parses_labelled_lines_with_reference() {
        let text = "Hemoglobin: 11.2 g/dL (Reference: 13.0-17.0)\nTotal Cholesterol: 245 mg/dL (Reference: <200)";
        let parsed = extract_parameters_from_text(text);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].name, "Hemoglobin");
        assert_eq!(parsed[0].value, 11.2);
        assert_eq!(parsed[0].unit, "g/dL");
        assert_eq!(parsed[0].reference, Some((13.0, 17.0)));
        assert_eq!(parsed[1].raw_reference, "<200");
        assert_eq!(parsed[1].reference, Some((0.0, 200.0)));
    }

    #[test]
    fn names_may_contain_digits_and_parentheses() {
        let parsed = extract_parameters_from_text("T3: 120 ng/dL\nSGPT (ALT): 32 U/L (Reference: 0-40)");
        let names: Vec<&str> = parsed.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["T3", "SGPT (ALT)"]);
    }

    #[test]
    fn inline_reference_backfills_first_match() {
        let parsed = extract_parameters_from_text("Lipase 62 U/L Ref: 13-60");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].reference, Some((13.0, 60.0)));
    }

    #[test]
    fn table_rows_with_pipes_and_tabs() {
        let parsed = extract_parameters_from_text("Lipase | 62 | U/L | 13-60\nAmylase\t40\tU/L\t28-100");
        assert_eq!(parsed.len(), 2);
        let find = |name: &str| parsed.iter().find(|p| p.name == name).unwrap();
        assert_eq!(find("Lipase").reference, Some((13.0, 60.0)));
        assert_eq!(find("Amylase").unit, "U/L");
        assert_eq!(find("Amylase").reference, Some((28.0, 100.0)));
    }

    #[test]
    fn duplicates_by_normalized_name_keep_first() {
        let parsed = extract_parameters_from_text("Hb: 11.2 g/dL\nHemoglobin: 12.9 g/dL");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].value, 11.2);
    }

    #[test]
    fn skips_header_labels_and_bad_values() {
        let parsed = extract_parameters_from_text("Age: 45 Years\nDate: 03 Jan 2026\nGlucose: 1.2.3 mg/dL");
        assert!(parsed.is_empty());
    }

    #[test]
    fn report_metadata_lines_are_not_parameters() {
        let header = "Report Date: 03 Jan 2026\nCollected On: 02 Jan 2026\nSample No: 4471 ABC\nPatient ID: 5521 XYZ\nPage No: 1 of 2";
        let body = "Hemoglobin: 11.2 g/dL (Reference: 13.0-17.0)";

        let with_header = parse_medical_report(&format!("{}\n{}", header, body));
        let names: Vec<&str> = with_header.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Hemoglobin"]);

        let body_only = parse_medical_report(body);
        assert_eq!(
            crate::score::calculate_health_clarity_score(&with_header),
            crate::score::calculate_health_clarity_score(&body_only)
        );
    }

    #[test]
    fn month_units_are_dates() {
        assert!(is_month("Jan"));
        assert!(is_month("september"));
        assert!(is_month("Sept"));
        assert!(!is_month("mg/dL"));
        assert!(!is_month("mmol"));
        assert!(!is_month("Marker"));
        assert!(parse_medical_report("Visit: 14 March 2026").is_empty());
    }

    #[test]
    fn metadata_words_match_whole_words_only() {
        assert!(is_metadata_name("Sample No"));
        assert!(is_metadata_name("Lab ID"));
        assert!(!is_metadata_name("Sodium (Na)"));
        assert!(!is_metadata_name("Total Protein"));
        assert!(!is_metadata_name("Glucose"));
        assert!(!is_metadata_name("Prothrombin Time"));
    }

    #[test]
    fn enriches_known_parameter_from_table() {
        let parsed = ParsedParameter {
            name: "LDL".into(),
            value: 165.0,
            unit: String::new(),
            reference: None,
            raw_reference: String::new(),
        };
        let p = validate_and_enrich_parameter(&parsed);
        assert_eq!(p.name, "LDL Cholesterol");
        assert_eq!(p.value, "165.0");
        assert_eq!(p.unit, "mg/dL");
        assert_eq!(p.reference_range, "< 100.0");
        assert_eq!(p.status, ParameterStatus::High);
        assert_eq!(p.category, "Lipid Profile");
    }

    #[test]
    fn known_parameter_with_open_upper_bound() {
        let parsed = ParsedParameter {
            name: "HDL".into(),
            value: 48.0,
            unit: "mg/dL".into(),
            reference: None,
            raw_reference: String::new(),
        };
        let p = validate_and_enrich_parameter(&parsed);
        assert_eq!(p.reference_range, "> 40.0");
        assert_eq!(p.status, ParameterStatus::Normal);
    }

    #[test]
    fn unknown_parameter_uses_printed_range() {
        let parsed = ParsedParameter {
            name: "lipase activity".into(),
            value: 62.0,
            unit: "U/L".into(),
            reference: Some((13.0, 60.0)),
            raw_reference: "13-60".into(),
        };
        let p = validate_and_enrich_parameter(&parsed);
        assert_eq!(p.name, "Lipase Activity");
        assert_eq!(p.reference_range, "13-60");
        assert_eq!(p.status, ParameterStatus::High);
        assert_eq!(p.category, "Other");
    }

    #[test]
    fn unknown_parameter_without_range_is_normal() {
        let parsed = ParsedParameter {
            name: "Lipase".into(),
            value: 62.0,
            unit: "U/L".into(),
            reference: None,
            raw_reference: String::new(),
        };
        let p = validate_and_enrich_parameter(&parsed);
        assert_eq!(p.reference_range, "Not specified");
        assert_eq!(p.status, ParameterStatus::Normal);
    }

    #[test]
    fn parses_sample_report_text() {
        let params = parse_medical_report(crate::demo::SAMPLE_REPORT_TEXT);
        let find = |name: &str| params.iter().find(|p| p.name == name);

        let hb = find("Hemoglobin").unwrap();
        assert_eq!(hb.status, ParameterStatus::Low);
        assert_eq!(hb.reference_range, "13.0 - 17.0");

        assert_eq!(find("Red Blood Cell Count").unwrap().unit, "×10⁶/μL");
        assert_eq!(find("Hematocrit").unwrap().status, ParameterStatus::Low);
        assert_eq!(find("HbA1c").unwrap().value, "5.6");
        assert_eq!(find("T3").unwrap().category, "Thyroid");
        assert_eq!(find("SGPT (ALT)").unwrap().status, ParameterStatus::Normal);
        assert_eq!(find("Vitamin D").unwrap().status, ParameterStatus::Low);
        assert!(find("Date").is_none());
        assert!(params.len() >= 25);
    }

    #[test]
    fn empty_text_yields_no_parameters() {
        assert!(parse_medical_report("").is_empty());
        assert!(parse_medical_report("COMPLETE BLOOD COUNT REPORT").is_empty());
    }

    #[test]
    fn title_case_matches_word_boundaries() {
        assert_eq!(title_case("lipase (serum)"), "Lipase (Serum)");
        assert_eq!(title_case("CRP-hs"), "Crp-Hs");
    }
}
