//! Static laboratory reference ranges.
//!
//! The table covers common blood count, lipid, metabolic, liver, thyroid, vitamin and
//! electrolyte parameters. Lookups go through [`normalize_parameter_name`], which maps the
//! many spellings found on printed reports ("Hb", "Haemoglobin", "HGB") onto a single key.
//!
//! Ranges are general adult values for educational use; they are not lab-specific.

use crate::constants::OPEN_RANGE_MAX;
use api_shared::ParameterStatus;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// A single reference range entry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReferenceRange {
    pub key: &'static str,
    pub min: f64,
    pub max: f64,
    pub unit: &'static str,
    pub category: &'static str,
    pub display_name: &'static str,
}

impl ReferenceRange {
    const fn new(
        key: &'static str,
        min: f64,
        max: f64,
        unit: &'static str,
        category: &'static str,
        display_name: &'static str,
    ) -> Self {
        Self {
            key,
            min,
            max,
            unit,
            category,
            display_name,
        }
    }

    /// Human readable range: `"13.0 - 17.0"`, `"< 200.0"` or `"> 40.0"`.
    pub fn display_range(&self) -> String {
        if self.max >= OPEN_RANGE_MAX {
            format!("> {}", format_number(self.min))
        } else if self.min <= 0.0 {
            format!("< {}", format_number(self.max))
        } else {
            format!("{} - {}", format_number(self.min), format_number(self.max))
        }
    }

    fn range_size(&self) -> f64 {
        if self.max > self.min {
            self.max - self.min
        } else {
            1.0
        }
    }
}

const BLOOD_COUNT: &str = "Blood Count";
const LIPID_PROFILE: &str = "Lipid Profile";
const METABOLIC: &str = "Metabolic";
const LIVER_FUNCTION: &str = "Liver Function";
const THYROID: &str = "Thyroid";
const VITAMINS: &str = "Vitamins";
const ELECTROLYTES: &str = "Electrolytes";

pub static REFERENCE_RANGES: &[ReferenceRange] = &[
    ReferenceRange::new("hemoglobin", 13.0, 17.0, "g/dL", BLOOD_COUNT, "Hemoglobin"),
    ReferenceRange::new("hematocrit", 38.0, 50.0, "%", BLOOD_COUNT, "Hematocrit"),
    ReferenceRange::new("rbc", 4.5, 5.5, "×10⁶/μL", BLOOD_COUNT, "Red Blood Cell Count"),
    ReferenceRange::new("wbc", 4.0, 11.0, "×10³/μL", BLOOD_COUNT, "White Blood Cell Count"),
    ReferenceRange::new("platelets", 150.0, 400.0, "×10³/μL", BLOOD_COUNT, "Platelet Count"),
    ReferenceRange::new("mcv", 80.0, 100.0, "fL", BLOOD_COUNT, "Mean Corpuscular Volume"),
    ReferenceRange::new("mch", 27.0, 33.0, "pg", BLOOD_COUNT, "Mean Corpuscular Hemoglobin"),
    ReferenceRange::new("mchc", 32.0, 36.0, "g/dL", BLOOD_COUNT, "MCHC"),
    ReferenceRange::new("total_cholesterol", 0.0, 200.0, "mg/dL", LIPID_PROFILE, "Total Cholesterol"),
    // Higher is better
    ReferenceRange::new("hdl_cholesterol", 40.0, 999.0, "mg/dL", LIPID_PROFILE, "HDL Cholesterol"),
    ReferenceRange::new("ldl_cholesterol", 0.0, 100.0, "mg/dL", LIPID_PROFILE, "LDL Cholesterol"),
    ReferenceRange::new("triglycerides", 0.0, 150.0, "mg/dL", LIPID_PROFILE, "Triglycerides"),
    ReferenceRange::new("vldl", 0.0, 30.0, "mg/dL", LIPID_PROFILE, "VLDL"),
    ReferenceRange::new("fasting_glucose", 70.0, 100.0, "mg/dL", METABOLIC, "Fasting Glucose"),
    ReferenceRange::new("random_glucose", 70.0, 140.0, "mg/dL", METABOLIC, "Random Glucose"),
    ReferenceRange::new("hba1c", 0.0, 5.7, "%", METABOLIC, "HbA1c"),
    ReferenceRange::new("creatinine", 0.7, 1.3, "mg/dL", METABOLIC, "Creatinine"),
    ReferenceRange::new("blood_urea_nitrogen", 7.0, 20.0, "mg/dL", METABOLIC, "Blood Urea Nitrogen"),
    ReferenceRange::new("uric_acid", 3.5, 7.2, "mg/dL", METABOLIC, "Uric Acid"),
    ReferenceRange::new("sgpt_alt", 0.0, 40.0, "U/L", LIVER_FUNCTION, "SGPT (ALT)"),
    ReferenceRange::new("sgot_ast", 0.0, 40.0, "U/L", LIVER_FUNCTION, "SGOT (AST)"),
    ReferenceRange::new("alkaline_phosphatase", 44.0, 147.0, "U/L", LIVER_FUNCTION, "Alkaline Phosphatase"),
    ReferenceRange::new("total_bilirubin", 0.1, 1.2, "mg/dL", LIVER_FUNCTION, "Total Bilirubin"),
    ReferenceRange::new("direct_bilirubin", 0.0, 0.3, "mg/dL", LIVER_FUNCTION, "Direct Bilirubin"),
    ReferenceRange::new("total_protein", 6.0, 8.3, "g/dL", LIVER_FUNCTION, "Total Protein"),
    ReferenceRange::new("albumin", 3.5, 5.0, "g/dL", LIVER_FUNCTION, "Albumin"),
    ReferenceRange::new("tsh", 0.4, 4.0, "mIU/L", THYROID, "TSH"),
    ReferenceRange::new("t3", 80.0, 200.0, "ng/dL", THYROID, "T3"),
    ReferenceRange::new("t4", 5.0, 12.0, "μg/dL", THYROID, "T4"),
    ReferenceRange::new("free_t3", 2.3, 4.2, "pg/mL", THYROID, "Free T3"),
    ReferenceRange::new("free_t4", 0.8, 1.8, "ng/dL", THYROID, "Free T4"),
    ReferenceRange::new("vitamin_d", 30.0, 100.0, "ng/mL", VITAMINS, "Vitamin D"),
    ReferenceRange::new("vitamin_b12", 200.0, 900.0, "pg/mL", VITAMINS, "Vitamin B12"),
    ReferenceRange::new("folate", 3.0, 17.0, "ng/mL", VITAMINS, "Folate"),
    ReferenceRange::new("iron", 60.0, 170.0, "μg/dL", VITAMINS, "Serum Iron"),
    ReferenceRange::new("ferritin", 12.0, 300.0, "ng/mL", VITAMINS, "Ferritin"),
    ReferenceRange::new("calcium", 8.5, 10.5, "mg/dL", VITAMINS, "Calcium"),
    ReferenceRange::new("sodium", 136.0, 145.0, "mEq/L", ELECTROLYTES, "Sodium"),
    ReferenceRange::new("potassium", 3.5, 5.0, "mEq/L", ELECTROLYTES, "Potassium"),
    ReferenceRange::new("chloride", 98.0, 106.0, "mEq/L", ELECTROLYTES, "Chloride"),
];

/// Alternative spellings mapped to table keys.
pub static PARAMETER_ALIASES: &[(&str, &str)] = &[
    ("hb", "hemoglobin"),
    ("haemoglobin", "hemoglobin"),
    ("hgb", "hemoglobin"),
    ("wbc count", "wbc"),
    ("white blood cells", "wbc"),
    ("white blood cell count", "wbc"),
    ("leucocytes", "wbc"),
    ("leukocytes", "wbc"),
    ("total wbc", "wbc"),
    ("rbc count", "rbc"),
    ("red blood cells", "rbc"),
    ("red blood cell count", "rbc"),
    ("erythrocytes", "rbc"),
    ("total rbc", "rbc"),
    ("plt", "platelets"),
    ("platelet count", "platelets"),
    ("thrombocytes", "platelets"),
    ("platelet", "platelets"),
    ("hct", "hematocrit"),
    ("pcv", "hematocrit"),
    ("packed cell volume", "hematocrit"),
    ("cholesterol", "total_cholesterol"),
    ("chol", "total_cholesterol"),
    ("tc", "total_cholesterol"),
    ("hdl", "hdl_cholesterol"),
    ("hdl-c", "hdl_cholesterol"),
    ("good cholesterol", "hdl_cholesterol"),
    ("ldl", "ldl_cholesterol"),
    ("ldl-c", "ldl_cholesterol"),
    ("bad cholesterol", "ldl_cholesterol"),
    ("tg", "triglycerides"),
    ("trigs", "triglycerides"),
    ("triglyceride", "triglycerides"),
    ("glucose fasting", "fasting_glucose"),
    ("fbs", "fasting_glucose"),
    ("fasting blood sugar", "fasting_glucose"),
    ("glucose", "fasting_glucose"),
    ("blood glucose", "fasting_glucose"),
    ("rbs", "random_glucose"),
    ("random blood sugar", "random_glucose"),
    ("pp glucose", "random_glucose"),
    ("postprandial glucose", "random_glucose"),
    ("glycated hemoglobin", "hba1c"),
    ("a1c", "hba1c"),
    ("glycosylated hemoglobin", "hba1c"),
    ("creat", "creatinine"),
    ("serum creatinine", "creatinine"),
    ("bun", "blood_urea_nitrogen"),
    ("urea", "blood_urea_nitrogen"),
    ("blood urea", "blood_urea_nitrogen"),
    ("urea nitrogen", "blood_urea_nitrogen"),
    ("alt", "sgpt_alt"),
    ("sgpt", "sgpt_alt"),
    ("alanine transaminase", "sgpt_alt"),
    ("alanine aminotransferase", "sgpt_alt"),
    ("ast", "sgot_ast"),
    ("sgot", "sgot_ast"),
    ("aspartate transaminase", "sgot_ast"),
    ("aspartate aminotransferase", "sgot_ast"),
    ("alp", "alkaline_phosphatase"),
    ("alk phos", "alkaline_phosphatase"),
    ("bilirubin", "total_bilirubin"),
    ("t. bilirubin", "total_bilirubin"),
    ("total bil", "total_bilirubin"),
    ("d. bilirubin", "direct_bilirubin"),
    ("conjugated bilirubin", "direct_bilirubin"),
    ("thyroid stimulating hormone", "tsh"),
    ("thyrotropin", "tsh"),
    ("triiodothyronine", "t3"),
    ("thyroxine", "t4"),
    ("ft3", "free_t3"),
    ("ft4", "free_t4"),
    ("vit d", "vitamin_d"),
    ("25-oh vitamin d", "vitamin_d"),
    ("25 hydroxy vitamin d", "vitamin_d"),
    ("vit b12", "vitamin_b12"),
    ("b12", "vitamin_b12"),
    ("cobalamin", "vitamin_b12"),
    ("folic acid", "folate"),
    ("serum iron", "iron"),
    ("serum ferritin", "ferritin"),
    ("na", "sodium"),
    ("na+", "sodium"),
    ("serum sodium", "sodium"),
    ("k", "potassium"),
    ("k+", "potassium"),
    ("serum potassium", "potassium"),
    ("cl", "chloride"),
    ("serum chloride", "chloride"),
    ("ca", "calcium"),
    ("serum calcium", "calcium"),
    ("fe", "iron"),
];

/// Aliases shorter than this only match exactly; "k" or "tc" inside a longer name is noise.
const MIN_PARTIAL_ALIAS_LEN: usize = 3;

static BY_KEY: Lazy<HashMap<&'static str, &'static ReferenceRange>> =
    Lazy::new(|| REFERENCE_RANGES.iter().map(|r| (r.key, r)).collect());

static BY_DISPLAY_NAME: Lazy<HashMap<String, &'static str>> = Lazy::new(|| {
    REFERENCE_RANGES
        .iter()
        .map(|r| (r.display_name.to_lowercase(), r.key))
        .collect()
});

static ALIASES: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| PARAMETER_ALIASES.iter().copied().collect());

/// Maps a printed parameter name onto a reference table key.
///
/// Matching order: table key (spaces and hyphens read as underscores), display name,
/// exact alias, then the longest alias that appears as whole words inside the name.
/// Names that match nothing come back lowercased with underscores.
pub fn normalize_parameter_name(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let underscored = lowered.replace([' ', '-'], "_");

    if BY_KEY.contains_key(underscored.as_str()) {
        return underscored;
    }
    if let Some(key) = BY_DISPLAY_NAME.get(&lowered) {
        return (*key).to_string();
    }
    if let Some(key) = ALIASES.get(lowered.as_str()) {
        return (*key).to_string();
    }

    PARAMETER_ALIASES
        .iter()
        .filter(|(alias, _)| alias.chars().count() >= MIN_PARTIAL_ALIAS_LEN)
        .filter(|(alias, _)| contains_whole_words(&lowered, alias))
        .max_by_key(|(alias, _)| alias.len())
        .map(|(_, key)| (*key).to_string())
        .unwrap_or(underscored)
}

fn contains_whole_words(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Looks up the reference range for a printed parameter name.
pub fn get_reference_range(name: &str) -> Option<&'static ReferenceRange> {
    BY_KEY.get(normalize_parameter_name(name).as_str()).copied()
}

/// Classifies `value` against the table; `None` when the parameter is unknown.
pub fn classify_value(name: &str, value: f64) -> Option<ParameterStatus> {
    let range = get_reference_range(name)?;
    Some(classify_against(value, range.min, range.max))
}

/// Classifies `value` against explicit bounds (inclusive).
pub fn classify_against(value: f64, min: f64, max: f64) -> ParameterStatus {
    if value < min {
        ParameterStatus::Low
    } else if value > max {
        ParameterStatus::High
    } else {
        ParameterStatus::Normal
    }
}

/// Relative importance of a category when scoring.
pub fn category_weight(category: &str) -> f64 {
    match category {
        BLOOD_COUNT => 1.5,
        LIPID_PROFILE => 1.2,
        METABOLIC => 1.3,
        LIVER_FUNCTION => 1.4,
        THYROID => 1.3,
        VITAMINS => 1.0,
        ELECTROLYTES => 1.5,
        _ => 1.0,
    }
}

/// Severity weight used by the clarity score.
///
/// Zero for unknown or normal parameters. Otherwise the category weight, scaled up by how far
/// the value sits outside the range (in multiples of the range width, capped at 2).
///
/// # Arguments
///
/// * `name` - Printed parameter name.
/// * `status` - Status already assigned to the value.
/// * `value` - Measured value; without it only the category weight is returned.
pub fn get_severity_weight(name: &str, status: ParameterStatus, value: Option<f64>) -> f64 {
    let Some(range) = get_reference_range(name) else {
        return 0.0;
    };
    if status.is_normal() {
        return 0.0;
    }

    let base = category_weight(range.category);
    let Some(value) = value else {
        return base;
    };

    let deviation = match status {
        ParameterStatus::Low => (range.min - value) / range.range_size(),
        _ => (value - range.max) / range.range_size(),
    };
    base * (deviation.abs().min(2.0) + 1.0)
}

/// Formats a number the way reports print it: whole numbers keep one decimal place.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}
