//! Plain-language parameter explanations.
//!
//! Configured LLM providers are asked in order; when none is configured or all of them fail the
//! built-in educational text is used. Every response carries the same disclaimer.

use crate::constants::EXPLANATION_DISCLAIMER;
use crate::llm::ExplanationProvider;
use api_shared::{ExplainReq, ExplainRes};
use std::sync::Arc;

const AI_EDUCATIONAL_CONTEXT: &str = "Generated with AI assistance for educational purposes.";

struct StaticExplanation {
    key: &'static str,
    description: &'static str,
    low: Option<&'static str>,
    high: Option<&'static str>,
    context: &'static str,
}

static STATIC_EXPLANATIONS: &[StaticExplanation] = &[
    StaticExplanation {
        key: "hemoglobin",
        description: "Hemoglobin is a protein in red blood cells that carries oxygen from the lungs to all parts of the body.",
        low: Some("Lower hemoglobin levels may mean less oxygen is being delivered to tissues. This can be influenced by iron intake, hydration, or other factors."),
        high: Some("Higher hemoglobin levels mean more oxygen-carrying capacity. This can occur with dehydration or living at high altitudes."),
        context: "Iron-rich foods include red meat, spinach, and beans. Vitamin C helps iron absorption.",
    },
    StaticExplanation {
        key: "total_cholesterol",
        description: "Cholesterol is a waxy substance found in blood. It's used to build healthy cells but elevated levels may affect cardiovascular health.",
        low: Some("Very low cholesterol is uncommon and may have various causes."),
        high: Some("Elevated cholesterol levels are influenced by diet, exercise, and genetics. Regular monitoring is recommended."),
        context: "Heart-healthy diets emphasize fruits, vegetables, whole grains, and lean proteins.",
    },
    StaticExplanation {
        key: "ldl_cholesterol",
        description: "LDL cholesterol carries cholesterol to cells. It's often discussed in cardiovascular health contexts.",
        low: None,
        high: Some("Elevated LDL levels are a commonly monitored cardiovascular marker."),
        context: "Lifestyle factors like diet and exercise can influence LDL levels.",
    },
    StaticExplanation {
        key: "hdl_cholesterol",
        description: "HDL cholesterol helps transport cholesterol away from arteries to the liver.",
        low: Some("Lower HDL levels are a marker sometimes discussed in cardiovascular health."),
        high: Some("Higher HDL levels are generally considered favorable for cardiovascular health."),
        context: "Regular physical activity may help maintain HDL levels.",
    },
    StaticExplanation {
        key: "vitamin_d",
        description: "Vitamin D supports bone health, immune function, and various body processes.",
        low: Some("Lower vitamin D levels are common, especially in regions with limited sunlight."),
        high: None,
        context: "Sources include sunlight exposure, fatty fish, fortified foods, and supplements as recommended by healthcare providers.",
    },
    StaticExplanation {
        key: "fasting_glucose",
        description: "Fasting glucose measures blood sugar levels after not eating for at least 8 hours.",
        low: None,
        high: Some("Elevated fasting glucose is a marker monitored in metabolic health assessments."),
        context: "Blood sugar is influenced by diet, physical activity, and overall metabolic health.",
    },
    StaticExplanation {
        key: "hba1c",
        description: "HbA1c reflects average blood sugar levels over the past 2-3 months.",
        low: None,
        high: Some("Elevated HbA1c indicates higher average blood sugar over time."),
        context: "This marker provides a longer-term view compared to single glucose measurements.",
    },
];

static DEFAULT_EXPLANATION: StaticExplanation = StaticExplanation {
    key: "default",
    description: "This parameter is measured to assess specific aspects of health.",
    low: None,
    high: None,
    context: "Healthcare providers use reference ranges to evaluate whether values fall within typical limits. Individual factors may affect interpretation.",
};

static CATEGORY_EXPLANATIONS: &[(&str, &str)] = &[
    ("Blood Count", "Blood count tests measure different components of blood including red cells, white cells, and platelets. These help assess overall health and detect various conditions."),
    ("Lipid Profile", "Lipid tests measure fats in the blood, including cholesterol and triglycerides. These are commonly used to assess cardiovascular health factors."),
    ("Metabolic", "Metabolic tests evaluate how the body processes nutrients and energy, including blood sugar levels and organ function."),
    ("Liver Function", "Liver function tests measure enzymes and proteins to assess liver health and function."),
    ("Thyroid", "Thyroid tests measure hormones that regulate metabolism, energy, and many body functions."),
    ("Vitamins", "Vitamin tests measure nutrient levels that are essential for various body functions and overall health."),
    ("Electrolytes", "Electrolyte tests measure minerals in the blood that help regulate nerve and muscle function, hydration, and pH balance."),
];

const DEFAULT_CATEGORY_EXPLANATION: &str =
    "These tests measure specific health markers to provide insights into body function.";

/// Built-in explanation: `(explanation, educational_context)`.
///
/// The lookup key is the lowercased name with spaces replaced by underscores. The status
/// sentence is appended only when the entry has one for that status.
pub fn get_static_explanation(parameter_name: &str, status: &str) -> (String, String) {
    let key = parameter_name.trim().to_lowercase().replace(' ', "_");
    let entry = STATIC_EXPLANATIONS
        .iter()
        .find(|e| e.key == key)
        .unwrap_or(&DEFAULT_EXPLANATION);

    let status_text = match status.trim().to_lowercase().as_str() {
        "low" => entry.low,
        "high" => entry.high,
        _ => None,
    };
    let explanation = match status_text {
        Some(text) => format!("{} {}", entry.description, text),
        None => entry.description.to_string(),
    };
    (explanation, entry.context.to_string())
}

pub fn get_category_explanation(category: &str) -> &'static str {
    CATEGORY_EXPLANATIONS
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, text)| *text)
        .unwrap_or(DEFAULT_CATEGORY_EXPLANATION)
}

/// Answers explanation requests from the configured providers with a static fallback.
#[derive(Clone, Default)]
pub struct Explainer {
    providers: Vec<Arc<dyn ExplanationProvider>>,
}

impl Explainer {
    pub fn new(providers: Vec<Arc<dyn ExplanationProvider>>) -> Self {
        Self { providers }
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub async fn generate_explanation(&self, request: &ExplainReq) -> ExplainRes {
        let (explanation, educational_context) = match self.ask_providers(request).await {
            Some(text) => (text, AI_EDUCATIONAL_CONTEXT.to_string()),
            None => get_static_explanation(&request.parameter_name, &request.status),
        };

        ExplainRes {
            parameter_name: request.parameter_name.clone(),
            explanation,
            educational_context,
            category_context: request
                .category
                .as_deref()
                .map(|c| get_category_explanation(c).to_string()),
            disclaimer: EXPLANATION_DISCLAIMER.to_string(),
        }
    }

    async fn ask_providers(&self, request: &ExplainReq) -> Option<String> {
        for provider in &self.providers {
            match provider.explain(request).await {
                Ok(text) if !text.trim().is_empty() => {
                    tracing::debug!("explanation for '{}' from {}", request.parameter_name, provider.name());
                    return Some(text.trim().to_string());
                }
                Ok(_) => tracing::warn!("{} returned an empty explanation", provider.name()),
                Err(e) => tracing::warn!("{} explanation failed: {:?}", provider.name(), e),
            }
        }
        None
    }
}
