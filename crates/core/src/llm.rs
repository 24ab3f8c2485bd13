//! LLM clients used for vision extraction and plain-language explanations.
//!
//! Two providers are supported:
//! - **OpenRouter** (chat completions): extracts parameters from report images and writes short
//!   explanations.
//! - **Ollama** (`/api/generate`): local explanations only.
//!
//! Only parameter names, statuses and trends are sent when asking for an explanation; measured
//! values never leave the process through this path. Report images are only sent to OpenRouter
//! when it has been configured explicitly.

use crate::config::{OllamaSettings, OpenRouterSettings};
use crate::parser::{parse_reference_range, ParsedParameter};
use crate::{ReportError, ReportResult};
use api_shared::ExplainReq;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

const EXTRACTION_TIMEOUT: Duration = Duration::from_secs(60);
const EXPLANATION_TIMEOUT: Duration = Duration::from_secs(30);
const APP_REFERER: &str = "https://swasthya-saathi.app";
const ERROR_BODY_PREVIEW: usize = 300;

const EXTRACTION_PROMPT: &str = r#"Analyze this medical test report image and extract all test parameters.

For each parameter, provide:
- name: The parameter name (e.g., "Hemoglobin", "Total Cholesterol")
- value: The numeric value
- unit: The measurement unit
- reference_range: The reference/normal range shown

Return the data as a JSON object with this structure:
{
  "parameters": [
    {
      "name": "Parameter Name",
      "value": "12.5",
      "unit": "g/dL",
      "reference_range": "13.0 - 17.0"
    }
  ],
  "report_date": "extracted date if visible",
  "lab_name": "lab name if visible"
}

Only extract parameters that are clearly visible. Be precise with values and units.
If you cannot extract data reliably, return {"parameters": [], "error": "Could not extract data"}"#;

/// Extracts lab parameters straight from a report image.
#[async_trait]
pub trait VisionExtractor: Send + Sync {
    async fn extract_parameters(&self, bytes: &[u8], media_type: &str) -> ReportResult<AiExtraction>;
}

/// Produces a plain-language explanation for a parameter.
#[async_trait]
pub trait ExplanationProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn explain(&self, request: &ExplainReq) -> ReportResult<String>;
}

/// Parameters as returned by the vision model.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AiExtraction {
    #[serde(default)]
    pub parameters: Vec<AiParameter>,
    #[serde(default)]
    pub report_date: Option<String>,
    #[serde(default)]
    pub lab_name: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct AiParameter {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub unit: String,
    #[serde(default, alias = "referenceRange")]
    pub reference_range: String,
}

impl AiParameter {
    /// Converts the model's answer into a parser result. Returns `None` for unnamed entries or
    /// values that are still not numbers after sanitising.
    pub fn to_parsed(&self) -> Option<ParsedParameter> {
        let name = self.name.trim();
        if name.is_empty() {
            return None;
        }

        let raw = match &self.value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        let sanitized = sanitize_value(&raw);
        let value = match sanitized.parse::<f64>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!("skipping AI parameter '{}': value '{}' is not numeric", name, raw);
                return None;
            }
        };

        let raw_reference = self.reference_range.trim().to_string();
        Some(ParsedParameter {
            name: name.to_string(),
            value,
            unit: self.unit.trim().to_string(),
            reference: parse_reference_range(&raw_reference),
            raw_reference,
        })
    }
}

/// Keeps only digits and dots; an empty result (or a lone dot) becomes `"0"`.
pub fn sanitize_value(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if kept.is_empty() || kept == "." {
        "0".to_string()
    } else {
        kept
    }
}

/// Pulls the JSON payload out of a reply that may be wrapped in markdown fences.
pub fn extract_json_block(content: &str) -> &str {
    let fenced = |marker: &str| {
        content
            .split_once(marker)
            .map(|(_, rest)| rest.split("```").next().unwrap_or(rest))
    };
    fenced("```json")
        .or_else(|| fenced("```"))
        .unwrap_or(content)
        .trim()
}

pub fn data_url(bytes: &[u8], media_type: &str) -> String {
    format!("data:{};base64,{}", media_type, STANDARD.encode(bytes))
}

fn explanation_prompt(parameter_name: &str, status: &str) -> String {
    format!(
        r#"Provide a brief, plain-language explanation about the medical parameter "{parameter_name}".

Current status: {status}

Rules:
1. Use simple language anyone can understand
2. Do NOT provide medical diagnosis
3. Do NOT give treatment advice
4. Keep the explanation under 80 words
5. Mention common factors that can influence this parameter
6. End with: "Consult a healthcare provider for personalized guidance."

Provide ONLY the explanation, no formatting or labels."#
    )
}

fn local_explanation_prompt(request: &ExplainReq) -> String {
    format!(
        r#"You are a health education assistant. Provide a brief, plain-language explanation about the medical parameter "{}".

Current status: {}
Trend: {}

Important rules:
1. Do NOT provide any diagnosis
2. Do NOT give treatment or medication advice
3. Only provide educational, factual information
4. Use simple, non-medical language
5. Keep the response under 100 words
6. Add a gentle reminder to consult healthcare professionals

Explain what this parameter generally indicates and what the current status might mean in everyday terms."#,
        request.parameter_name,
        request.status,
        request.trend.as_deref().unwrap_or("not specified"),
    )
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

async fn error_for_status(provider: &str, response: reqwest::Response) -> ReportResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let preview: String = body.chars().take(ERROR_BODY_PREVIEW).collect();
    Err(ReportError::Llm(format!("{} returned {}: {}", provider, status, preview)))
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    fn into_content(self) -> String {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default()
    }
}

/// OpenRouter chat completions client.
#[derive(Clone, Debug)]
pub struct OpenRouterClient {
    http: reqwest::Client,
    settings: OpenRouterSettings,
}

impl OpenRouterClient {
    pub fn new(http: reqwest::Client, settings: OpenRouterSettings) -> Self {
        Self { http, settings }
    }

    async fn chat(&self, payload: Value, title: &str, timeout: Duration) -> ReportResult<String> {
        let response = self
            .http
            .post(endpoint(self.settings.base_url.as_str(), "chat/completions"))
            .bearer_auth(self.settings.api_key.as_str())
            .header("HTTP-Referer", APP_REFERER)
            .header("X-Title", title)
            .timeout(timeout)
            .json(&payload)
            .send()
            .await?;
        let response = error_for_status("OpenRouter", response).await?;
        let chat: ChatResponse = response.json().await?;
        Ok(chat.into_content())
    }
}

#[async_trait]
impl VisionExtractor for OpenRouterClient {
    async fn extract_parameters(&self, bytes: &[u8], media_type: &str) -> ReportResult<AiExtraction> {
        tracing::info!(
            "requesting AI extraction from OpenRouter (model {})",
            self.settings.model
        );
        let payload = json!({
            "model": self.settings.model.as_str(),
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": EXTRACTION_PROMPT },
                    { "type": "image_url", "image_url": { "url": data_url(bytes, media_type) } }
                ]
            }],
            "max_tokens": 2000,
            "temperature": 0.1
        });

        let content = self
            .chat(payload, "Swasthya Saathi Medical Report Analyzer", EXTRACTION_TIMEOUT)
            .await?;
        let extraction: AiExtraction = serde_json::from_str(extract_json_block(&content))
            .map_err(|e| ReportError::Llm(format!("could not parse AI response as JSON: {}", e)))?;
        tracing::info!("AI returned {} raw parameters", extraction.parameters.len());
        Ok(extraction)
    }
}

#[async_trait]
impl ExplanationProvider for OpenRouterClient {
    fn name(&self) -> &'static str {
        "openrouter"
    }

    async fn explain(&self, request: &ExplainReq) -> ReportResult<String> {
        let payload = json!({
            "model": self.settings.model.as_str(),
            "messages": [{
                "role": "user",
                "content": explanation_prompt(&request.parameter_name, &request.status)
            }],
            "max_tokens": 200,
            "temperature": 0.3
        });
        self.chat(payload, "Swasthya Saathi", EXPLANATION_TIMEOUT).await
    }
}

/// Local Ollama client.
#[derive(Clone, Debug)]
pub struct OllamaClient {
    http: reqwest::Client,
    settings: OllamaSettings,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

impl OllamaClient {
    pub fn new(http: reqwest::Client, settings: OllamaSettings) -> Self {
        Self { http, settings }
    }
}

#[async_trait]
impl ExplanationProvider for OllamaClient {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn explain(&self, request: &ExplainReq) -> ReportResult<String> {
        let response = self
            .http
            .post(endpoint(self.settings.base_url.as_str(), "api/generate"))
            .timeout(EXPLANATION_TIMEOUT)
            .json(&json!({
                "model": self.settings.model.as_str(),
                "prompt": local_explanation_prompt(request),
                "stream": false
            }))
            .send()
            .await?;
        let response = error_for_status("Ollama", response).await?;
        let generated: GenerateResponse = response.json().await?;
        Ok(generated.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_ai_values() {
        assert_eq!(sanitize_value("12.5 g/dL"), "12.5");
        assert_eq!(sanitize_value("<200"), "200");
        assert_eq!(sanitize_value("n/a"), "0");
        assert_eq!(sanitize_value("."), "0");
        assert_eq!(sanitize_value(""), "0");
    }

    #[test]
    fn extracts_json_from_fences() {
        assert_eq!(
            extract_json_block("Here you go:\n```json\n{\"parameters\": []}\n```\nThanks"),
            "{\"parameters\": []}"
        );
        assert_eq!(extract_json_block("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(extract_json_block("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn ai_extraction_deserializes_mixed_value_types() {
        let content = r#"```json
{"parameters": [
  {"name": "Hemoglobin", "value": "11.2", "unit": "g/dL", "reference_range": "13.0 - 17.0"},
  {"name": "Platelets", "value": 250, "unit": "x10^3/uL"},
  {"name": "", "value": "5"},
  {"name": "Glucose", "value": "1.2.3"}
], "report_date": "Jan 3, 2026"}
```"#;
        let extraction: AiExtraction = serde_json::from_str(extract_json_block(content)).unwrap();
        assert_eq!(extraction.parameters.len(), 4);
        assert_eq!(extraction.report_date.as_deref(), Some("Jan 3, 2026"));

        let parsed: Vec<ParsedParameter> = extraction
            .parameters
            .iter()
            .filter_map(AiParameter::to_parsed)
            .collect();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].value, 11.2);
        assert_eq!(parsed[0].reference, Some((13.0, 17.0)));
        assert_eq!(parsed[1].value, 250.0);
        assert_eq!(parsed[1].raw_reference, "");
    }

    #[test]
    fn explanation_prompts_carry_no_values() {
        let request = ExplainReq {
            parameter_name: "Hemoglobin".into(),
            status: "low".into(),
            trend: Some("down".into()),
            category: None,
        };
        let prompt = explanation_prompt(&request.parameter_name, &request.status);
        assert!(prompt.contains("\"Hemoglobin\""));
        assert!(prompt.contains("Current status: low"));
        assert!(prompt.contains("under 80 words"));

        let local = local_explanation_prompt(&request);
        assert!(local.contains("Trend: down"));
    }

    #[test]
    fn builds_endpoints_and_data_urls() {
        assert_eq!(
            endpoint("https://openrouter.ai/api/v1/", "chat/completions"),
            "https://openrouter.ai/api/v1/chat/completions"
        );
        assert_eq!(data_url(b"abc", "image/png"), "data:image/png;base64,YWJj");
    }

    use axum::{
        http::{HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use saathi_types::NonEmptyText;
    use std::sync::{Arc, Mutex};

    type Seen = Arc<Mutex<Vec<(HeaderMap, Value)>>>;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    /// Answers every POST on `path` with `reply`, recording headers and body.
    async fn stub(path: &str, status: StatusCode, reply: Value) -> (String, Seen) {
        let seen: Seen = Arc::default();
        let recorder = seen.clone();
        let app = Router::new().route(
            path,
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let recorder = recorder.clone();
                let reply = reply.clone();
                async move {
                    recorder.lock().unwrap().push((headers, body));
                    (status, Json(reply))
                }
            }),
        );
        (serve(app).await, seen)
    }

    fn openrouter(base_url: &str) -> OpenRouterClient {
        OpenRouterClient::new(
            reqwest::Client::new(),
            OpenRouterSettings {
                api_key: NonEmptyText::new("test-key").unwrap(),
                base_url: NonEmptyText::new(format!("{}/api/v1", base_url)).unwrap(),
                model: NonEmptyText::new("vision-model").unwrap(),
            },
        )
    }

    fn hemoglobin_request() -> ExplainReq {
        ExplainReq {
            parameter_name: "Hemoglobin".into(),
            status: "low".into(),
            trend: Some("down".into()),
            category: None,
        }
    }

    #[tokio::test]
    async fn openrouter_extraction_reads_fenced_json() {
        let content = "Sure:\n```json\n{\"parameters\": [{\"name\": \"Hemoglobin\", \"value\": \"11.2\", \"unit\": \"g/dL\", \"reference_range\": \"13.0 - 17.0\"}], \"lab_name\": \"City Lab\"}\n```";
        let (base, seen) = stub(
            "/api/v1/chat/completions",
            StatusCode::OK,
            json!({"choices": [{"message": {"content": content}}]}),
        )
        .await;

        let extraction = openrouter(&base)
            .extract_parameters(b"png-bytes", "image/png")
            .await
            .unwrap();
        assert_eq!(extraction.parameters.len(), 1);
        assert_eq!(extraction.parameters[0].name, "Hemoglobin");
        assert_eq!(extraction.lab_name.as_deref(), Some("City Lab"));

        let seen = seen.lock().unwrap();
        let (headers, body) = &seen[0];
        assert_eq!(headers["authorization"], "Bearer test-key");
        assert_eq!(headers["http-referer"], APP_REFERER);
        assert_eq!(headers["x-title"], "Swasthya Saathi Medical Report Analyzer");
        assert_eq!(body["model"], "vision-model");
        assert_eq!(body["max_tokens"], 2000);
        assert_eq!(
            body["messages"][0]["content"][1]["image_url"]["url"],
            data_url(b"png-bytes", "image/png")
        );
    }

    #[tokio::test]
    async fn openrouter_error_status_becomes_llm_error() {
        let (base, _) = stub(
            "/api/v1/chat/completions",
            StatusCode::TOO_MANY_REQUESTS,
            json!({"error": "rate limited"}),
        )
        .await;

        let err = openrouter(&base)
            .explain(&hemoglobin_request())
            .await
            .unwrap_err();
        match err {
            ReportError::Llm(message) => {
                assert!(message.starts_with("OpenRouter returned 429"), "{}", message);
                assert!(message.contains("rate limited"));
            }
            other => panic!("expected an LLM error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn openrouter_explanation_sends_name_and_status_only() {
        let (base, seen) = stub(
            "/api/v1/chat/completions",
            StatusCode::OK,
            json!({"choices": [{"message": {"content": "Hemoglobin carries oxygen."}}]}),
        )
        .await;

        let text = openrouter(&base).explain(&hemoglobin_request()).await.unwrap();
        assert_eq!(text, "Hemoglobin carries oxygen.");

        let seen = seen.lock().unwrap();
        let body = &seen[0].1;
        assert_eq!(body["max_tokens"], 200);
        assert_eq!(body["temperature"], 0.3);
        let prompt = body["messages"][0]["content"].as_str().unwrap();
        assert!(prompt.contains("\"Hemoglobin\""));
        assert!(prompt.contains("Current status: low"));
    }

    #[tokio::test]
    async fn ollama_generates_without_streaming() {
        let (base, seen) = stub(
            "/api/generate",
            StatusCode::OK,
            json!({"model": "llama2", "response": "A protein in red blood cells.", "done": true}),
        )
        .await;
        let client = OllamaClient::new(
            reqwest::Client::new(),
            OllamaSettings {
                base_url: NonEmptyText::new(format!("{}/", base)).unwrap(),
                model: NonEmptyText::new("llama2").unwrap(),
            },
        );

        let text = client.explain(&hemoglobin_request()).await.unwrap();
        assert_eq!(text, "A protein in red blood cells.");

        let seen = seen.lock().unwrap();
        let body = &seen[0].1;
        assert_eq!(body["stream"], false);
        assert_eq!(body["model"], "llama2");
        assert!(body["prompt"].as_str().unwrap().contains("Trend: down"));
    }
}

