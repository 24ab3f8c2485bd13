//! Report processing pipeline and read-side queries.
//!
//! [`ReportService`] is what the REST layer and the CLI talk to. It owns no global state: the
//! configuration, repository and extractors are handed in when it is built.
//!
//! Upload runs these strategies in order and stops at the first one that yields parameters:
//! 1. AI vision extraction (images only, when OpenRouter is configured);
//! 2. OCR followed by the regex parser;
//! 3. demo parameters, when demo fallback is enabled.

use crate::analysis::{enrich_parameters_with_trends, get_abnormal_parameters};
use crate::config::CoreConfig;
use crate::constants::{ASSUMED_CONFIDENCE, MIN_OCR_TEXT_LEN, UPLOAD_ABNORMAL_PREVIEW};
use crate::demo::{demo_history, demo_parameters, demo_report_detail, demo_trends, is_demo_id};
use crate::explain::Explainer;
use crate::llm::{AiParameter, ExplanationProvider, OllamaClient, OpenRouterClient, VisionExtractor};
use crate::ocr::{check_confidence, extractor_from_config, TextExtractor};
use crate::parser::{parse_medical_report, validate_and_enrich_parameter};
use crate::report::{format_report_date, StoredReport};
use crate::repositories::ReportRepository;
use crate::score::{calculate_health_clarity_score, calculate_score_trend, generate_score_summary};
use crate::timeline::generate_action_timeline;
use crate::trends::{
    generate_health_score_trend, generate_trend_data_for_parameter,
    get_available_parameters_for_trends,
};
use crate::validation::{is_pdf, media_type, validate_file_size, validate_file_type};
use crate::{ReportError, ReportResult};
use api_shared::{
    ActionTimelineRes, ExplainReq, ExplainRes, ExtractionSource, Parameter, ReportDetail,
    ReportHistory, ScoreSummary, SeverityLevel, TrendRes, UploadRes,
};
use chrono::Utc;
use saathi_types::{NonEmptyText, PatientId, ReportId};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

const DEFAULT_FILENAME: &str = "uploaded_report";
const UPLOAD_SUCCESS_MESSAGE: &str = "Report processed successfully";
const AI_CONFIDENCE_MESSAGE: &str = "Parameters extracted with AI assistance";
const DEMO_CONFIDENCE_MESSAGE: &str =
    "Could not read parameters from the document. Showing sample data instead.";

/// Parameters produced by one extraction strategy, with how much to trust them.
struct Extraction {
    parameters: Vec<Parameter>,
    source: ExtractionSource,
    confidence: f64,
    confidence_acceptable: bool,
    confidence_message: String,
}

#[derive(Clone)]
pub struct ReportService {
    config: Arc<CoreConfig>,
    repository: Arc<dyn ReportRepository>,
    extractor: Arc<dyn TextExtractor>,
    vision: Option<Arc<dyn VisionExtractor>>,
    explainer: Explainer,
    /// Held from reading the previous report until the new one is stored, so concurrent
    /// uploads each compare against the report stored just before them.
    store_lock: Arc<Mutex<()>>,
}

impl ReportService {
    /// Creates a service with no LLM providers.
    pub fn new(
        config: Arc<CoreConfig>,
        repository: Arc<dyn ReportRepository>,
        extractor: Arc<dyn TextExtractor>,
    ) -> Self {
        Self {
            config,
            repository,
            extractor,
            vision: None,
            explainer: Explainer::default(),
            store_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Creates a service with the OCR engine and LLM providers the configuration selects.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Http` if the HTTP client cannot be built.
    pub fn from_config(
        config: Arc<CoreConfig>,
        repository: Arc<dyn ReportRepository>,
    ) -> ReportResult<Self> {
        let extractor = extractor_from_config(&config);
        let mut service = Self::new(config.clone(), repository, extractor);

        let http = reqwest::Client::builder().build()?;
        let mut providers: Vec<Arc<dyn ExplanationProvider>> = Vec::new();
        if let Some(settings) = config.openrouter() {
            let client = Arc::new(OpenRouterClient::new(http.clone(), settings.clone()));
            service.vision = Some(client.clone());
            providers.push(client);
        }
        if let Some(settings) = config.ollama() {
            providers.push(Arc::new(OllamaClient::new(http, settings.clone())));
        }
        service.explainer = Explainer::new(providers);

        tracing::info!(
            "report service ready: ocr={}, ai_extraction={}, explanation providers={:?}",
            service.extractor.name(),
            service.vision.is_some(),
            service.explainer.provider_names()
        );
        Ok(service)
    }

    pub fn with_vision(mut self, vision: Arc<dyn VisionExtractor>) -> Self {
        self.vision = Some(vision);
        self
    }

    pub fn with_explainer(mut self, explainer: Explainer) -> Self {
        self.explainer = explainer;
        self
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn repository(&self) -> &Arc<dyn ReportRepository> {
        &self.repository
    }

    /// Validates, extracts, scores and stores an uploaded report.
    ///
    /// # Arguments
    ///
    /// * `patient_id` - Owner of the report.
    /// * `filename` - Client-supplied file name; its extension selects the processing path.
    /// * `bytes` - File contents. They are processed in memory and never stored.
    ///
    /// # Errors
    ///
    /// - `ReportError::InvalidFileType` / `ReportError::FileTooLarge` on validation failure.
    /// - `ReportError::NoParameters` if nothing could be extracted and demo fallback is off.
    /// - Storage errors from the repository.
    pub async fn upload(
        &self,
        patient_id: &PatientId,
        filename: Option<&str>,
        bytes: &[u8],
    ) -> ReportResult<UploadRes> {
        let filename = filename.map(str::trim).filter(|f| !f.is_empty());
        validate_file_type(filename.unwrap_or_default())?;
        validate_file_size(bytes.len(), self.config.max_file_size_mb())?;
        let filename = filename.unwrap_or(DEFAULT_FILENAME);

        let extraction = match self.extract_with_ai(filename, bytes).await {
            Some(extraction) => extraction,
            None => match self.extract_with_ocr(filename, bytes).await {
                Some(extraction) => extraction,
                None => self.demo_extraction()?,
            },
        };
        tracing::info!(
            "extracted {} parameters from {} via {:?}",
            extraction.parameters.len(),
            filename,
            extraction.source
        );

        let store_guard = self.store_lock.lock().await;
        let previous = self.repository.list_for_patient(patient_id).await?.pop();
        let parameters = enrich_parameters_with_trends(
            extraction.parameters,
            previous.as_ref().map(|r| r.parameters.as_slice()),
        );
        let score = calculate_health_clarity_score(&parameters);
        let score_trend = previous
            .as_ref()
            .map(|r| calculate_score_trend(score.score, Some(r.health_clarity_score.score)));

        let now = Utc::now();
        let report = StoredReport {
            report_id: ReportId::new(),
            patient_id: patient_id.clone(),
            filename: filename.to_string(),
            uploaded_at: now,
            report_date: format_report_date(now),
            severity_level: score.severity_level,
            health_clarity_score: score.clone(),
            parameters,
            ocr_confidence: extraction.confidence,
            extraction_source: extraction.source,
        };
        self.repository.insert(report.clone()).await?;
        drop(store_guard);
        tracing::info!(
            "stored report {} (score {}, {})",
            report.report_id,
            score.score,
            score.severity_level.label()
        );

        let mut abnormal = get_abnormal_parameters(&report.parameters);
        abnormal.truncate(UPLOAD_ABNORMAL_PREVIEW);

        Ok(UploadRes {
            success: true,
            message: UPLOAD_SUCCESS_MESSAGE.to_string(),
            upload_id: report.report_id.clone(),
            report_id: report.report_id,
            patient_id: report.patient_id,
            report_date: report.report_date,
            ocr_confidence: extraction.confidence,
            confidence_acceptable: extraction.confidence_acceptable,
            confidence_message: extraction.confidence_message,
            extraction_source: extraction.source,
            health_clarity_score: generate_score_summary(&score, score_trend),
            total_parameters: score.total_parameters,
            parameters_in_range: score.parameters_in_range,
            parameters_needing_attention: score.parameters_needing_attention,
            abnormal_parameters: abnormal,
            severity_level: score.severity_level,
        })
    }

    async fn extract_with_ai(&self, filename: &str, bytes: &[u8]) -> Option<Extraction> {
        let vision = self.vision.as_ref()?;
        if is_pdf(filename) || bytes.is_empty() {
            return None;
        }

        let extraction = match vision.extract_parameters(bytes, media_type(filename, bytes)).await {
            Ok(extraction) => extraction,
            Err(e) => {
                tracing::warn!("AI extraction failed, falling back to OCR: {:?}", e);
                return None;
            }
        };
        if let Some(error) = &extraction.error {
            tracing::warn!("AI could not read the report: {}", error);
        }

        let parameters: Vec<Parameter> = extraction
            .parameters
            .iter()
            .filter_map(AiParameter::to_parsed)
            .map(|parsed| validate_and_enrich_parameter(&parsed))
            .collect();
        if parameters.is_empty() {
            return None;
        }

        Some(Extraction {
            parameters,
            source: ExtractionSource::Ai,
            confidence: ASSUMED_CONFIDENCE,
            confidence_acceptable: true,
            confidence_message: AI_CONFIDENCE_MESSAGE.to_string(),
        })
    }

    async fn extract_with_ocr(&self, filename: &str, bytes: &[u8]) -> Option<Extraction> {
        let result = self.extractor.extract(bytes, filename).await;
        tracing::info!(
            "OCR via {}: confidence {:.0}%, {} characters",
            self.extractor.name(),
            result.confidence * 100.0,
            result.text.len()
        );
        if !result.success || result.meaningful_len() <= MIN_OCR_TEXT_LEN {
            return None;
        }

        let parameters = parse_medical_report(&result.text);
        if parameters.is_empty() {
            tracing::warn!("OCR text contained no recognisable parameters");
            return None;
        }

        let (confidence_acceptable, confidence_message) =
            check_confidence(&result, self.config.ocr_confidence_threshold());
        Some(Extraction {
            parameters,
            source: ExtractionSource::Ocr,
            confidence: result.confidence,
            confidence_acceptable,
            confidence_message,
        })
    }

    fn demo_extraction(&self) -> ReportResult<Extraction> {
        if !self.config.demo_fallback() {
            return Err(ReportError::NoParameters);
        }
        tracing::info!("no parameters extracted, using demo data");
        Ok(Extraction {
            parameters: demo_parameters(),
            source: ExtractionSource::Demo,
            confidence: ASSUMED_CONFIDENCE,
            confidence_acceptable: false,
            confidence_message: DEMO_CONFIDENCE_MESSAGE.to_string(),
        })
    }

    /// Most recent report, or the demo report when the patient has none.
    pub async fn latest(&self, patient_id: &PatientId) -> ReportResult<ReportDetail> {
        match self.repository.list_for_patient(patient_id).await?.last() {
            Some(report) => Ok(report.detail()),
            None => Ok(demo_report_detail(patient_id, Utc::now())),
        }
    }

    /// Summaries of every report, oldest first; demo history when the patient has none.
    pub async fn history(&self, patient_id: &PatientId) -> ReportResult<ReportHistory> {
        let reports = self.repository.list_for_patient(patient_id).await?;
        let summaries = if reports.is_empty() {
            demo_history()
        } else {
            reports.iter().map(StoredReport::summary).collect()
        };
        Ok(ReportHistory {
            patient_id: patient_id.clone(),
            total_reports: summaries.len(),
            reports: summaries,
        })
    }

    /// A stored report owned by the patient, or the demo report for `demo-*` ids.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::NotFound` for malformed ids and for reports owned by someone else.
    pub async fn report_by_id(
        &self,
        patient_id: &PatientId,
        report_id: &str,
    ) -> ReportResult<ReportDetail> {
        if let Ok(id) = ReportId::parse(report_id) {
            if let Some(report) = self.repository.get(patient_id, &id).await? {
                return Ok(report.detail());
            }
        }
        if is_demo_id(report_id) {
            return Ok(demo_report_detail(patient_id, Utc::now()));
        }
        Err(ReportError::NotFound("Report".into()))
    }

    /// Longitudinal data; demo data until the patient has two reports.
    ///
    /// `parameter` selects a series by display name; an unknown name yields no series.
    pub async fn trends(
        &self,
        patient_id: &PatientId,
        parameter: Option<&str>,
    ) -> ReportResult<TrendRes> {
        let reports = self.repository.list_for_patient(patient_id).await?;
        if reports.len() < 2 {
            return Ok(demo_trends(patient_id));
        }

        let mut parameter_trends = BTreeMap::new();
        if let Some(name) = parameter.map(str::trim).filter(|n| !n.is_empty()) {
            if let Some(series) = generate_trend_data_for_parameter(name, &reports) {
                parameter_trends.insert(name.to_string(), series);
            }
        }

        Ok(TrendRes {
            patient_id: patient_id.clone(),
            health_score_trend: generate_health_score_trend(&reports),
            parameter_trends,
            available_parameters: get_available_parameters_for_trends(&reports),
        })
    }

    /// Score summary of the latest report, with a trend against the one before it.
    pub async fn clarity_score(&self, patient_id: &PatientId) -> ReportResult<ScoreSummary> {
        let reports = self.repository.list_for_patient(patient_id).await?;
        let Some((latest, earlier)) = reports.split_last() else {
            let demo = calculate_health_clarity_score(&demo_parameters());
            return Ok(generate_score_summary(&demo, None));
        };

        let trend = earlier.last().map(|previous| {
            calculate_score_trend(
                latest.health_clarity_score.score,
                Some(previous.health_clarity_score.score),
            )
        });
        Ok(generate_score_summary(&latest.health_clarity_score, trend))
    }

    /// Follow-up actions for the latest report's severity (moderate without reports).
    pub async fn action_timeline(&self, patient_id: &PatientId) -> ReportResult<ActionTimelineRes> {
        let severity = self
            .repository
            .list_for_patient(patient_id)
            .await?
            .last()
            .map(|r| r.severity_level)
            .unwrap_or(SeverityLevel::Moderate);
        Ok(generate_action_timeline(severity))
    }

    /// # Errors
    ///
    /// Returns `ReportError::InvalidInput` if the parameter name or status is blank.
    pub async fn explain(&self, request: &ExplainReq) -> ReportResult<ExplainRes> {
        NonEmptyText::new(&request.parameter_name)
            .map_err(|_| ReportError::InvalidInput("parameter_name must not be empty".into()))?;
        NonEmptyText::new(&request.status)
            .map_err(|_| ReportError::InvalidInput("status must not be empty".into()))?;
        Ok(self.explainer.generate_explanation(request).await)
    }
}
