//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services as an
//! `Arc<CoreConfig>`. Request handling never reads process-wide environment variables, which
//! keeps behaviour consistent across threads and test harnesses.
//!
//! [`CoreConfig::from_lookup`] takes a key lookup function rather than reading the
//! environment directly, so binaries pass `|k| std::env::var(k).ok()` and tests pass a map.

use crate::constants::{
    DEFAULT_DATA_DIR, DEFAULT_MAX_FILE_SIZE_MB, DEFAULT_OCR_CONFIDENCE_THRESHOLD,
    DEFAULT_OLLAMA_BASE_URL, DEFAULT_OLLAMA_MODEL, DEFAULT_OPENROUTER_BASE_URL,
    DEFAULT_OPENROUTER_MODEL, REPORTS_DIR_NAME,
};
use crate::{ReportError, ReportResult};
use saathi_types::NonEmptyText;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Where reports are kept.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    File,
}

impl FromStr for StorageBackend {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "file" | "json" => Ok(StorageBackend::File),
            other => Err(ReportError::Config(format!(
                "unknown storage backend '{}' (expected 'memory' or 'file')",
                other
            ))),
        }
    }
}

/// Which text extractor backs OCR.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OcrEngine {
    Tesseract,
    Sample,
}

impl FromStr for OcrEngine {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tesseract" => Ok(OcrEngine::Tesseract),
            "sample" | "mock" => Ok(OcrEngine::Sample),
            other => Err(ReportError::Config(format!(
                "unknown OCR engine '{}' (expected 'tesseract' or 'sample')",
                other
            ))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct OpenRouterSettings {
    pub api_key: NonEmptyText,
    pub base_url: NonEmptyText,
    pub model: NonEmptyText,
}

#[derive(Clone, Debug)]
pub struct OllamaSettings {
    pub base_url: NonEmptyText,
    pub model: NonEmptyText,
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    storage: StorageBackend,
    ocr_engine: OcrEngine,
    tesseract_bin: PathBuf,
    pdftoppm_bin: PathBuf,
    ocr_confidence_threshold: f64,
    max_file_size_mb: u64,
    demo_fallback: bool,
    openrouter: Option<OpenRouterSettings>,
    ollama: Option<OllamaSettings>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            storage: StorageBackend::File,
            ocr_engine: OcrEngine::Tesseract,
            tesseract_bin: PathBuf::from("tesseract"),
            pdftoppm_bin: PathBuf::from("pdftoppm"),
            ocr_confidence_threshold: DEFAULT_OCR_CONFIDENCE_THRESHOLD,
            max_file_size_mb: DEFAULT_MAX_FILE_SIZE_MB,
            demo_fallback: true,
            openrouter: None,
            ollama: None,
        }
    }
}

impl CoreConfig {
    /// Builds the configuration from a key lookup, applying defaults for missing keys.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Config` if a present value cannot be parsed or is out of range.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ReportResult<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut cfg = Self::default();

        if let Some(dir) = get("SAATHI_DATA_DIR") {
            cfg.data_dir = PathBuf::from(dir);
        }
        if let Some(storage) = get("SAATHI_STORAGE") {
            cfg.storage = storage.parse()?;
        }
        if let Some(engine) = get("SAATHI_OCR_ENGINE") {
            cfg.ocr_engine = engine.parse()?;
        }
        if let Some(bin) = get("TESSERACT_BIN") {
            cfg.tesseract_bin = PathBuf::from(bin);
        }
        if let Some(bin) = get("PDFTOPPM_BIN") {
            cfg.pdftoppm_bin = PathBuf::from(bin);
        }
        if let Some(threshold) = get("OCR_CONFIDENCE_THRESHOLD") {
            cfg = cfg.with_ocr_confidence_threshold(parse_value("OCR_CONFIDENCE_THRESHOLD", &threshold)?)?;
        }
        if let Some(max) = get("MAX_FILE_SIZE_MB") {
            cfg = cfg.with_max_file_size_mb(parse_value("MAX_FILE_SIZE_MB", &max)?)?;
        }
        if let Some(flag) = get("SAATHI_DEMO_FALLBACK") {
            cfg.demo_fallback = parse_bool("SAATHI_DEMO_FALLBACK", &flag)?;
        }

        let openrouter_enabled = get("OPENROUTER_ENABLED")
            .map(|v| parse_bool("OPENROUTER_ENABLED", &v))
            .transpose()?
            .unwrap_or(true);
        if openrouter_enabled {
            if let Some(api_key) = NonEmptyText::optional(get("OPENROUTER_API_KEY")) {
                cfg.openrouter = Some(OpenRouterSettings {
                    api_key,
                    base_url: text_or_default(get("OPENROUTER_BASE_URL"), DEFAULT_OPENROUTER_BASE_URL)?,
                    model: text_or_default(get("OPENROUTER_MODEL"), DEFAULT_OPENROUTER_MODEL)?,
                });
            }
        }

        let ollama_enabled = get("OLLAMA_ENABLED")
            .map(|v| parse_bool("OLLAMA_ENABLED", &v))
            .transpose()?
            .unwrap_or(false);
        if ollama_enabled {
            cfg.ollama = Some(OllamaSettings {
                base_url: text_or_default(get("OLLAMA_BASE_URL"), DEFAULT_OLLAMA_BASE_URL)?,
                model: text_or_default(get("OLLAMA_MODEL"), DEFAULT_OLLAMA_MODEL)?,
            });
        }

        Ok(cfg)
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_storage(mut self, storage: StorageBackend) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_ocr_engine(mut self, engine: OcrEngine) -> Self {
        self.ocr_engine = engine;
        self
    }

    pub fn with_demo_fallback(mut self, enabled: bool) -> Self {
        self.demo_fallback = enabled;
        self
    }

    pub fn with_ocr_confidence_threshold(mut self, threshold: f64) -> ReportResult<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ReportError::Config(format!(
                "OCR confidence threshold must be between 0 and 1, got {}",
                threshold
            )));
        }
        self.ocr_confidence_threshold = threshold;
        Ok(self)
    }

    pub fn with_max_file_size_mb(mut self, max_mb: u64) -> ReportResult<Self> {
        if max_mb == 0 {
            return Err(ReportError::Config(
                "MAX_FILE_SIZE_MB must be greater than zero".into(),
            ));
        }
        self.max_file_size_mb = max_mb;
        Ok(self)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.data_dir.join(REPORTS_DIR_NAME)
    }

    pub fn storage(&self) -> StorageBackend {
        self.storage
    }

    pub fn ocr_engine(&self) -> OcrEngine {
        self.ocr_engine
    }

    pub fn tesseract_bin(&self) -> &Path {
        &self.tesseract_bin
    }

    pub fn pdftoppm_bin(&self) -> &Path {
        &self.pdftoppm_bin
    }

    pub fn ocr_confidence_threshold(&self) -> f64 {
        self.ocr_confidence_threshold
    }

    pub fn max_file_size_mb(&self) -> u64 {
        self.max_file_size_mb
    }

    pub fn max_file_size_bytes(&self) -> usize {
        (self.max_file_size_mb as usize).saturating_mul(1024 * 1024)
    }

    pub fn demo_fallback(&self) -> bool {
        self.demo_fallback
    }

    pub fn openrouter(&self) -> Option<&OpenRouterSettings> {
        self.openrouter.as_ref()
    }

    pub fn ollama(&self) -> Option<&OllamaSettings> {
        self.ollama.as_ref()
    }
}

fn text_or_default(value: Option<String>, default: &str) -> ReportResult<NonEmptyText> {
    match NonEmptyText::optional(value) {
        Some(text) => Ok(text),
        None => NonEmptyText::new(default)
            .map_err(|e| ReportError::Config(format!("empty default '{}': {}", default, e))),
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> ReportResult<T> {
    value
        .parse::<T>()
        .map_err(|_| ReportError::Config(format!("{} has an invalid value: '{}'", key, value)))
}

/// Parses the boolean spellings accepted in `.env` files.
pub fn parse_bool(key: &str, value: &str) -> ReportResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ReportError::Config(format!(
            "{} must be a boolean, got '{}'",
            key, value
        ))),
    }
}
