//! Constants used throughout the core crate.

/// Default directory for persisted reports when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "saved_reports";

/// Subdirectory of the data directory that holds sharded report JSON files.
pub const REPORTS_DIR_NAME: &str = "reports";

/// File extensions accepted for upload (lowercase, with leading dot).
pub const ALLOWED_EXTENSIONS: [&str; 4] = [".pdf", ".png", ".jpg", ".jpeg"];

/// Default upload limit in megabytes.
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 10;

/// Default minimum OCR confidence before an upload is flagged.
pub const DEFAULT_OCR_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Minimum characters of OCR text worth handing to the parser.
pub const MIN_OCR_TEXT_LEN: usize = 50;

/// Confidence reported for AI-extracted and demo parameters.
pub const ASSUMED_CONFIDENCE: f64 = 0.95;

/// Upper bound used when a reference range is open-ended (`> 40`).
pub const OPEN_RANGE_MAX: f64 = 999.0;

/// Number of abnormal parameters echoed back in an upload response.
pub const UPLOAD_ABNORMAL_PREVIEW: usize = 5;

/// Colour used when a severity has no mapping.
pub const NEUTRAL_COLOR: &str = "#5E6C7A";

pub const EXPLANATION_DISCLAIMER: &str = "This information is for educational purposes only. It is not a diagnosis or medical advice. Please consult healthcare professionals for personalized guidance.";

pub const TIMELINE_DISCLAIMER: &str = "These suggestions are for general guidance only. They do not constitute medical advice. Always follow the specific recommendations of qualified healthcare professionals.";

pub const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_OPENROUTER_MODEL: &str = "google/gemini-2.5-flash";
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama2";
