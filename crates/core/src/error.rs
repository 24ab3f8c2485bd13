#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid file type. Allowed types: {allowed}")]
    InvalidFileType { allowed: String },
    #[error("File too large. Maximum size: {max_mb}MB")]
    FileTooLarge { max_mb: u64 },
    #[error("{0} not found")]
    NotFound(String),
    #[error("No parameters could be extracted from the uploaded report")]
    NoParameters,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to write report file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read report file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to serialize report: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize report: {0}")]
    Deserialization(serde_json::Error),

    #[error("OCR failed: {0}")]
    Ocr(String),
    #[error("LLM request failed: {0}")]
    Llm(String),
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid identifier: {0}")]
    Id(#[from] saathi_types::IdError),
}

pub type ReportResult<T> = std::result::Result<T, ReportError>;
