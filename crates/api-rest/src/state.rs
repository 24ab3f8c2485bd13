//! Application state for the HTTP server.

use saathi_core::repositories::open_repository;
use saathi_core::{CoreConfig, ReportResult, ReportService};
use std::sync::Arc;

/// Shared state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ReportService>,
}

impl AppState {
    pub fn new(service: Arc<ReportService>) -> Self {
        Self { service }
    }

    /// Opens the configured repository and builds the report service on top of it.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the repository cannot be opened, or `ReportError::Http` if
    /// the LLM client cannot be built.
    pub async fn from_config(config: Arc<CoreConfig>) -> ReportResult<Self> {
        let repository = open_repository(&config).await?;
        let service = ReportService::from_config(config, repository)?;
        Ok(Self::new(Arc::new(service)))
    }

    /// Largest request body accepted: the upload limit plus room for multipart framing.
    pub fn body_limit(&self) -> usize {
        self.service
            .config()
            .max_file_size_bytes()
            .saturating_add(MULTIPART_OVERHEAD_BYTES)
    }
}

const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;
