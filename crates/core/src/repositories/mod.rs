//! Report persistence.
//!
//! [`ReportRepository`] is the storage seam used by [`crate::service::ReportService`]. Two
//! backends are provided:
//! - [`MemoryReportRepository`]: process-local, lost on restart.
//! - [`FileReportRepository`]: one JSON document per report under a sharded directory tree.

mod file;
mod memory;

pub use file::FileReportRepository;
pub use memory::MemoryReportRepository;

use crate::config::{CoreConfig, StorageBackend};
use crate::report::StoredReport;
use crate::ReportResult;
use async_trait::async_trait;
use saathi_types::{PatientId, ReportId};
use std::sync::Arc;

/// Storage for processed reports, keyed by patient.
///
/// Implementations must be `Send + Sync` so a single instance can be shared across request
/// handlers.
#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// Persists a new report.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the report cannot be written.
    async fn insert(&self, report: StoredReport) -> ReportResult<()>;

    /// All reports for a patient, oldest upload first.
    async fn list_for_patient(&self, patient_id: &PatientId) -> ReportResult<Vec<StoredReport>>;

    /// A single report, only if it belongs to `patient_id`.
    async fn get(
        &self,
        patient_id: &PatientId,
        report_id: &ReportId,
    ) -> ReportResult<Option<StoredReport>>;

    /// Total number of stored reports across all patients.
    async fn count(&self) -> ReportResult<usize>;

    fn backend_name(&self) -> &'static str;
}

/// Opens the backend selected by `SAATHI_STORAGE`.
///
/// # Errors
///
/// Returns a storage error if the file backend cannot create or read its directory.
pub async fn open_repository(config: &CoreConfig) -> ReportResult<Arc<dyn ReportRepository>> {
    let repository: Arc<dyn ReportRepository> = match config.storage() {
        StorageBackend::Memory => Arc::new(MemoryReportRepository::new()),
        StorageBackend::File => Arc::new(FileReportRepository::open(config.reports_dir()).await?),
    };
    tracing::info!("report storage: {}", repository.backend_name());
    Ok(repository)
}

/// Inserts after every report uploaded at or before `report`, keeping the list chronological.
fn insert_chronologically(reports: &mut Vec<StoredReport>, report: StoredReport) {
    let position = reports.partition_point(|r| r.uploaded_at <= report.uploaded_at);
    reports.insert(position, report);
}
