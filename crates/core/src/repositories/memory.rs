use super::{insert_chronologically, ReportRepository};
use crate::report::StoredReport;
use crate::ReportResult;
use async_trait::async_trait;
use saathi_types::{PatientId, ReportId};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Process-local repository.
#[derive(Debug, Default)]
pub struct MemoryReportRepository {
    reports: RwLock<HashMap<PatientId, Vec<StoredReport>>>,
}

impl MemoryReportRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReportRepository for MemoryReportRepository {
    async fn insert(&self, report: StoredReport) -> ReportResult<()> {
        let mut reports = self.reports.write().await;
        let list = reports.entry(report.patient_id.clone()).or_default();
        insert_chronologically(list, report);
        Ok(())
    }

    async fn list_for_patient(&self, patient_id: &PatientId) -> ReportResult<Vec<StoredReport>> {
        Ok(self
            .reports
            .read()
            .await
            .get(patient_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get(
        &self,
        patient_id: &PatientId,
        report_id: &ReportId,
    ) -> ReportResult<Option<StoredReport>> {
        Ok(self.reports.read().await.get(patient_id).and_then(|list| {
            list.iter()
                .find(|r| &r.report_id == report_id)
                .cloned()
        }))
    }

    async fn count(&self) -> ReportResult<usize> {
        Ok(self.reports.read().await.values().map(Vec::len).sum())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
