use super::{insert_chronologically, ReportRepository};
use crate::report::StoredReport;
use crate::{ReportError, ReportResult};
use async_trait::async_trait;
use saathi_types::{PatientId, ReportId};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// JSON-file repository.
///
/// Each report is written as pretty-printed JSON to `reports_dir/<s1>/<s2>/<report_id>.json`.
/// All reports are read into an in-memory index when the repository is opened; inserts write
/// the file first and only update the index once the write has succeeded.
#[derive(Debug)]
pub struct FileReportRepository {
    reports_dir: PathBuf,
    index: RwLock<HashMap<PatientId, Vec<StoredReport>>>,
}

impl FileReportRepository {
    /// Opens (creating if needed) the repository rooted at `reports_dir` and loads every report.
    ///
    /// Files that cannot be parsed are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::StorageDirCreation` if the directory cannot be created, or
    /// `ReportError::FileRead` if it cannot be traversed.
    pub async fn open(reports_dir: impl Into<PathBuf>) -> ReportResult<Self> {
        let reports_dir = reports_dir.into();
        tokio::fs::create_dir_all(&reports_dir)
            .await
            .map_err(ReportError::StorageDirCreation)?;

        let mut index: HashMap<PatientId, Vec<StoredReport>> = HashMap::new();
        let mut loaded = 0usize;
        for path in json_files(&reports_dir).await? {
            match read_report(&path).await {
                Ok(report) => {
                    let list = index.entry(report.patient_id.clone()).or_default();
                    insert_chronologically(list, report);
                    loaded += 1;
                }
                Err(e) => tracing::warn!("skipping unreadable report {}: {}", path.display(), e),
            }
        }
        tracing::info!(
            "loaded {} reports from {}",
            loaded,
            reports_dir.display()
        );

        Ok(Self {
            reports_dir,
            index: RwLock::new(index),
        })
    }

    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }

    async fn write_report(&self, report: &StoredReport) -> ReportResult<()> {
        let path = report.report_id.sharded_file(&self.reports_dir);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(ReportError::StorageDirCreation)?;
        }

        let json = serde_json::to_string_pretty(report).map_err(ReportError::Serialization)?;
        // Write to a sibling and rename so readers never see a partial document
        let partial = path.with_extension("json.partial");
        tokio::fs::write(&partial, json)
            .await
            .map_err(ReportError::FileWrite)?;
        tokio::fs::rename(&partial, &path)
            .await
            .map_err(ReportError::FileWrite)?;
        Ok(())
    }
}

async fn read_report(path: &Path) -> ReportResult<StoredReport> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(ReportError::FileRead)?;
    serde_json::from_str(&contents).map_err(ReportError::Deserialization)
}

/// Every `*.json` file below `root`, in no particular order.
async fn json_files(root: &Path) -> ReportResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(ReportError::FileRead)?;
        while let Some(entry) = entries.next_entry().await.map_err(ReportError::FileRead)? {
            let path = entry.path();
            let file_type = entry.file_type().await.map_err(ReportError::FileRead)?;
            if file_type.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
    }
    Ok(files)
}

#[async_trait]
impl ReportRepository for FileReportRepository {
    async fn insert(&self, report: StoredReport) -> ReportResult<()> {
        self.write_report(&report).await?;
        let mut index = self.index.write().await;
        let list = index.entry(report.patient_id.clone()).or_default();
        insert_chronologically(list, report);
        Ok(())
    }

    async fn list_for_patient(&self, patient_id: &PatientId) -> ReportResult<Vec<StoredReport>> {
        Ok(self
            .index
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
        let index = self.index.read().await;
        Ok(index
            .get(patient_id)
            .and_then(|list| list.iter().find(|r| &r.report_id == report_id))
            .cloned())
    }

    async fn count(&self) -> ReportResult<usize> {
        Ok(self.index.read().await.values().map(Vec::len).sum())
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
