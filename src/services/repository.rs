//! Report repository: create-then-patch persistence of issue reports.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::domain::issues;
use crate::error::{Error, LogErr, Result};
use crate::models::{NewIssueReport, ReportId};

/// Write-only access to stored issue reports.
pub trait ReportRepository {
    /// Store a new report and return the identity assigned to it.
    fn create(&self, report: &NewIssueReport) -> impl Future<Output = Result<ReportId>> + Send;

    /// Point a stored report at its uploaded photo. Applying the same URL twice is a no-op.
    fn attach_image(&self, report_id: &ReportId, url: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Postgres-backed repository over the `issues` table.
#[derive(Debug, Clone)]
pub struct PgReportRepository {
    db: PgPool,
}

impl PgReportRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

impl ReportRepository for PgReportRepository {
    async fn create(&self, report: &NewIssueReport) -> Result<ReportId> {
        let id = issues::insert_issue(&self.db, report)
            .await
            .log_as("Insert issue error", Error::Persistence)?;
        log::info!("Created issue report {} ({})", id, report.issue_type);
        Ok(ReportId(id))
    }

    async fn attach_image(&self, report_id: &ReportId, url: &str) -> Result<()> {
        let updated = issues::set_image_url(&self.db, report_id.0, url)
            .await
            .log_as("Attach issue image error", Error::Persistence)?;

        if updated == 0 {
            return Err(Error::Persistence(format!("no issue report with id {}", report_id)));
        }
        Ok(())
    }
}

/// A report as held by [`MemoryReportRepository`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredReport {
    pub report: NewIssueReport,
    pub created_at: DateTime<Utc>,
    pub image_url: Option<String>,
}

/// Process-local repository used by dry runs. Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct MemoryReportRepository {
    records: Arc<Mutex<BTreeMap<i64, StoredReport>>>,
}

impl MemoryReportRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, report_id: &ReportId) -> Option<StoredReport> {
        self.records().get(&report_id.0).cloned()
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    fn records(&self) -> MutexGuard<'_, BTreeMap<i64, StoredReport>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ReportRepository for MemoryReportRepository {
    async fn create(&self, report: &NewIssueReport) -> Result<ReportId> {
        let mut records = self.records();
        let id = records.keys().next_back().map_or(1, |last| last + 1);
        records.insert(
            id,
            StoredReport {
                report: report.clone(),
                created_at: Utc::now(),
                image_url: None,
            },
        );
        log::info!("Created in-memory issue report {} ({})", id, report.issue_type);
        Ok(ReportId(id))
    }

    async fn attach_image(&self, report_id: &ReportId, url: &str) -> Result<()> {
        let mut records = self.records();
        let stored = records
            .get_mut(&report_id.0)
            .ok_or_else(|| Error::Persistence(format!("no issue report with id {}", report_id)))?;
        stored.image_url = Some(url.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Assessment;

    fn report() -> NewIssueReport {
        let assessment = Assessment {
            issue_type: "pothole".to_string(),
            confidence: 0.82,
        };
        NewIssueReport::pending(&assessment, None, Utc::now())
    }

    #[tokio::test]
    async fn ids_are_unique_and_increasing() {
        let repo = MemoryReportRepository::new();
        let first = repo.create(&report()).await.unwrap();
        let second = repo.create(&report()).await.unwrap();

        assert_eq!(first, ReportId(1));
        assert_eq!(second, ReportId(2));
        assert_eq!(repo.len(), 2);
    }

    #[tokio::test]
    async fn attach_image_is_idempotent() {
        let repo = MemoryReportRepository::new();
        let id = repo.create(&report()).await.unwrap();
        let url = "https://storage.googleapis.com/bucket/issues/1.jpg";

        repo.attach_image(&id, url).await.unwrap();
        let once = repo.get(&id).unwrap();
        repo.attach_image(&id, url).await.unwrap();
        let twice = repo.get(&id).unwrap();

        assert_eq!(once, twice);
        assert_eq!(twice.image_url.as_deref(), Some(url));
    }

    #[tokio::test]
    async fn attach_image_to_unknown_report_fails() {
        let repo = MemoryReportRepository::new();
        let err = repo.attach_image(&ReportId(99), "file:///x.jpg").await.unwrap_err();
        assert!(matches!(err, Error::Persistence(_)));
    }
}
