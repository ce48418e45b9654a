//! Report persistence layer
//!
//! Responsible for storing and loading report records and their sections.
//! In-memory for development and tests; Postgres for deployment.

use crate::error::ReportError;
use crate::models::{Report, ReportStatus, SectionKey, StoredSection};
use chrono::Utc;
use sqlx::{PgPool, Row};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{OnceCell, RwLock};
use tracing::warn;
use uuid::Uuid;

/// Fields required to create a report record.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub title: String,
    pub user_id: Option<Uuid>,
    pub startup_id: Option<String>,
    pub report_type: Option<String>,
    pub parameters: serde_json::Value,
}

/// Trait for report persistence
#[async_trait::async_trait]
pub trait ReportStore: Send + Sync {
    async fn create_report(&self, new: NewReport) -> crate::Result<Report>;
    async fn get_report(&self, id: Uuid) -> crate::Result<Option<Report>>;
    /// Replace the report's sections from a storage-key → text mapping.
    async fn update_sections(
        &self,
        id: Uuid,
        sections: &BTreeMap<String, String>,
    ) -> crate::Result<()>;
    async fn update_status(
        &self,
        id: Uuid,
        status: ReportStatus,
        progress: i32,
    ) -> crate::Result<()>;
    async fn set_document_url(&self, id: Uuid, url: &str) -> crate::Result<()>;
    /// The `auto_approve_reports` system setting. Errors when the setting
    /// cannot be read; callers decide the fallback.
    async fn auto_approve_reports(&self) -> crate::Result<bool>;
}

/// Terminal status for a finished generation run.
///
/// Auto-approval is opt-in: a failed or absent settings lookup resolves to
/// manual review, never silent approval.
pub async fn resolve_completion_status(store: &dyn ReportStore) -> ReportStatus {
    match store.auto_approve_reports().await {
        Ok(true) => ReportStatus::Approved,
        Ok(false) => ReportStatus::ReadyForReview,
        Err(e) => {
            warn!(
                "Could not read auto-approve setting, defaulting to manual review: {}",
                e
            );
            ReportStatus::ReadyForReview
        }
    }
}

fn sections_from_map(sections: &BTreeMap<String, String>) -> Vec<StoredSection> {
    let mut stored: Vec<StoredSection> = sections
        .iter()
        .map(|(key, content)| {
            let (title, position) = match SectionKey::from_storage_key(key) {
                Some(section) => (section.document_title(), section.position()),
                None => (key.clone(), u32::MAX),
            };
            StoredSection {
                section_key: key.clone(),
                title,
                content: content.clone(),
                position,
            }
        })
        .collect();
    stored.sort_by_key(|s| s.position);
    stored
}

/// In-memory report store for development
pub struct InMemoryReportStore {
    reports: Arc<RwLock<HashMap<Uuid, Report>>>,
    auto_approve: Arc<RwLock<Option<bool>>>,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self {
            reports: Arc::new(RwLock::new(HashMap::new())),
            auto_approve: Arc::new(RwLock::new(None)),
        }
    }

    /// Set (or unset) the auto-approve system setting.
    pub async fn set_auto_approve(&self, value: Option<bool>) {
        let mut setting = self.auto_approve.write().await;
        *setting = value;
    }
}

impl Default for InMemoryReportStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ReportStore for InMemoryReportStore {
    async fn create_report(&self, new: NewReport) -> crate::Result<Report> {
        let report = Report {
            id: Uuid::new_v4(),
            title: new.title,
            user_id: new.user_id,
            startup_id: new.startup_id,
            report_type: new.report_type,
            parameters: new.parameters,
            status: ReportStatus::Pending,
            progress: 0,
            sections: Vec::new(),
            document_url: None,
            created_at: Utc::now(),
            completed_at: None,
        };

        let mut reports = self.reports.write().await;
        reports.insert(report.id, report.clone());
        Ok(report)
    }

    async fn get_report(&self, id: Uuid) -> crate::Result<Option<Report>> {
        let reports = self.reports.read().await;
        Ok(reports.get(&id).cloned())
    }

    async fn update_sections(
        &self,
        id: Uuid,
        sections: &BTreeMap<String, String>,
    ) -> crate::Result<()> {
        let mut reports = self.reports.write().await;
        let report = reports.get_mut(&id).ok_or(ReportError::ReportNotFound(id))?;
        report.sections = sections_from_map(sections);
        Ok(())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: ReportStatus,
        progress: i32,
    ) -> crate::Result<()> {
        let mut reports = self.reports.write().await;
        let report = reports.get_mut(&id).ok_or(ReportError::ReportNotFound(id))?;
        report.status = status;
        report.progress = progress;
        if matches!(
            status,
            ReportStatus::Completed | ReportStatus::ReadyForReview | ReportStatus::Approved
        ) {
            report.completed_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn set_document_url(&self, id: Uuid, url: &str) -> crate::Result<()> {
        let mut reports = self.reports.write().await;
        let report = reports.get_mut(&id).ok_or(ReportError::ReportNotFound(id))?;
        report.document_url = Some(url.to_string());
        Ok(())
    }

    async fn auto_approve_reports(&self) -> crate::Result<bool> {
        let setting = self.auto_approve.read().await;
        setting.ok_or_else(|| {
            ReportError::DatabaseError("auto_approve_reports setting not found".to_string())
        })
    }
}

/// Postgres-backed report store
pub struct PostgresReportStore {
    pool: PgPool,
    schema_ready: Arc<OnceCell<()>>,
}

impl PostgresReportStore {
    pub fn connect_lazy(database_url: &str) -> crate::Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect_lazy(database_url)
            .map_err(|e| {
                ReportError::DatabaseError(format!("Failed to initialize postgres pool: {}", e))
            })?;

        Ok(Self {
            pool,
            schema_ready: Arc::new(OnceCell::new()),
        })
    }

    async fn ensure_schema(&self) -> crate::Result<()> {
        self.schema_ready
            .get_or_try_init(|| async {
                sqlx::query(
                    r#"
                    CREATE TABLE IF NOT EXISTS reports (
                      id UUID PRIMARY KEY,
                      title TEXT NOT NULL,
                      user_id UUID,
                      startup_id TEXT,
                      report_type TEXT,
                      parameters JSONB NOT NULL DEFAULT '{}'::jsonb,
                      status TEXT NOT NULL,
                      progress INTEGER NOT NULL DEFAULT 0,
                      document_url TEXT,
                      created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                      completed_at TIMESTAMPTZ
                    );
                    "#,
                )
                .execute(&self.pool)
                .await?;

                sqlx::query(
                    r#"
                    CREATE TABLE IF NOT EXISTS report_sections (
                      report_id UUID NOT NULL,
                      section_key TEXT NOT NULL,
                      title TEXT NOT NULL,
                      content TEXT NOT NULL,
                      position INTEGER NOT NULL,
                      PRIMARY KEY (report_id, section_key)
                    );
                    "#,
                )
                .execute(&self.pool)
                .await?;

                sqlx::query(
                    r#"
                    CREATE TABLE IF NOT EXISTS system_settings (
                      key TEXT PRIMARY KEY,
                      value JSONB NOT NULL
                    );
                    "#,
                )
                .execute(&self.pool)
                .await?;

                Ok::<(), sqlx::Error>(())
            })
            .await
            .map_err(|e| {
                ReportError::DatabaseError(format!("Failed to initialize report schema: {}", e))
            })?;

        Ok(())
    }

    fn row_to_report(row: &sqlx::postgres::PgRow, sections: Vec<StoredSection>) -> Report {
        let status: String = row.try_get("status").unwrap_or_default();
        Report {
            id: row.try_get("id").unwrap_or_else(|_| Uuid::nil()),
            title: row.try_get("title").unwrap_or_default(),
            user_id: row.try_get("user_id").ok(),
            startup_id: row.try_get("startup_id").ok(),
            report_type: row.try_get("report_type").ok(),
            parameters: row
                .try_get("parameters")
                .unwrap_or(serde_json::Value::Null),
            status: ReportStatus::from_str_lossy(&status),
            progress: row.try_get("progress").unwrap_or(0),
            sections,
            document_url: row.try_get("document_url").ok(),
            created_at: row.try_get("created_at").unwrap_or_else(|_| Utc::now()),
            completed_at: row.try_get("completed_at").ok(),
        }
    }
}

#[async_trait::async_trait]
impl ReportStore for PostgresReportStore {
    async fn create_report(&self, new: NewReport) -> crate::Result<Report> {
        self.ensure_schema().await?;

        let report = Report {
            id: Uuid::new_v4(),
            title: new.title,
            user_id: new.user_id,
            startup_id: new.startup_id,
            report_type: new.report_type,
            parameters: new.parameters,
            status: ReportStatus::Pending,
            progress: 0,
            sections: Vec::new(),
            document_url: None,
            created_at: Utc::now(),
            completed_at: None,
        };

        sqlx::query(
            r#"
            INSERT INTO reports
              (id, title, user_id, startup_id, report_type, parameters, status, progress, created_at)
            VALUES
              ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(report.id)
        .bind(&report.title)
        .bind(report.user_id)
        .bind(&report.startup_id)
        .bind(&report.report_type)
        .bind(&report.parameters)
        .bind(report.status.as_str())
        .bind(report.progress)
        .bind(report.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| ReportError::DatabaseError(format!("Failed to insert report: {}", e)))?;

        Ok(report)
    }

    async fn get_report(&self, id: Uuid) -> crate::Result<Option<Report>> {
        self.ensure_schema().await?;

        let row = sqlx::query("SELECT * FROM reports WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ReportError::DatabaseError(format!("Failed to load report: {}", e)))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let section_rows = sqlx::query(
            "SELECT section_key, title, content, position FROM report_sections \
             WHERE report_id = $1 ORDER BY position ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ReportError::DatabaseError(format!("Failed to load sections: {}", e)))?;

        let sections = section_rows
            .iter()
            .map(|s| StoredSection {
                section_key: s.try_get("section_key").unwrap_or_default(),
                title: s.try_get("title").unwrap_or_default(),
                content: s.try_get("content").unwrap_or_default(),
                position: s.try_get::<i32, _>("position").unwrap_or(0).max(0) as u32,
            })
            .collect();

        Ok(Some(Self::row_to_report(&row, sections)))
    }

    async fn update_sections(
        &self,
        id: Uuid,
        sections: &BTreeMap<String, String>,
    ) -> crate::Result<()> {
        self.ensure_schema().await?;

        let mut tx = self.pool.begin().await.map_err(|e| {
            ReportError::DatabaseError(format!("Failed to begin section transaction: {}", e))
        })?;

        sqlx::query("DELETE FROM report_sections WHERE report_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                ReportError::DatabaseError(format!("Failed to clear old sections: {}", e))
            })?;

        for section in sections_from_map(sections) {
            sqlx::query(
                r#"
                INSERT INTO report_sections (report_id, section_key, title, content, position)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(id)
            .bind(&section.section_key)
            .bind(&section.title)
            .bind(&section.content)
            .bind(section.position as i32)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                ReportError::DatabaseError(format!("Failed to insert section: {}", e))
            })?;
        }

        tx.commit().await.map_err(|e| {
            ReportError::DatabaseError(format!("Failed to commit section transaction: {}", e))
        })?;

        Ok(())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: ReportStatus,
        progress: i32,
    ) -> crate::Result<()> {
        self.ensure_schema().await?;

        let completed_at = matches!(
            status,
            ReportStatus::Completed | ReportStatus::ReadyForReview | ReportStatus::Approved
        )
        .then(Utc::now);

        sqlx::query(
            "UPDATE reports SET status = $2, progress = $3, \
             completed_at = COALESCE($4, completed_at) WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(progress)
        .bind(completed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| ReportError::DatabaseError(format!("Failed to update status: {}", e)))?;

        Ok(())
    }

    async fn set_document_url(&self, id: Uuid, url: &str) -> crate::Result<()> {
        self.ensure_schema().await?;

        sqlx::query("UPDATE reports SET document_url = $2 WHERE id = $1")
            .bind(id)
            .bind(url)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                ReportError::DatabaseError(format!("Failed to set document url: {}", e))
            })?;

        Ok(())
    }

    async fn auto_approve_reports(&self) -> crate::Result<bool> {
        self.ensure_schema().await?;

        let row = sqlx::query("SELECT value FROM system_settings WHERE key = 'auto_approve_reports'")
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                ReportError::DatabaseError(format!("Failed to read auto-approve setting: {}", e))
            })?;

        // Absent setting means approval was never opted into.
        Ok(row
            .and_then(|r| r.try_get::<serde_json::Value, _>("value").ok())
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }
}
