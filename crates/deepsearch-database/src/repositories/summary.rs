//! Document summary repository implementation.

use chrono::Utc;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use deepsearch_core::error::{AppError, ErrorKind};
use deepsearch_core::result::AppResult;
use deepsearch_core::types::{DocumentId, UserId};
use deepsearch_entity::summary::DocumentSummary;

/// Repository for cached document summaries.
#[derive(Debug, Clone)]
pub struct SummaryRepository {
    pool: PgPool,
}

impl SummaryRepository {
    /// Create a new summary repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Look up a cached summary by its (document, version, page) key.
    pub async fn find_by_page(
        &self,
        document_id: &DocumentId,
        version_id: &str,
        page_id: &str,
    ) -> AppResult<Option<DocumentSummary>> {
        sqlx::query_as::<_, DocumentSummary>(
            "SELECT id, document_id, version_id, page_id, summary, keywords, requested_by, created_at \
             FROM document_summaries \
             WHERE document_id = $1 AND version_id = $2 AND page_id = $3",
        )
        .bind(document_id)
        .bind(version_id)
        .bind(page_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to look up summary", e))
    }

    /// Persist a freshly generated summary.
    ///
    /// Concurrent requests for the same page race benignly: the unique key
    /// makes the second insert a no-op and the stored row wins.
    pub async fn insert(
        &self,
        document_id: &DocumentId,
        version_id: &str,
        page_id: &str,
        summary: &str,
        keywords: &[String],
        requested_by: &UserId,
    ) -> AppResult<DocumentSummary> {
        let record = DocumentSummary {
            id: Uuid::new_v4(),
            document_id: document_id.clone(),
            version_id: version_id.to_string(),
            page_id: page_id.to_string(),
            summary: summary.to_string(),
            keywords: Json(keywords.to_vec()),
            requested_by: requested_by.clone(),
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO document_summaries \
             (id, document_id, version_id, page_id, summary, keywords, requested_by, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (document_id, version_id, page_id) DO NOTHING",
        )
        .bind(record.id)
        .bind(&record.document_id)
        .bind(&record.version_id)
        .bind(&record.page_id)
        .bind(&record.summary)
        .bind(&record.keywords)
        .bind(&record.requested_by)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to store summary", e))?;

        Ok(record)
    }
}
