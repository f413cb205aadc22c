//! Document summary entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

use deepsearch_core::types::{DocumentId, UserId};

/// A model-generated summary persisted per (document, version, page).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DocumentSummary {
    /// Primary key.
    pub id: Uuid,
    /// Document the summary belongs to.
    pub document_id: DocumentId,
    /// Document version the OCR text came from.
    pub version_id: String,
    /// Page within the version.
    pub page_id: String,
    /// Summary text.
    pub summary: String,
    /// Extracted keywords, stored as JSONB.
    pub keywords: Json<Vec<String>>,
    /// User who first requested the summary.
    pub requested_by: UserId,
    /// When the summary was generated.
    pub created_at: DateTime<Utc>,
}

impl DocumentSummary {
    /// Project into the API result shape.
    pub fn into_result(self) -> SummaryResult {
        SummaryResult {
            summary: self.summary,
            keywords: self.keywords.0,
        }
    }
}

/// The shape returned to API consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResult {
    /// Summary text.
    pub summary: String,
    /// Extracted keywords.
    pub keywords: Vec<String>,
}
