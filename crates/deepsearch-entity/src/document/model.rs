//! Shapes returned by the document backend's REST API.
//!
//! These mirror the backend's snake_case wire format and are passed
//! through to API consumers mostly unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One page of the backend's paginated document listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentList {
    /// Total number of documents.
    pub count: i64,
    /// URL of the next page, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    /// URL of the previous page, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
    /// Documents on this page.
    pub results: Vec<Document>,
}

/// A document as reported by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Numeric document id.
    pub id: i64,
    /// Stable UUID assigned by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    /// Human-readable label.
    #[serde(default)]
    pub label: String,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime_created: Option<DateTime<Utc>>,
    /// Language code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Document type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<DocumentType>,
    /// Latest uploaded file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_latest: Option<DocumentFile>,
    /// Active version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_active: Option<DocumentVersion>,
}

/// Document type descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentType {
    /// Type id.
    pub id: i64,
    /// Type label.
    pub label: String,
}

/// A stored file belonging to a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentFile {
    /// File id.
    pub id: i64,
    /// Original filename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// MIME type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    /// Size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    /// Content checksum.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

/// A document version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentVersion {
    /// Version id.
    pub id: i64,
    /// Version comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Sequential version number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_number: Option<i32>,
}

/// OCR text for a single document version page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageOcr {
    /// Recognized page text.
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_parses_backend_payload() {
        let json = r#"{
            "count": 1,
            "next": null,
            "previous": null,
            "results": [{
                "id": 7,
                "uuid": "0e0f2a34-9f2e-4a9c-b2f5-0d1c2e3f4a5b",
                "label": "handbook.pdf",
                "description": "",
                "language": "eng",
                "document_type": {"id": 1, "label": "Default"},
                "file_latest": {"id": 12, "filename": "handbook.pdf", "mimetype": "application/pdf", "size": 102400, "checksum": "abc"},
                "version_active": {"id": 3, "comment": "", "version_number": 1}
            }]
        }"#;
        let list: DocumentList = serde_json::from_str(json).expect("deserialize");
        assert_eq!(list.count, 1);
        let doc = &list.results[0];
        assert_eq!(doc.id, 7);
        assert_eq!(doc.document_type.as_ref().unwrap().label, "Default");
        assert_eq!(
            doc.file_latest.as_ref().unwrap().mimetype.as_deref(),
            Some("application/pdf")
        );
    }
}
