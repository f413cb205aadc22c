//! HTTP client for the document backend's REST API.

use std::time::Duration;

use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use deepsearch_core::config::docstore::DocstoreConfig;
use deepsearch_core::error::AppError;
use deepsearch_core::result::AppResult;
use deepsearch_core::types::DocumentId;
use deepsearch_entity::document::{Document, DocumentList, PageOcr};

/// Query parameters for the document listing, passed through verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentQuery {
    /// Field to order results by.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordering: Option<String>,
    /// Page number within the paginated result set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Number of results per page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

/// Metadata accompanying a document upload.
#[derive(Debug, Clone)]
pub struct NewDocumentUpload {
    /// Required backend document type id.
    pub document_type_id: i64,
    /// Optional label.
    pub label: Option<String>,
    /// Optional description.
    pub description: Option<String>,
    /// Optional language code.
    pub language: Option<String>,
    /// Original filename.
    pub filename: String,
    /// MIME type reported by the uploader.
    pub content_type: Option<String>,
    /// File content.
    pub data: Bytes,
}

/// Client for the document backend.
#[derive(Debug, Clone)]
pub struct DocstoreClient {
    http: reqwest::Client,
    config: DocstoreConfig,
}

impl DocstoreClient {
    /// Build a client from docstore configuration.
    pub fn new(config: DocstoreConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// List documents with the backend's own pagination.
    pub async fn list_documents(&self, query: &DocumentQuery) -> AppResult<DocumentList> {
        debug!(
            ordering = ?query.ordering,
            page = ?query.page,
            page_size = ?query.page_size,
            "Fetching documents from backend"
        );

        let mut request = self
            .http
            .get(self.url("/api/documents/"))
            .basic_auth(&self.config.username, Some(&self.config.password));

        if let Some(ordering) = &query.ordering {
            request = request.query(&[("_ordering", ordering.as_str())]);
        }
        if let Some(page) = query.page {
            request = request.query(&[("page", page)]);
        }
        if let Some(page_size) = query.page_size {
            request = request.query(&[("page_size", page_size)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::external(format!("Document backend unreachable: {e}")))?;

        Self::check_status(response, "list documents")
            .await?
            .json()
            .await
            .map_err(|e| AppError::external(format!("Malformed document list: {e}")))
    }

    /// Fetch one document.
    pub async fn get_document(&self, document_id: &DocumentId) -> AppResult<Document> {
        let response = self
            .http
            .get(self.url(&format!("/api/documents/{document_id}/")))
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()
            .await
            .map_err(|e| AppError::external(format!("Document backend unreachable: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::not_found(format!(
                "Document {document_id} not found"
            )));
        }

        Self::check_status(response, "get document")
            .await?
            .json()
            .await
            .map_err(|e| AppError::external(format!("Malformed document record: {e}")))
    }

    /// Upload a new document with its file content (multipart).
    pub async fn upload_document(&self, upload: NewDocumentUpload) -> AppResult<Document> {
        info!(
            filename = %upload.filename,
            size = upload.data.len(),
            document_type_id = upload.document_type_id,
            "Uploading document to backend"
        );

        let mut file_part = Part::bytes(upload.data.to_vec()).file_name(upload.filename.clone());
        if let Some(content_type) = &upload.content_type {
            file_part = file_part
                .mime_str(content_type)
                .map_err(|e| AppError::validation(format!("Invalid content type: {e}")))?;
        }

        let mut form = Form::new()
            .text("document_type_id", upload.document_type_id.to_string())
            .part("file", file_part);

        if let Some(label) = upload.label.filter(|l| !l.is_empty()) {
            form = form.text("label", label);
        }
        if let Some(description) = upload.description.filter(|d| !d.is_empty()) {
            form = form.text("description", description);
        }
        if let Some(language) = upload.language.filter(|l| !l.is_empty()) {
            form = form.text("language", language);
        }

        let response = self
            .http
            .post(self.url("/api/v4/documents/upload/"))
            .basic_auth(&self.config.username, Some(&self.config.password))
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::external(format!("Document backend unreachable: {e}")))?;

        let document: Document = Self::check_status(response, "upload document")
            .await?
            .json()
            .await
            .map_err(|e| AppError::external(format!("Malformed upload response: {e}")))?;

        info!(document_id = document.id, "Document uploaded");
        Ok(document)
    }

    /// Delete (trash) a document.
    pub async fn delete_document(&self, document_id: &DocumentId) -> AppResult<()> {
        info!(document_id = %document_id, "Deleting document from backend");

        let response = self
            .http
            .delete(self.url(&format!("/api/documents/{document_id}/")))
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()
            .await
            .map_err(|e| AppError::external(format!("Document backend unreachable: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::not_found(format!(
                "Document {document_id} not found"
            )));
        }

        Self::check_status(response, "delete document").await?;
        Ok(())
    }

    /// Fetch recognized text for one page of a document version.
    pub async fn page_ocr(
        &self,
        document_id: &DocumentId,
        version_id: &str,
        page_id: &str,
    ) -> AppResult<PageOcr> {
        debug!(
            document_id = %document_id,
            version_id,
            page_id,
            "Fetching OCR content from backend"
        );

        let response = self
            .http
            .get(self.url(&format!(
                "/api/documents/{document_id}/versions/{version_id}/pages/{page_id}/ocr/"
            )))
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()
            .await
            .map_err(|e| AppError::external(format!("Document backend unreachable: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::not_found(format!(
                "OCR for document {document_id} page {page_id} not found"
            )));
        }

        Self::check_status(response, "fetch OCR")
            .await?
            .json()
            .await
            .map_err(|e| AppError::external(format!("Malformed OCR response: {e}")))
    }

    /// Check backend reachability for the health endpoint.
    pub async fn health_check(&self) -> bool {
        self.http
            .get(self.url("/api/documents/"))
            .basic_auth(&self.config.username, Some(&self.config.password))
            .query(&[("page_size", 1)])
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    /// Map a non-success response into an external-service error.
    async fn check_status(
        response: reqwest::Response,
        operation: &str,
    ) -> AppResult<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(AppError::external(format!(
            "Document backend {operation} failed with {status}: {body}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> DocstoreClient {
        DocstoreClient::new(DocstoreConfig {
            base_url: "http://mayan:80/".to_string(),
            username: "admin".to_string(),
            password: "password".to_string(),
            connect_timeout_seconds: 5,
            request_timeout_seconds: 5,
        })
        .expect("client")
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let c = client();
        assert_eq!(c.url("/api/documents/"), "http://mayan:80/api/documents/");
    }

    #[test]
    fn test_ocr_path_shape() {
        let c = client();
        let doc = DocumentId::new("7");
        assert_eq!(
            c.url(&format!("/api/documents/{doc}/versions/3/pages/1/ocr/")),
            "http://mayan:80/api/documents/7/versions/3/pages/1/ocr/"
        );
    }
}
