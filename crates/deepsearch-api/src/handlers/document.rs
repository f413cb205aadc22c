//! Document proxy handlers.

use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use bytes::Bytes;

use deepsearch_core::error::AppError;
use deepsearch_core::types::DocumentId;
use deepsearch_docstore::NewDocumentUpload;
use deepsearch_entity::document::{Document, DocumentList, PageOcr};
use deepsearch_entity::summary::SummaryResult;

use crate::dto::request::DocumentListQuery;
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/documents
pub async fn list_documents(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<DocumentListQuery>,
) -> Result<Json<ApiResponse<DocumentList>>, ApiError> {
    let documents = state.docstore.list_documents(&query.into()).await?;
    Ok(Json(ApiResponse::ok(documents)))
}

/// GET /api/documents/{id}
pub async fn get_document(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Document>>, ApiError> {
    let document = state.docstore.get_document(&DocumentId::new(id)).await?;
    Ok(Json(ApiResponse::ok(document)))
}

/// POST /api/documents/upload (multipart, admin only)
pub async fn upload_document(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<Document>>), ApiError> {
    auth.require_admin()?;

    let mut document_type_id: Option<i64> = None;
    let mut label: Option<String> = None;
    let mut description: Option<String> = None;
    let mut language: Option<String> = None;
    let mut filename: Option<String> = None;
    let mut content_type: Option<String> = None;
    let mut data: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "document_type_id" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::validation(format!("Read error: {e}")))?;
                document_type_id = Some(
                    text.parse::<i64>()
                        .map_err(|_| AppError::validation("Invalid document_type_id"))?,
                );
            }
            "label" => {
                label = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::validation(format!("Read error: {e}")))?,
                );
            }
            "description" => {
                description = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::validation(format!("Read error: {e}")))?,
                );
            }
            "language" => {
                language = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::validation(format!("Read error: {e}")))?,
                );
            }
            "file" => {
                filename = field.file_name().map(String::from);
                content_type = field.content_type().map(String::from);
                data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| AppError::validation(format!("Read error: {e}")))?,
                );
            }
            _ => {}
        }
    }

    let data = data.ok_or_else(|| AppError::validation("File is required for upload"))?;
    if data.is_empty() {
        return Err(AppError::validation("File is required for upload").into());
    }
    let document_type_id =
        document_type_id.ok_or_else(|| AppError::validation("document_type_id is required"))?;

    let document = state
        .docstore
        .upload_document(NewDocumentUpload {
            document_type_id,
            label,
            description,
            language,
            filename: filename.unwrap_or_else(|| "upload.bin".to_string()),
            content_type,
            data,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(document))))
}

/// DELETE /api/documents/{id} (admin only)
pub async fn delete_document(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    auth.require_admin()?;
    state
        .docstore
        .delete_document(&DocumentId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/documents/{id}/versions/{vid}/pages/{pid}/ocr
pub async fn page_ocr(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path((id, version_id, page_id)): Path<(String, String, String)>,
) -> Result<Json<ApiResponse<PageOcr>>, ApiError> {
    let ocr = state
        .docstore
        .page_ocr(&DocumentId::new(id), &version_id, &page_id)
        .await?;
    Ok(Json(ApiResponse::ok(ocr)))
}

/// POST /api/documents/{id}/versions/{vid}/pages/{pid}/summarize
pub async fn summarize_page(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, version_id, page_id)): Path<(String, String, String)>,
) -> Result<Json<ApiResponse<SummaryResult>>, ApiError> {
    let summary = state
        .summarizer
        .summarize_page(&auth.user_id, &DocumentId::new(id), &version_id, &page_id)
        .await?;
    Ok(Json(ApiResponse::ok(summary)))
}
