//! Summarization orchestration.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

use deepsearch_core::config::summarizer::SummarizerConfig;
use deepsearch_core::error::AppError;
use deepsearch_core::result::AppResult;
use deepsearch_core::types::{DocumentId, UserId};
use deepsearch_database::repositories::SummaryRepository;
use deepsearch_docstore::DocstoreClient;
use deepsearch_entity::summary::SummaryResult;

use crate::{parser, prompt};

/// Response shape of the chat-completions endpoint.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// Generates and caches page summaries.
#[derive(Debug)]
pub struct SummarizeService {
    http: reqwest::Client,
    config: SummarizerConfig,
    docstore: Arc<DocstoreClient>,
    summaries: Arc<SummaryRepository>,
}

impl SummarizeService {
    /// Build the service from configuration and its collaborators.
    pub fn new(
        config: SummarizerConfig,
        docstore: Arc<DocstoreClient>,
        summaries: Arc<SummaryRepository>,
    ) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            config,
            docstore,
            summaries,
        })
    }

    /// Summarize one page of a document version.
    ///
    /// Returns the cached summary when one exists for the
    /// (document, version, page) key; otherwise fetches the OCR text,
    /// calls the model, persists, and returns the fresh result.
    pub async fn summarize_page(
        &self,
        requested_by: &UserId,
        document_id: &DocumentId,
        version_id: &str,
        page_id: &str,
    ) -> AppResult<SummaryResult> {
        if let Some(existing) = self
            .summaries
            .find_by_page(document_id, version_id, page_id)
            .await?
        {
            debug!(
                document_id = %document_id,
                version_id,
                page_id,
                "Returning cached summary"
            );
            return Ok(existing.into_result());
        }

        let ocr = self
            .docstore
            .page_ocr(document_id, version_id, page_id)
            .await?;

        if ocr.content.trim().is_empty() {
            return Err(AppError::not_found(format!(
                "Document {document_id} page {page_id} has no OCR text to summarize"
            )));
        }

        let reply = self
            .complete(&prompt::build(&ocr.content, self.config.max_content_chars))
            .await?;
        let result = parser::parse_reply(&reply)?;

        self.summaries
            .insert(
                document_id,
                version_id,
                page_id,
                &result.summary,
                &result.keywords,
                requested_by,
            )
            .await?;

        info!(
            document_id = %document_id,
            version_id,
            page_id,
            keywords = result.keywords.len(),
            "Summary generated and stored"
        );

        Ok(result)
    }

    /// Send one user prompt to the chat-completions endpoint and return the
    /// assistant's reply text.
    async fn complete(&self, user_prompt: &str) -> AppResult<String> {
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [{"role": "user", "content": user_prompt}],
        });

        let mut request = self.http.post(&self.config.endpoint).json(&body);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::external(format!("Model endpoint unreachable: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::external(format!(
                "Model endpoint returned {status}: {body}"
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::external(format!("Malformed model response: {e}")))?;

        chat.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AppError::external("Model response contained no choices"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_response_shape() {
        let json = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": "{\"summary\": \"ok\", \"keywords\": []}"}}
            ]
        }"#;
        let chat: ChatResponse = serde_json::from_str(json).expect("deserialize");
        assert_eq!(chat.choices.len(), 1);
        assert!(chat.choices[0].message.content.contains("summary"));
    }
}
