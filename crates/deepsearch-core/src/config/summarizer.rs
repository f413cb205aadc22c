//! Summarization endpoint configuration.

use serde::{Deserialize, Serialize};

/// Settings for the external chat-completion endpoint used to summarize
/// document pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    /// Chat-completions URL, e.g. `http://llm:11434/v1/chat/completions`.
    pub endpoint: String,
    /// Bearer token for the endpoint, if it requires one.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model identifier sent with every request.
    pub model: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Maximum number of OCR characters sent to the model; longer page
    /// content is truncated.
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
}

fn default_timeout() -> u64 {
    120
}

fn default_max_content_chars() -> usize {
    32_000
}
