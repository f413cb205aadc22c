//! Document backend configuration.

use serde::{Deserialize, Serialize};

/// Settings for the external document-management backend (Mayan-compatible
/// REST API). All document storage, rendering, and OCR lives there; this
/// service only proxies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocstoreConfig {
    /// Base URL of the document backend, e.g. `http://mayan:80`.
    pub base_url: String,
    /// Basic-auth username.
    pub username: String,
    /// Basic-auth password.
    pub password: String,
    /// TCP connect timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    /// Overall request timeout in seconds (uploads can be slow).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_connect_timeout() -> u64 {
    60
}

fn default_request_timeout() -> u64 {
    300
}
