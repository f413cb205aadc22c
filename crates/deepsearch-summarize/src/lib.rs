//! # deepsearch-summarize
//!
//! Summarization pipeline: fetch a page's OCR text from the document
//! backend, send it to an external chat-completion endpoint, parse the
//! strict-JSON reply, and persist the result keyed by
//! (document, version, page). The model itself is fully external; this
//! crate only orchestrates.

pub mod parser;
pub mod prompt;
pub mod service;

pub use service::SummarizeService;
