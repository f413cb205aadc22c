//! # deepsearch-docstore
//!
//! Proxy client for the external document-management backend. Document
//! storage, rendering, indexing, and OCR all live there; this crate only
//! forwards requests and maps responses into domain shapes.

pub mod client;

pub use client::{DocstoreClient, DocumentQuery, NewDocumentUpload};
