//! Document backend wire shapes.

pub mod model;

pub use model::{Document, DocumentFile, DocumentList, DocumentType, DocumentVersion, PageOcr};
