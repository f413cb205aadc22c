//! Persisted document summaries.

pub mod model;

pub use model::{DocumentSummary, SummaryResult};
