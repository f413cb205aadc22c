//! # deepsearch-database
//!
//! PostgreSQL access layer: connection pool management, embedded
//! migrations, and repositories for the two things this service persists —
//! notifications and document summaries. Everything else (users,
//! documents) lives in external systems.

pub mod connection;
pub mod migration;
pub mod repositories;
