//! Application-wide result alias.

use crate::error::AppError;

/// Shorthand result type used across all DeepSearch crates.
pub type AppResult<T> = Result<T, AppError>;
