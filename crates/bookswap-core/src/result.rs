//! Convenience result type alias for BookSwap.

use crate::error::AppError;

/// A specialized `Result` type for BookSwap operations.
pub type AppResult<T> = Result<T, AppError>;
