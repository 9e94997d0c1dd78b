//! Error types for the exporter.

pub mod types;

pub use types::{AppError, PollError};

/// Convenience result alias for application-level operations
pub type AppResult<T> = Result<T, AppError>;
