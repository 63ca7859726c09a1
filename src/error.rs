//! Error types for the sentinel-search application.

use resilient_search::SearchError;

/// Top-level application error.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration file or environment error.
    #[error("config error: {0}")]
    Config(String),

    /// Search engine error (invalid query or engine setup).
    #[error(transparent)]
    Search(#[from] SearchError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, AppError>;
