//! Error types for the resilient-search crate.
//!
//! All errors use stable string messages suitable for display to users
//! and programmatic handling. No API keys or sensitive data appear in
//! error messages.
//!
//! Only [`SearchError::Validation`] ever escapes
//! [`SearchOrchestrator::search`](crate::SearchOrchestrator::search); every
//! other variant is produced inside a provider adapter and converted into a
//! [`ProviderOutcome`](crate::types::ProviderOutcome) value.

use crate::types::FailureKind;

/// Errors that can occur during web search operations.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The provider has no credential configured.
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    /// An HTTP request to a provider failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Failed to parse a provider response body.
    #[error("parse error: {0}")]
    Parse(String),

    /// A provider call exceeded its deadline.
    #[error("search timed out: {0}")]
    Timeout(String),

    /// The provider's circuit breaker short-circuited the call.
    #[error("circuit open: {0}")]
    CircuitOpen(String),

    /// The caller supplied an out-of-range query parameter.
    #[error("invalid query: {0}")]
    Validation(String),

    /// Invalid engine configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl SearchError {
    /// Classification reported in `provider_status` for this error.
    ///
    /// Parse failures count as transport errors: to the caller a malformed
    /// body and a dropped connection are the same kind of problem.
    pub fn classification(&self) -> FailureKind {
        match self {
            Self::NotConfigured(_) => FailureKind::NotConfigured,
            Self::Timeout(_) => FailureKind::Timeout,
            Self::CircuitOpen(_) => FailureKind::CircuitOpen,
            Self::Http(_) | Self::Parse(_) | Self::Validation(_) | Self::Config(_) => {
                FailureKind::TransportError
            }
        }
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Http(err.to_string())
        }
    }
}

/// Convenience type alias for resilient-search results.
pub type Result<T> = std::result::Result<T, SearchError>;
