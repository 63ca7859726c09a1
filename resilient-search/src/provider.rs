//! Trait definition for pluggable search providers.
//!
//! Each search backend (Tavily, DuckDuckGo) implements [`ProviderClient`]
//! to provide a uniform interface for querying and normalising results.

use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::error::SearchError;
use crate::types::{FailureKind, ProviderHits, ProviderOutcome, SearchQuery};

/// A pluggable search backend.
///
/// Implementors talk to one external search service and turn its native
/// response into [`ProviderResult`](crate::types::ProviderResult) values.
/// Each provider handles its own:
///
/// - Request construction and credential handling
/// - Defensive response parsing (missing fields become empty values)
/// - Score synthesis when the service does not report one
///
/// The orchestrator only ever calls [`ProviderClient::call`], which never
/// fails: configuration gaps, transport errors, and timeouts all come back
/// as [`ProviderOutcome::Failed`].
///
/// All implementations must be `Send + Sync` for concurrent fan-out.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Stable identifier used in `provider_status` and `source_provider`.
    fn id(&self) -> &str;

    /// Whether the provider has what it needs (e.g. a credential) to run.
    fn is_configured(&self) -> bool {
        true
    }

    /// Query the backend and normalise its results.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] if the request fails or the response cannot
    /// be parsed.
    async fn fetch(&self, query: &SearchQuery) -> Result<ProviderHits, SearchError>;

    /// Run [`fetch`](Self::fetch) bounded by `timeout`, converting every
    /// failure into a [`ProviderOutcome`].
    ///
    /// An unconfigured provider fails immediately with
    /// [`FailureKind::NotConfigured`] and performs no I/O.
    async fn call(&self, query: &SearchQuery, timeout: Duration) -> ProviderOutcome {
        if !self.is_configured() {
            return ProviderOutcome::failed(
                FailureKind::NotConfigured,
                format!("{} is not configured", self.id()),
            );
        }

        let started = Instant::now();
        match tokio::time::timeout(timeout, self.fetch(query)).await {
            Ok(Ok(hits)) => ProviderOutcome::Ok {
                results: hits.results,
                answer: hits.answer,
                elapsed: started.elapsed(),
            },
            Ok(Err(err)) => err.into(),
            Err(_) => ProviderOutcome::failed(
                FailureKind::Timeout,
                format!("{} timed out after {timeout:?}", self.id()),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ProviderResult, SearchKind};

    /// A mock provider for testing trait bounds and outcome conversion.
    struct MockProvider {
        configured: bool,
        delay: Duration,
        result: Result<Vec<ProviderResult>, &'static str>,
    }

    #[async_trait]
    impl ProviderClient for MockProvider {
        fn id(&self) -> &str {
            "mock"
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn fetch(&self, _query: &SearchQuery) -> Result<ProviderHits, SearchError> {
            tokio::time::sleep(self.delay).await;
            match &self.result {
                Ok(results) => Ok(ProviderHits {
                    results: results.clone(),
                    answer: Some("42".into()),
                }),
                Err(msg) => Err(SearchError::Http((*msg).into())),
            }
        }
    }

    fn query() -> SearchQuery {
        SearchQuery::new("test", SearchKind::General, 5).expect("valid")
    }

    #[test]
    fn mock_provider_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MockProvider>();
    }

    #[tokio::test]
    async fn successful_fetch_becomes_ok_outcome() {
        let provider = MockProvider {
            configured: true,
            delay: Duration::ZERO,
            result: Ok(vec![ProviderResult::new("T", "https://t.com", "", 0.9, "mock")]),
        };
        match provider.call(&query(), Duration::from_secs(1)).await {
            ProviderOutcome::Ok {
                results, answer, ..
            } => {
                assert_eq!(results.len(), 1);
                assert_eq!(answer.as_deref(), Some("42"));
            }
            other => panic!("expected Ok, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_error_becomes_transport_failure() {
        let provider = MockProvider {
            configured: true,
            delay: Duration::ZERO,
            result: Err("connection refused"),
        };
        let outcome = provider.call(&query(), Duration::from_secs(1)).await;
        assert_eq!(outcome.classification(), Some(FailureKind::TransportError));
    }

    #[tokio::test]
    async fn slow_fetch_becomes_timeout() {
        let provider = MockProvider {
            configured: true,
            delay: Duration::from_secs(5),
            result: Ok(vec![]),
        };
        let outcome = provider.call(&query(), Duration::from_millis(20)).await;
        assert_eq!(outcome.classification(), Some(FailureKind::Timeout));
    }

    #[tokio::test]
    async fn unconfigured_provider_fails_without_fetching() {
        let provider = MockProvider {
            configured: false,
            delay: Duration::from_secs(5),
            result: Ok(vec![]),
        };
        let outcome = provider.call(&query(), Duration::from_secs(10)).await;
        assert_eq!(outcome.classification(), Some(FailureKind::NotConfigured));
    }
}
