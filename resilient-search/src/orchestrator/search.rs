//! Core search orchestrator: cache check, guarded fan-out, merge, rank.
//!
//! Queries every provider concurrently through its circuit breaker under a
//! bounded timeout, waits for all of them, merges the successful lists with
//! the deduplicator/ranker, and reports every provider's outcome.

use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::FutureExt;

use crate::cache::{CacheKey, ResultCache};
use crate::circuit_breaker::{BreakerSnapshot, CircuitBreaker};
use crate::config::EngineConfig;
use crate::error::SearchError;
use crate::provider::ProviderClient;
use crate::providers::{DuckDuckGoProvider, TavilyProvider};
use crate::types::{
    FailureKind, ProviderOutcome, ProviderStatus, SearchKind, SearchOptions, SearchQuery,
    SearchResponse,
};

use super::dedup::ProviderBatch;
use super::rank::merge_and_rank;

/// A provider together with the breaker that guards it.
struct ProviderSlot {
    provider: Arc<dyn ProviderClient>,
    breaker: CircuitBreaker,
}

/// Public entry point for aggregated searches.
///
/// Owns one [`CircuitBreaker`] per provider and the [`ResultCache`]; both
/// live as long as the orchestrator. Providers are consulted in the order
/// given to [`SearchOrchestrator::new`], which is also the merge priority.
pub struct SearchOrchestrator {
    slots: Vec<ProviderSlot>,
    cache: ResultCache,
    config: EngineConfig,
}

impl SearchOrchestrator {
    /// Create an orchestrator over `providers`, in priority order.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if `config` is invalid, no providers
    /// are given, or two providers share an id.
    pub fn new(
        config: EngineConfig,
        providers: Vec<Arc<dyn ProviderClient>>,
    ) -> Result<Self, SearchError> {
        config.validate()?;
        if providers.is_empty() {
            return Err(SearchError::Config("at least one provider is required".into()));
        }

        let mut slots: Vec<ProviderSlot> = Vec::with_capacity(providers.len());
        for provider in providers {
            if slots.iter().any(|s| s.provider.id() == provider.id()) {
                return Err(SearchError::Config(format!(
                    "duplicate provider id: {}",
                    provider.id()
                )));
            }
            let breaker = CircuitBreaker::new(provider.id(), config.breaker());
            slots.push(ProviderSlot { provider, breaker });
        }

        Ok(Self {
            cache: ResultCache::new(config.cache_max_entries),
            slots,
            config,
        })
    }

    /// Tavily first, DuckDuckGo second, both on their public endpoints.
    ///
    /// # Errors
    ///
    /// Same as [`SearchOrchestrator::new`], plus [`SearchError::Http`] if an
    /// HTTP client cannot be built.
    pub fn with_default_providers(
        config: EngineConfig,
        tavily_api_key: Option<String>,
    ) -> Result<Self, SearchError> {
        let providers: Vec<Arc<dyn ProviderClient>> = vec![
            Arc::new(TavilyProvider::new(&config, tavily_api_key)?),
            Arc::new(DuckDuckGoProvider::new(&config)?),
        ];
        Self::new(config, providers)
    }

    /// The engine configuration in use.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Provider ids in priority order.
    pub fn provider_ids(&self) -> Vec<&str> {
        self.slots.iter().map(|s| s.provider.id()).collect()
    }

    /// Breaker snapshots in priority order.
    pub fn breaker_report(&self) -> Vec<(String, BreakerSnapshot)> {
        self.slots
            .iter()
            .map(|s| (s.breaker.provider().to_string(), s.breaker.snapshot()))
            .collect()
    }

    /// Close every breaker and zero its failure count.
    pub fn reset_breakers(&self) {
        for slot in &self.slots {
            slot.breaker.reset();
        }
    }

    /// Drop every cached response.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Run one aggregated search.
    ///
    /// # Pipeline
    ///
    /// 1. Validate the query (the only step that can fail)
    /// 2. Serve from cache on a hit, unless `opts.bypass_cache`
    /// 3. Call every provider concurrently, each through its breaker and
    ///    bounded by `min(provider timeout, opts.deadline)`
    /// 4. Wait for all of them; failures become status entries
    /// 5. Deduplicate and rank the successful lists
    /// 6. Cache non-empty responses
    /// 7. Apply `opts.max_results`
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Validation`] if `text` is blank,
    /// `results_per_provider` is out of range, or `opts.max_results` is
    /// zero. Provider failures never produce an error; when every provider
    /// fails the response is empty and [`SearchResponse::all_failed`] is true.
    pub async fn search(
        &self,
        text: &str,
        kind: SearchKind,
        results_per_provider: usize,
        opts: SearchOptions,
    ) -> Result<SearchResponse, SearchError> {
        let query = SearchQuery::new(text, kind, results_per_provider)?;
        if opts.max_results == Some(0) {
            return Err(SearchError::Validation("max_results must be at least 1".into()));
        }

        let key = CacheKey::new(&query);
        if !opts.bypass_cache {
            if let Some(mut hit) = self.cache.get(&key).await {
                tracing::debug!(kind = %kind, count = hit.results.len(), "cache hit");
                hit.query = query.text().to_string();
                hit.cached = true;
                truncate(&mut hit, opts.max_results);
                return Ok(hit);
            }
        }

        tracing::trace!(query = query.text(), kind = %kind, "dispatching search");

        let timeout = opts
            .deadline
            .map_or(self.config.provider_timeout(), |d| {
                d.min(self.config.provider_timeout())
            });

        let outcomes = futures::future::join_all(
            self.slots
                .iter()
                .map(|slot| dispatch(slot, &query, timeout)),
        )
        .await;

        let mut response = self.assemble(&query, outcomes);

        if response.results.is_empty() {
            tracing::debug!("no results, response not cached");
        } else {
            self.cache
                .insert(key, response.clone(), self.config.cache_ttl())
                .await;
        }

        truncate(&mut response, opts.max_results);
        Ok(response)
    }

    /// Build the response from per-provider outcomes in priority order.
    fn assemble(&self, query: &SearchQuery, outcomes: Vec<ProviderOutcome>) -> SearchResponse {
        let mut provider_status = BTreeMap::new();
        let mut batches = Vec::with_capacity(outcomes.len());
        let mut answer = None;

        for (slot, outcome) in self.slots.iter().zip(outcomes) {
            let id = slot.provider.id();
            provider_status.insert(id.to_string(), ProviderStatus::from(&outcome));

            if let ProviderOutcome::Ok {
                results,
                answer: provider_answer,
                ..
            } = outcome
            {
                if answer.is_none() {
                    answer = provider_answer.filter(|a| !a.trim().is_empty());
                }
                batches.push(ProviderBatch::new(id, results));
            }
        }

        let results = merge_and_rank(&batches);
        let ok = batches.len();
        tracing::info!(
            kind = %query.kind(),
            count = results.len(),
            providers_ok = ok,
            providers_failed = self.slots.len() - ok,
            "search complete"
        );

        SearchResponse {
            query: query.text().to_string(),
            kind: query.kind(),
            total_found: results.len(),
            results,
            answer,
            provider_status,
            timestamp: Utc::now(),
            cached: false,
        }
    }
}

impl std::fmt::Debug for SearchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchOrchestrator")
            .field("providers", &self.provider_ids())
            .field("cache", &self.cache)
            .field("config", &self.config)
            .finish()
    }
}

/// Call one provider through its breaker and settle the permit.
async fn dispatch(slot: &ProviderSlot, query: &SearchQuery, timeout: Duration) -> ProviderOutcome {
    let provider = slot.provider.as_ref();
    let id = provider.id();

    // Unconfigured providers never touch the breaker.
    let permit = if provider.is_configured() {
        match slot.breaker.try_acquire() {
            Ok(permit) => Some(permit),
            Err(err) => {
                tracing::debug!(provider = id, error = %err, "call short-circuited");
                return err.into();
            }
        }
    } else {
        None
    };

    let outcome = AssertUnwindSafe(provider.call(query, timeout))
        .catch_unwind()
        .await
        .unwrap_or_else(|_| {
            ProviderOutcome::failed(FailureKind::TransportError, format!("{id} panicked"))
        });

    match &outcome {
        ProviderOutcome::Ok { results, elapsed, .. } => {
            tracing::debug!(provider = id, count = results.len(), ?elapsed, "provider answered");
        }
        ProviderOutcome::Failed {
            reason,
            classification: FailureKind::NotConfigured,
        } => {
            tracing::debug!(provider = id, error = %reason, "provider skipped");
        }
        ProviderOutcome::Failed {
            reason,
            classification,
        } => {
            tracing::warn!(provider = id, error = %reason, %classification, "provider failed");
        }
    }

    if let Some(permit) = permit {
        match outcome.classification() {
            None => permit.success(),
            Some(FailureKind::NotConfigured) => permit.release(),
            Some(_) => permit.failure(),
        }
    }

    outcome
}

/// Cut the merged list to `max_results`. Ranks stay contiguous.
fn truncate(response: &mut SearchResponse, max_results: Option<usize>) {
    if let Some(max) = max_results {
        response.results.truncate(max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ProviderHits, ProviderResult, ProviderState};
    use async_trait::async_trait;

    struct FixedProvider {
        id: &'static str,
        configured: bool,
        hits: ProviderHits,
    }

    #[async_trait]
    impl ProviderClient for FixedProvider {
        fn id(&self) -> &str {
            self.id
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn fetch(&self, _query: &SearchQuery) -> Result<ProviderHits, SearchError> {
            Ok(self.hits.clone())
        }
    }

    struct PanickingProvider;

    #[async_trait]
    impl ProviderClient for PanickingProvider {
        fn id(&self) -> &str {
            "panicky"
        }

        async fn fetch(&self, _query: &SearchQuery) -> Result<ProviderHits, SearchError> {
            panic!("adapter bug");
        }
    }

    fn fixed(id: &'static str, urls: &[&str], answer: Option<&str>) -> Arc<dyn ProviderClient> {
        Arc::new(FixedProvider {
            id,
            configured: true,
            hits: ProviderHits {
                results: urls
                    .iter()
                    .enumerate()
                    .map(|(i, url)| ProviderResult::new("T", *url, "S", 1.0 - 0.1 * i as f64, id))
                    .collect(),
                answer: answer.map(str::to_string),
            },
        })
    }

    #[test]
    fn rejects_empty_provider_list() {
        let err = SearchOrchestrator::new(EngineConfig::default(), vec![]).expect_err("empty");
        assert!(matches!(err, SearchError::Config(_)));
    }

    #[test]
    fn rejects_duplicate_provider_ids() {
        let err = SearchOrchestrator::new(
            EngineConfig::default(),
            vec![fixed("a", &[], None), fixed("a", &[], None)],
        )
        .expect_err("duplicate");
        assert!(err.to_string().contains("duplicate provider id"));
    }

    #[test]
    fn rejects_invalid_config() {
        let config = EngineConfig {
            failure_threshold: 0,
            ..Default::default()
        };
        assert!(SearchOrchestrator::new(config, vec![fixed("a", &[], None)]).is_err());
    }

    #[test]
    fn default_providers_in_priority_order() {
        let orchestrator =
            SearchOrchestrator::with_default_providers(EngineConfig::default(), None)
                .expect("build");
        assert_eq!(orchestrator.provider_ids(), vec!["tavily", "duckduckgo"]);
    }

    #[tokio::test]
    async fn answer_comes_from_first_provider_that_has_one() {
        let orchestrator = SearchOrchestrator::new(
            EngineConfig::default(),
            vec![
                fixed("a", &["https://a.com"], Some("  ")),
                fixed("b", &["https://b.com"], Some("from b")),
                fixed("c", &["https://c.com"], Some("from c")),
            ],
        )
        .expect("build");
        let response = orchestrator
            .search("q", SearchKind::General, 5, SearchOptions::default())
            .await
            .expect("search");
        assert_eq!(response.answer.as_deref(), Some("from b"));
    }

    #[tokio::test]
    async fn panicking_provider_is_contained() {
        let orchestrator = SearchOrchestrator::new(
            EngineConfig::default(),
            vec![Arc::new(PanickingProvider), fixed("ok", &["https://ok.com"], None)],
        )
        .expect("build");
        let response = orchestrator
            .search("q", SearchKind::General, 5, SearchOptions::default())
            .await
            .expect("search");
        assert_eq!(response.results.len(), 1);
        let status = &response.provider_status["panicky"];
        assert_eq!(status.classification, Some(FailureKind::TransportError));
        assert_eq!(orchestrator.breaker_report()[0].1.consecutive_failures, 1);
    }

    #[tokio::test]
    async fn unconfigured_provider_reported_disabled_and_breaker_untouched() {
        let unconfigured: Arc<dyn ProviderClient> = Arc::new(FixedProvider {
            id: "keyless",
            configured: false,
            hits: ProviderHits::default(),
        });
        let orchestrator = SearchOrchestrator::new(
            EngineConfig::default(),
            vec![unconfigured, fixed("ok", &["https://ok.com"], None)],
        )
        .expect("build");
        for _ in 0..10 {
            orchestrator.clear_cache();
            orchestrator
                .search("q", SearchKind::General, 5, SearchOptions::default())
                .await
                .expect("search");
        }
        let response = orchestrator
            .search("q", SearchKind::General, 5, SearchOptions::default())
            .await
            .expect("search");
        assert_eq!(response.provider_status["keyless"].state, ProviderState::Disabled);
        assert_eq!(orchestrator.breaker_report()[0].1.consecutive_failures, 0);
    }

    #[tokio::test]
    async fn max_results_truncates_but_keeps_total_found() {
        let orchestrator = SearchOrchestrator::new(
            EngineConfig::default(),
            vec![fixed("a", &["https://1.com", "https://2.com", "https://3.com"], None)],
        )
        .expect("build");
        let opts = SearchOptions {
            max_results: Some(2),
            ..Default::default()
        };
        let response = orchestrator
            .search("q", SearchKind::General, 5, opts.clone())
            .await
            .expect("search");
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.total_found, 3);

        let cached = orchestrator
            .search("q", SearchKind::General, 5, opts)
            .await
            .expect("search");
        assert!(cached.cached);
        assert_eq!(cached.results.len(), 2);
    }

    #[tokio::test]
    async fn zero_max_results_is_validation_error() {
        let orchestrator =
            SearchOrchestrator::new(EngineConfig::default(), vec![fixed("a", &[], None)])
                .expect("build");
        let opts = SearchOptions {
            max_results: Some(0),
            ..Default::default()
        };
        let err = orchestrator
            .search("q", SearchKind::General, 5, opts)
            .await
            .expect_err("invalid");
        assert!(matches!(err, SearchError::Validation(_)));
    }
}
