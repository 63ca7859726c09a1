//! Core types for queries, per-provider outcomes, and merged responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::SearchError;

/// Upper bound on `results_per_provider` accepted by [`SearchQuery::new`].
pub const MAX_RESULTS_PER_PROVIDER: usize = 50;

/// Which vertical a search targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    /// Ordinary web results.
    #[default]
    General,
    /// Recent news articles.
    News,
    /// Image results.
    Images,
    /// Video results.
    Videos,
    /// Deeper, citation-oriented web results.
    Academic,
}

impl SearchKind {
    /// Returns the lowercase wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::News => "news",
            Self::Images => "images",
            Self::Videos => "videos",
            Self::Academic => "academic",
        }
    }

    /// Returns all available kinds.
    pub fn all() -> &'static [SearchKind] {
        &[
            Self::General,
            Self::News,
            Self::Images,
            Self::Videos,
            Self::Academic,
        ]
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchKind {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| SearchError::Validation(format!("unknown search kind: {s}")))
    }
}

/// An immutable, validated search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    text: String,
    kind: SearchKind,
    results_per_provider: usize,
}

impl SearchQuery {
    /// Build a query, rejecting empty text and out-of-range result counts.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Validation`] if `text` is blank or
    /// `results_per_provider` is outside `1..=MAX_RESULTS_PER_PROVIDER`.
    pub fn new(
        text: impl Into<String>,
        kind: SearchKind,
        results_per_provider: usize,
    ) -> Result<Self, SearchError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(SearchError::Validation("query text must not be empty".into()));
        }
        if !(1..=MAX_RESULTS_PER_PROVIDER).contains(&results_per_provider) {
            return Err(SearchError::Validation(format!(
                "results_per_provider must be between 1 and {MAX_RESULTS_PER_PROVIDER}, got {results_per_provider}"
            )));
        }
        Ok(Self {
            text,
            kind,
            results_per_provider,
        })
    }

    /// The query text as supplied by the caller.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The targeted vertical.
    pub fn kind(&self) -> SearchKind {
        self.kind
    }

    /// How many results each provider is asked for.
    pub fn results_per_provider(&self) -> usize {
        self.results_per_provider
    }
}

/// A single normalised hit from one provider (or several, after merging).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResult {
    /// The title of the result page.
    pub title: String,
    /// The URL of the result; its normalised form is the dedup key.
    pub url: String,
    /// A text snippet summarising the page content.
    pub snippet: String,
    /// Provider-local relevance score (higher is better). Not calibrated
    /// across providers.
    pub score: f64,
    /// Provider id, or `a+b` when several providers returned the same URL.
    pub source_provider: String,
    /// Publication time, when the provider reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    /// Full-size image URL for image and video results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Thumbnail URL for image and video results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// 1-based position in the merged list. Zero until ranked.
    pub rank: usize,
}

impl ProviderResult {
    /// Create an unranked result with no optional metadata.
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        snippet: impl Into<String>,
        score: f64,
        source_provider: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
            score,
            source_provider: source_provider.into(),
            published_at: None,
            image_url: None,
            thumbnail_url: None,
            rank: 0,
        }
    }
}

/// What a provider adapter hands back on success.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderHits {
    /// Normalised results in the provider's own order.
    pub results: Vec<ProviderResult>,
    /// Direct answer text, if the provider produces one.
    pub answer: Option<String>,
}

/// Why a provider produced no results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Credential absent; no I/O was attempted.
    NotConfigured,
    /// Network, HTTP status, or response parsing failure.
    TransportError,
    /// The call exceeded its deadline.
    Timeout,
    /// The circuit breaker short-circuited the call.
    CircuitOpen,
}

impl FailureKind {
    /// Returns the snake_case wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotConfigured => "not_configured",
            Self::TransportError => "transport_error",
            Self::Timeout => "timeout",
            Self::CircuitOpen => "circuit_open",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one provider call. Never an error; failure is data.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderOutcome {
    /// The provider answered (possibly with zero results).
    Ok {
        /// Normalised results in provider order.
        results: Vec<ProviderResult>,
        /// Direct answer text, if any.
        answer: Option<String>,
        /// Wall time spent in the call.
        elapsed: Duration,
    },
    /// The provider did not answer.
    Failed {
        /// Human-readable cause.
        reason: String,
        /// Machine-readable cause.
        classification: FailureKind,
    },
}

impl ProviderOutcome {
    /// Shorthand for a failed outcome.
    pub fn failed(classification: FailureKind, reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
            classification,
        }
    }

    /// Returns `true` for [`ProviderOutcome::Ok`].
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    /// The failure classification, if this outcome is a failure.
    pub fn classification(&self) -> Option<FailureKind> {
        match self {
            Self::Ok { .. } => None,
            Self::Failed { classification, .. } => Some(*classification),
        }
    }
}

impl From<SearchError> for ProviderOutcome {
    fn from(err: SearchError) -> Self {
        Self::failed(err.classification(), err.to_string())
    }
}

/// Coarse per-provider status shown to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderState {
    /// Answered; `count` may be zero.
    Ok,
    /// Transport or parse failure.
    Failed,
    /// Deadline exceeded.
    Timeout,
    /// Not configured (no credential).
    Disabled,
    /// Skipped because the breaker is open.
    CircuitOpen,
}

impl From<FailureKind> for ProviderState {
    fn from(kind: FailureKind) -> Self {
        match kind {
            FailureKind::NotConfigured => Self::Disabled,
            FailureKind::TransportError => Self::Failed,
            FailureKind::Timeout => Self::Timeout,
            FailureKind::CircuitOpen => Self::CircuitOpen,
        }
    }
}

/// Status entry for one provider in a [`SearchResponse`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderStatus {
    /// Coarse state.
    pub state: ProviderState,
    /// Number of results the provider returned before dedup.
    pub count: usize,
    /// Failure reason, when `state` is not `ok`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Failure classification, when `state` is not `ok`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<FailureKind>,
    /// Call duration in milliseconds for providers that answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
}

impl From<&ProviderOutcome> for ProviderStatus {
    fn from(outcome: &ProviderOutcome) -> Self {
        match outcome {
            ProviderOutcome::Ok {
                results, elapsed, ..
            } => Self {
                state: ProviderState::Ok,
                count: results.len(),
                error: None,
                classification: None,
                elapsed_ms: Some(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)),
            },
            ProviderOutcome::Failed {
                reason,
                classification,
            } => Self {
                state: ProviderState::from(*classification),
                count: 0,
                error: Some(reason.clone()),
                classification: Some(*classification),
                elapsed_ms: None,
            },
        }
    }
}

/// The merged, ranked answer to a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// The query text as supplied.
    pub query: String,
    /// The vertical searched.
    pub kind: SearchKind,
    /// Deduplicated results with `rank` populated `1..=n`.
    pub results: Vec<ProviderResult>,
    /// Number of merged results, before any `max_results` truncation.
    pub total_found: usize,
    /// Direct answer from the highest-priority provider that supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    /// Status keyed by provider id.
    pub provider_status: BTreeMap<String, ProviderStatus>,
    /// When the response was assembled (not when it was served).
    pub timestamp: DateTime<Utc>,
    /// Whether this response came from the result cache.
    pub cached: bool,
}

impl SearchResponse {
    /// Returns `true` when every provider failed for any reason.
    pub fn all_failed(&self) -> bool {
        !self.provider_status.is_empty()
            && self
                .provider_status
                .values()
                .all(|s| s.state != ProviderState::Ok)
    }
}

/// Per-call knobs for [`SearchOrchestrator::search`](crate::SearchOrchestrator::search).
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Overall bound on the call. Each provider's effective timeout is the
    /// smaller of this and the configured per-provider timeout.
    pub deadline: Option<Duration>,
    /// Truncate the merged list to at most this many results.
    pub max_results: Option<usize>,
    /// Skip the cache lookup (the fresh response is still stored).
    pub bypass_cache: bool,
}
