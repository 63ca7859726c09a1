//! # resilient-search
//!
//! Fault-tolerant web search aggregation over several independent providers.
//!
//! A query fans out to every provider concurrently. Each provider sits
//! behind its own circuit breaker and a bounded timeout, so one slow or dead
//! backend never stalls or breaks the search. Successful result lists are
//! merged by normalised URL, interleaved across providers, and ranked. The
//! merged response is cached for a short TTL.
//!
//! ## Design
//!
//! - Tavily (API key) and DuckDuckGo (keyless HTML/JSON scraping) adapters
//! - One circuit breaker per provider, owned by the orchestrator
//! - In-memory TTL cache of merged responses
//! - Failure is data: every provider gets a status entry, and only invalid
//!   input makes [`SearchOrchestrator::search`] return an error
//!
//! ## Security
//!
//! - API keys never appear in error messages or `Debug` output
//! - Search queries are logged only at trace level
//!
//! # Examples
//!
//! ```no_run
//! # async fn example() -> resilient_search::Result<()> {
//! use resilient_search::{EngineConfig, SearchKind, SearchOptions, SearchOrchestrator};
//!
//! let orchestrator = SearchOrchestrator::with_default_providers(
//!     EngineConfig::default(),
//!     std::env::var("TAVILY_API_KEY").ok(),
//! )?;
//! let response = orchestrator
//!     .search("climate policy", SearchKind::News, 5, SearchOptions::default())
//!     .await?;
//! for result in &response.results {
//!     println!("{}. {} ({})", result.rank, result.title, result.url);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod circuit_breaker;
pub mod config;
pub mod error;
pub mod http;
pub mod orchestrator;
pub mod provider;
pub mod providers;
pub mod types;

pub use circuit_breaker::{BreakerSnapshot, CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use config::EngineConfig;
pub use error::{Result, SearchError};
pub use orchestrator::SearchOrchestrator;
pub use provider::ProviderClient;
pub use providers::{DuckDuckGoProvider, TavilyProvider};
pub use types::{
    FailureKind, ProviderHits, ProviderOutcome, ProviderResult, ProviderState, ProviderStatus,
    SearchKind, SearchOptions, SearchQuery, SearchResponse, MAX_RESULTS_PER_PROVIDER,
};
