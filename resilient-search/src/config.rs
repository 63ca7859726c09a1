//! Engine configuration with sensible defaults.
//!
//! [`EngineConfig`] controls provider timeouts, circuit breaker thresholds,
//! caching, and request behaviour. It deserialises from a TOML/JSON table
//! with every field optional.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::circuit_breaker::CircuitBreakerConfig;
use crate::error::SearchError;

/// Configuration for a [`SearchOrchestrator`](crate::SearchOrchestrator).
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides for custom behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Per-provider call timeout in seconds.
    pub provider_timeout_secs: u64,
    /// Consecutive failures before a provider's circuit opens.
    pub failure_threshold: u32,
    /// Seconds an open circuit waits before allowing a trial call.
    pub cooldown_secs: u64,
    /// How long merged responses are cached, in seconds. 0 disables caching.
    pub cache_ttl_secs: u64,
    /// Maximum number of cached responses.
    pub cache_max_entries: u64,
    /// Whether to request safe search filtering from providers that support it.
    pub safe_search: bool,
    /// Custom User-Agent string. If `None`, scraping providers rotate
    /// through a built-in list of browser User-Agents.
    pub user_agent: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            provider_timeout_secs: 15,
            failure_threshold: 5,
            cooldown_secs: 60,
            cache_ttl_secs: 300,
            cache_max_entries: 256,
            safe_search: true,
            user_agent: None,
        }
    }
}

impl EngineConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `provider_timeout_secs` must be greater than 0
    /// - `failure_threshold` must be greater than 0
    /// - `cache_max_entries` must be greater than 0
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.provider_timeout_secs == 0 {
            return Err(SearchError::Config(
                "provider_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.failure_threshold == 0 {
            return Err(SearchError::Config(
                "failure_threshold must be greater than 0".into(),
            ));
        }
        if self.cache_max_entries == 0 {
            return Err(SearchError::Config(
                "cache_max_entries must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Per-provider timeout as a [`Duration`].
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    /// Cache TTL as a [`Duration`].
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Breaker settings derived from this configuration.
    pub fn breaker(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            cooldown: Duration::from_secs(self.cooldown_secs),
        }
    }
}
