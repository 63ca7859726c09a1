//! Per-provider circuit breaker.
//!
//! Tracks consecutive failures for one search provider and temporarily
//! stops calling it once it fails repeatedly. After a cooldown period the
//! breaker enters a half-open state where a single trial call determines
//! whether to restore or re-trip the circuit.
//!
//! # State Machine
//!
//! ```text
//! ┌────────┐  N failures   ┌────────┐  cooldown   ┌──────────┐
//! │ Closed ├──────────────►│  Open  ├────────────►│ HalfOpen │
//! └───▲────┘               └───▲────┘             └────┬─────┘
//!     │                        │   trial failure       │
//!     │  trial success         └───────────────────────┤
//!     └────────────────────────────────────────────────┘
//! ```
//!
//! Callers obtain a [`CallPermit`] from [`CircuitBreaker::try_acquire`] and
//! settle it with the call's outcome. A trial permit that is dropped
//! unsettled (the surrounding future was cancelled) counts as a failure, so
//! the breaker cannot get stuck half-open.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::error::SearchError;

/// Circuit breaker state for a single provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Provider is healthy; all requests are allowed through.
    Closed,
    /// Provider has failed too many times; requests are blocked until cooldown expires.
    Open,
    /// Cooldown has elapsed; one trial request is allowed to test recovery.
    HalfOpen,
}

impl CircuitState {
    /// Returns the lowercase display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        }
    }
}

/// Configuration for circuit breaker behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Number of consecutive failures before tripping the circuit to Open.
    pub failure_threshold: u32,
    /// Time to wait in Open state before transitioning to HalfOpen.
    pub cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown: Duration::from_secs(60),
        }
    }
}

/// Point-in-time view of a breaker, for health reporting.
#[derive(Debug, Clone)]
pub struct BreakerSnapshot {
    /// Current circuit state.
    pub state: CircuitState,
    /// Number of consecutive failures since the last success.
    pub consecutive_failures: u32,
    /// When the circuit last transitioned to Open.
    pub opened_at: Option<Instant>,
    /// When the last failure occurred (if any).
    pub last_failure_at: Option<Instant>,
    /// When the last success occurred (if any).
    pub last_success_at: Option<Instant>,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    trial_in_flight: bool,
    last_failure_at: Option<Instant>,
    last_success_at: Option<Instant>,
}

impl Default for BreakerState {
    fn default() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            opened_at: None,
            trial_in_flight: false,
            last_failure_at: None,
            last_success_at: None,
        }
    }
}

/// Failure tracker and call gate for one provider.
///
/// All transitions happen under a single mutex, so concurrent searches
/// racing on the same provider observe a consistent state.
#[derive(Debug)]
pub struct CircuitBreaker {
    provider: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerState>,
}

impl CircuitBreaker {
    /// Create a closed breaker for `provider`.
    pub fn new(provider: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            provider: provider.into(),
            config,
            inner: Mutex::new(BreakerState::default()),
        }
    }

    /// The provider this breaker guards.
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Ask whether a call may be attempted now.
    ///
    /// - [`CircuitState::Closed`]: always granted.
    /// - [`CircuitState::Open`]: granted as the trial only if the cooldown has
    ///   elapsed since the circuit opened (transitions to
    ///   [`CircuitState::HalfOpen`]).
    /// - [`CircuitState::HalfOpen`]: granted only if no trial is in flight.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::CircuitOpen`] when the call must be skipped.
    pub fn try_acquire(&self) -> Result<CallPermit<'_>, SearchError> {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => Ok(CallPermit::new(self, false)),
            CircuitState::Open => {
                let cooled_down = inner
                    .opened_at
                    .is_none_or(|t| t.elapsed() >= self.config.cooldown);
                if cooled_down {
                    inner.state = CircuitState::HalfOpen;
                    inner.trial_in_flight = true;
                    tracing::info!(provider = %self.provider, "circuit half-open, allowing trial call");
                    Ok(CallPermit::new(self, true))
                } else {
                    Err(SearchError::CircuitOpen(format!(
                        "{} circuit open after {} consecutive failures",
                        self.provider, inner.consecutive_failures
                    )))
                }
            }
            CircuitState::HalfOpen => {
                if inner.trial_in_flight {
                    Err(SearchError::CircuitOpen(format!(
                        "{} trial call already in flight",
                        self.provider
                    )))
                } else {
                    inner.trial_in_flight = true;
                    Ok(CallPermit::new(self, true))
                }
            }
        }
    }

    /// Get the current circuit state.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Get a copy of the full breaker state.
    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.lock();
        BreakerSnapshot {
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            opened_at: inner.opened_at,
            last_failure_at: inner.last_failure_at,
            last_success_at: inner.last_success_at,
        }
    }

    /// Reset to healthy (Closed with zero failures).
    pub fn reset(&self) {
        *self.lock() = BreakerState::default();
    }

    fn record_success(&self, trial: bool) {
        let mut inner = self.lock();
        if inner.state != CircuitState::Closed {
            tracing::info!(provider = %self.provider, trial, "circuit closed after successful call");
        }
        inner.state = CircuitState::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
        inner.trial_in_flight = false;
        inner.last_success_at = Some(Instant::now());
    }

    fn record_failure(&self, trial: bool) {
        let mut inner = self.lock();
        let now = Instant::now();
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
        inner.last_failure_at = Some(now);

        match inner.state {
            CircuitState::HalfOpen if trial => {
                inner.state = CircuitState::Open;
                inner.opened_at = Some(now);
                inner.trial_in_flight = false;
                tracing::warn!(provider = %self.provider, "trial call failed, circuit re-opened");
            }
            CircuitState::Closed
                if inner.consecutive_failures >= self.config.failure_threshold =>
            {
                inner.state = CircuitState::Open;
                inner.opened_at = Some(now);
                tracing::warn!(
                    provider = %self.provider,
                    failures = inner.consecutive_failures,
                    "circuit opened"
                );
            }
            _ => {}
        }
    }

    fn release_trial(&self) {
        let mut inner = self.lock();
        inner.trial_in_flight = false;
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        // The state is plain data updated in single assignments, so a
        // poisoned lock still holds a usable value.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Permission to make one provider call, obtained from
/// [`CircuitBreaker::try_acquire`].
#[derive(Debug)]
#[must_use = "a permit should be settled with the call outcome"]
pub struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    trial: bool,
    settled: bool,
}

impl<'a> CallPermit<'a> {
    fn new(breaker: &'a CircuitBreaker, trial: bool) -> Self {
        Self {
            breaker,
            trial,
            settled: false,
        }
    }

    /// Whether this is the single half-open trial call.
    pub fn is_trial(&self) -> bool {
        self.trial
    }

    /// Record that the call succeeded.
    pub fn success(mut self) {
        self.settled = true;
        self.breaker.record_success(self.trial);
    }

    /// Record that the call failed.
    pub fn failure(mut self) {
        self.settled = true;
        self.breaker.record_failure(self.trial);
    }

    /// Give the permit back without counting the call either way.
    pub fn release(mut self) {
        self.settled = true;
        if self.trial {
            self.breaker.release_trial();
        }
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if !self.settled && self.trial {
            self.breaker.record_failure(true);
        }
    }
}
