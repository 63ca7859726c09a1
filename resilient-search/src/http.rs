//! HTTP clients for provider adapters.
//!
//! Keyed APIs and scraped HTML endpoints want different clients: an API
//! gets an honest crate User-Agent and JSON accept headers, while the
//! DuckDuckGo endpoints get a browser identity and a cookie jar.

use std::time::Duration;

use rand::seq::SliceRandom;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};

use crate::config::EngineConfig;
use crate::error::SearchError;

const CONNECT_TIMEOUT_CAP: Duration = Duration::from_secs(5);

const MAX_REDIRECTS: usize = 10;

/// Desktop browser identities for HTML endpoints.
const BROWSER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (X11; Linux x86_64; rv:134.0) Gecko/20100101 Firefox/134.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36 Edg/132.0.0.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_7_2) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.2 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36",
];

/// What kind of endpoint a client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientProfile {
    /// Keyed JSON API (Tavily). No cookies.
    Api,
    /// Public HTML or JSON endpoints that expect a browser (DuckDuckGo).
    Browser,
}

impl ClientProfile {
    /// User-Agent for this profile. A configured agent always wins.
    pub fn user_agent(self, config: &EngineConfig) -> String {
        if let Some(custom) = config.user_agent.as_deref().filter(|ua| !ua.trim().is_empty()) {
            return custom.to_string();
        }
        match self {
            Self::Api => concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
            Self::Browser => browser_agent().to_string(),
        }
    }

    fn default_headers(self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        match self {
            Self::Api => {
                headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
            }
            Self::Browser => {
                headers.insert(
                    ACCEPT,
                    HeaderValue::from_static("text/html,application/xhtml+xml,application/json;q=0.9,*/*;q=0.8"),
                );
                headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.7"));
            }
        }
        headers
    }
}

/// Build a client for `profile`.
///
/// The request timeout is the engine's provider timeout; the orchestrator
/// may cut a call shorter with its own deadline.
///
/// # Errors
///
/// Returns [`SearchError::Http`] if the client cannot be constructed.
pub fn client_for(profile: ClientProfile, config: &EngineConfig) -> Result<reqwest::Client, SearchError> {
    let timeout = config.provider_timeout();
    reqwest::Client::builder()
        .cookie_store(profile == ClientProfile::Browser)
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT_CAP.min(timeout))
        .user_agent(profile.user_agent(config))
        .default_headers(profile.default_headers())
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()
        .map_err(|e| SearchError::Http(format!("cannot build {profile:?} client: {e}")))
}

/// A random desktop browser User-Agent.
pub fn browser_agent() -> &'static str {
    BROWSER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(BROWSER_AGENTS[0])
}
