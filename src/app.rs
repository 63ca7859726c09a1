//! Wiring from [`AppConfig`] to a ready [`SearchOrchestrator`].

use std::sync::Arc;

use resilient_search::{DuckDuckGoProvider, ProviderClient, SearchOrchestrator, TavilyProvider};

use crate::config::{AppConfig, ProviderKind};
use crate::error::Result;

/// Build the orchestrator with providers in the configured order.
///
/// # Errors
///
/// Returns an error if an HTTP client cannot be built or the engine
/// configuration is invalid.
pub fn build_orchestrator(config: &AppConfig) -> Result<SearchOrchestrator> {
    let engine = config.search.clone();
    let mut providers: Vec<Arc<dyn ProviderClient>> = Vec::with_capacity(config.providers.order.len());

    for kind in &config.providers.order {
        match kind {
            ProviderKind::Tavily => {
                let settings = &config.providers.tavily;
                let mut provider = TavilyProvider::new(&engine, settings.api_key.clone())?;
                if let Some(base_url) = &settings.base_url {
                    provider = provider.with_base_url(base_url.as_str());
                }
                if !provider.is_configured() {
                    tracing::info!(provider = TavilyProvider::ID, "no API key, provider disabled");
                }
                providers.push(Arc::new(provider));
            }
            ProviderKind::DuckDuckGo => {
                let settings = &config.providers.duckduckgo;
                let mut provider = DuckDuckGoProvider::new(&engine)?;
                if let Some(html_base) = &settings.html_base {
                    provider = provider.with_html_base(html_base.as_str());
                }
                if let Some(base) = &settings.base {
                    provider = provider.with_base(base.as_str());
                }
                providers.push(Arc::new(provider));
            }
        }
    }

    Ok(SearchOrchestrator::new(engine, providers)?)
}
