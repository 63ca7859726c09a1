//! Application configuration loaded from TOML.
//!
//! ```toml
//! [search]
//! provider_timeout_secs = 15
//! cache_ttl_secs = 300
//!
//! [providers]
//! order = ["tavily", "duckduckgo"]
//!
//! [providers.tavily]
//! api_key = "tvly-..."
//! ```
//!
//! Every field is optional. `TAVILY_API_KEY` and
//! `SENTINEL_SEARCH_TIMEOUT_SECS` override the file.

use std::fmt;
use std::path::{Path, PathBuf};

use resilient_search::EngineConfig;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Environment variable holding the Tavily API key.
pub const TAVILY_API_KEY_ENV: &str = "TAVILY_API_KEY";

/// Environment variable overriding the per-provider timeout.
pub const TIMEOUT_ENV: &str = "SENTINEL_SEARCH_TIMEOUT_SECS";

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Engine tuning: timeouts, breaker, cache.
    pub search: EngineConfig,
    /// Which providers to use and how to reach them.
    pub providers: ProvidersConfig,
}

/// A provider the application knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Tavily search API.
    Tavily,
    /// DuckDuckGo scraping.
    DuckDuckGo,
}

/// Provider selection and per-provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Providers to query, highest merge priority first.
    pub order: Vec<ProviderKind>,
    /// Tavily settings.
    pub tavily: TavilyConfig,
    /// DuckDuckGo settings.
    pub duckduckgo: DuckDuckGoConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            order: vec![ProviderKind::Tavily, ProviderKind::DuckDuckGo],
            tavily: TavilyConfig::default(),
            duckduckgo: DuckDuckGoConfig::default(),
        }
    }
}

/// Tavily settings.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TavilyConfig {
    /// API key. Without one Tavily is reported as disabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// API host override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl fmt::Debug for TavilyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TavilyConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// DuckDuckGo endpoint overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuckDuckGoConfig {
    /// Host of the HTML endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_base: Option<String>,
    /// Host of the token page and JSON verticals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| AppError::Config(format!("{}: {e}", path.display())))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path:
    /// `$XDG_CONFIG_HOME/sentinel-search/config.toml`, falling back to
    /// `~/.config/sentinel-search/config.toml`.
    pub fn default_config_path() -> PathBuf {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .filter(|p| p.is_absolute())
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(std::env::temp_dir);
        base.join("sentinel-search").join("config.toml")
    }

    /// Load from `path`, or from the default path when `None`, then apply
    /// environment overrides and validate.
    ///
    /// A missing file at the default path yields the defaults; a missing
    /// file at an explicit path is an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable or malformed, an override
    /// is malformed, or the result fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Self::default_config_path();
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    tracing::debug!(path = %default_path.display(), "no config file, using defaults");
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `lookup` (normally the process environment).
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] if the timeout override is not a whole
    /// number of seconds.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(key) = lookup(TAVILY_API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.providers.tavily.api_key = Some(key);
        }
        if let Some(raw) = lookup(TIMEOUT_ENV) {
            self.search.provider_timeout_secs = raw.trim().parse().map_err(|_| {
                AppError::Config(format!("{TIMEOUT_ENV} must be a whole number of seconds, got {raw:?}"))
            })?;
        }
        Ok(())
    }

    /// Validates this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine settings are invalid, no provider is
    /// selected, or a provider is listed twice.
    pub fn validate(&self) -> Result<()> {
        self.search.validate()?;
        let order = &self.providers.order;
        if order.is_empty() {
            return Err(AppError::Config("providers.order must not be empty".into()));
        }
        for (i, kind) in order.iter().enumerate() {
            if order[..i].contains(kind) {
                return Err(AppError::Config(format!(
                    "provider {kind:?} listed twice in providers.order"
                )));
            }
        }
        Ok(())
    }
}
