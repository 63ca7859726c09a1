//! Tavily search API: scored results plus a direct answer.
//!
//! Requires an API key. Without one the provider reports itself as not
//! configured and is never called.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{first_str, parse_timestamp};
use crate::config::EngineConfig;
use crate::error::SearchError;
use crate::http;
use crate::provider::ProviderClient;
use crate::types::{ProviderHits, ProviderResult, SearchKind, SearchQuery};

/// Public Tavily endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.tavily.com";

/// Tavily API client.
pub struct TavilyProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl TavilyProvider {
    /// Provider id used in statuses and source tags.
    pub const ID: &'static str = "tavily";

    /// Create a Tavily provider. A blank `api_key` counts as absent.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &EngineConfig, api_key: Option<String>) -> Result<Self, SearchError> {
        Ok(Self {
            client: http::client_for(http::ClientProfile::Api, config)?,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the provider at a different API host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

impl std::fmt::Debug for TavilyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TavilyProvider")
            .field("base_url", &self.base_url)
            .field("configured", &self.api_key.is_some())
            .finish()
    }
}

#[async_trait]
impl ProviderClient for TavilyProvider {
    fn id(&self) -> &str {
        Self::ID
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch(&self, query: &SearchQuery) -> Result<ProviderHits, SearchError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(SearchError::NotConfigured("TAVILY_API_KEY not set".into()));
        };

        tracing::trace!(query = query.text(), kind = %query.kind(), "Tavily search");

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .bearer_auth(api_key)
            .json(&request_body(query))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Http(format!("Tavily returned HTTP {status}")));
        }

        let body: Value = response.json().await?;
        let hits = parse_tavily_response(&body, query.results_per_provider())?;
        tracing::debug!(count = hits.results.len(), "Tavily results parsed");
        Ok(hits)
    }
}

/// JSON body for `POST /search`.
fn request_body(query: &SearchQuery) -> Value {
    let depth = if query.kind() == SearchKind::Academic {
        "advanced"
    } else {
        "basic"
    };
    let mut body = json!({
        "query": query.text(),
        "max_results": query.results_per_provider(),
        "search_depth": depth,
        "include_answer": true,
        "include_raw_content": false,
    });
    if query.kind() == SearchKind::News {
        body["topic"] = json!("news");
    }
    body
}

/// Turn a Tavily response body into normalised hits.
///
/// Missing fields become empty values; a missing `results` array is an empty
/// result list. Only a body that is not a JSON object is rejected.
pub(crate) fn parse_tavily_response(body: &Value, limit: usize) -> Result<ProviderHits, SearchError> {
    if !body.is_object() {
        return Err(SearchError::Parse("Tavily response is not a JSON object".into()));
    }

    let results = body
        .get("results")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .take(limit)
                .map(|item| {
                    let mut result = ProviderResult::new(
                        first_str(item, &["title"]),
                        first_str(item, &["url"]),
                        first_str(item, &["content"]),
                        item.get("score").and_then(Value::as_f64).unwrap_or(0.0),
                        TavilyProvider::ID,
                    );
                    result.published_at = parse_timestamp(&first_str(item, &["published_date"]));
                    result
                })
                .collect()
        })
        .unwrap_or_default();

    let answer = Some(first_str(body, &["answer"])).filter(|a| !a.is_empty());

    Ok(ProviderHits { results, answer })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(kind: SearchKind) -> SearchQuery {
        SearchQuery::new("climate policy", kind, 5).expect("valid")
    }

    #[test]
    fn request_body_for_general_query() {
        let body = request_body(&query(SearchKind::General));
        assert_eq!(body["query"], "climate policy");
        assert_eq!(body["max_results"], 5);
        assert_eq!(body["search_depth"], "basic");
        assert_eq!(body["include_answer"], true);
        assert_eq!(body["include_raw_content"], false);
        assert!(body.get("topic").is_none());
    }

    #[test]
    fn request_body_for_news_and_academic() {
        assert_eq!(request_body(&query(SearchKind::News))["topic"], "news");
        assert_eq!(
            request_body(&query(SearchKind::Academic))["search_depth"],
            "advanced"
        );
    }

    #[test]
    fn parses_results_and_answer() {
        let body = json!({
            "answer": "Policies vary by country.",
            "results": [
                {
                    "title": "Climate policy overview",
                    "url": "https://example.org/climate",
                    "content": "An overview.",
                    "score": 0.87,
                    "published_date": "2024-03-02"
                },
                { "url": "https://example.org/bare" }
            ]
        });
        let hits = parse_tavily_response(&body, 10).expect("parse");
        assert_eq!(hits.answer.as_deref(), Some("Policies vary by country."));
        assert_eq!(hits.results.len(), 2);

        let first = &hits.results[0];
        assert_eq!(first.title, "Climate policy overview");
        assert_eq!(first.snippet, "An overview.");
        assert!((first.score - 0.87).abs() < 1e-9);
        assert_eq!(first.source_provider, "tavily");
        assert!(first.published_at.is_some());

        let second = &hits.results[1];
        assert_eq!(second.title, "");
        assert_eq!(second.snippet, "");
        assert!((second.score - 0.0).abs() < f64::EPSILON);
        assert!(second.published_at.is_none());
    }

    #[test]
    fn empty_answer_is_none() {
        let hits = parse_tavily_response(&json!({ "answer": "", "results": [] }), 5).expect("parse");
        assert!(hits.answer.is_none());
        assert!(hits.results.is_empty());
    }

    #[test]
    fn missing_results_array_is_empty() {
        let hits = parse_tavily_response(&json!({ "query": "x" }), 5).expect("parse");
        assert!(hits.results.is_empty());
    }

    #[test]
    fn results_truncated_to_limit() {
        let items: Vec<Value> = (0..8)
            .map(|i| json!({ "url": format!("https://e.com/{i}"), "score": 0.5 }))
            .collect();
        let hits = parse_tavily_response(&json!({ "results": items }), 3).expect("parse");
        assert_eq!(hits.results.len(), 3);
    }

    #[test]
    fn non_object_body_is_parse_error() {
        let err = parse_tavily_response(&json!([1, 2]), 5).expect_err("should fail");
        assert!(matches!(err, SearchError::Parse(_)));
    }

    #[test]
    fn blank_key_means_not_configured() {
        let config = EngineConfig::default();
        let provider = TavilyProvider::new(&config, Some("  ".into())).expect("client");
        assert!(!provider.is_configured());
        let provider = TavilyProvider::new(&config, Some("tvly-123".into())).expect("client");
        assert!(provider.is_configured());
    }

    #[test]
    fn debug_output_hides_key() {
        let provider =
            TavilyProvider::new(&EngineConfig::default(), Some("tvly-secret".into())).expect("client");
        let debug = format!("{provider:?}");
        assert!(!debug.contains("tvly-secret"));
        assert!(debug.contains("configured: true"));
    }

    #[tokio::test]
    #[ignore] // live network, needs TAVILY_API_KEY; run with `cargo test -- --ignored`
    async fn live_tavily_search() {
        let key = std::env::var("TAVILY_API_KEY").expect("TAVILY_API_KEY must be set");
        let provider = TavilyProvider::new(&EngineConfig::default(), Some(key)).expect("client");
        let query = SearchQuery::new("rust programming", SearchKind::General, 5).expect("query");
        let hits = provider.fetch(&query).await.expect("live search should work");
        assert!(!hits.results.is_empty());
        for r in &hits.results {
            assert!(!r.url.is_empty());
            assert_eq!(r.source_provider, TavilyProvider::ID);
        }
    }
}
