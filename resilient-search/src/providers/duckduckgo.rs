//! DuckDuckGo: keyless web search plus news, image, and video verticals.
//!
//! General and academic queries use the HTML-only endpoint at
//! `https://html.duckduckgo.com/html/`, which needs no JavaScript and is
//! tolerant of automated requests. The news, image, and video verticals are
//! served as JSON from `duckduckgo.com/{news,i,v}.js` and need a per-query
//! `vqd` token scraped from the regular search page first.

use async_trait::async_trait;
use chrono::DateTime;
use scraper::{Html, Selector};
use serde_json::Value;
use url::Url;

use super::{first_str, optional_str, parse_timestamp};
use crate::config::EngineConfig;
use crate::error::SearchError;
use crate::http;
use crate::orchestrator::scoring::score_by_position;
use crate::provider::ProviderClient;
use crate::types::{ProviderHits, ProviderResult, SearchKind, SearchQuery};

/// HTML endpoint host.
pub const DEFAULT_HTML_BASE: &str = "https://html.duckduckgo.com";

/// Host serving the token page and the JSON verticals.
pub const DEFAULT_BASE: &str = "https://duckduckgo.com";

/// DuckDuckGo scraper.
#[derive(Debug)]
pub struct DuckDuckGoProvider {
    client: reqwest::Client,
    html_base: String,
    base: String,
    safe_search: bool,
}

impl DuckDuckGoProvider {
    /// Provider id used in statuses and source tags.
    pub const ID: &'static str = "duckduckgo";

    /// Create a DuckDuckGo provider using the public endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &EngineConfig) -> Result<Self, SearchError> {
        Ok(Self {
            client: http::client_for(http::ClientProfile::Browser, config)?,
            html_base: DEFAULT_HTML_BASE.to_string(),
            base: DEFAULT_BASE.to_string(),
            safe_search: config.safe_search,
        })
    }

    /// Override the HTML endpoint host.
    pub fn with_html_base(mut self, html_base: impl Into<String>) -> Self {
        self.html_base = html_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the token/JSON host.
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = base.into().trim_end_matches('/').to_string();
        self
    }

    async fn search_html(&self, query: &SearchQuery) -> Result<Vec<ProviderResult>, SearchError> {
        let mut params = vec![("q", query.text())];
        if self.safe_search {
            params.push(("kp", "1"));
        }

        let response = self
            .client
            .post(format!("{}/html/", self.html_base))
            .form(&params)
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Http(format!("DuckDuckGo returned HTTP {status}")));
        }

        let html = response.text().await?;
        tracing::trace!(bytes = html.len(), "DuckDuckGo HTML response received");

        parse_duckduckgo_html(&html, query.results_per_provider())
    }

    async fn search_vertical(
        &self,
        query: &SearchQuery,
        endpoint: &str,
    ) -> Result<Vec<ProviderResult>, SearchError> {
        let vqd = self.fetch_vqd(query.text()).await?;
        let safe = if self.safe_search { "1" } else { "-1" };

        let response = self
            .client
            .get(format!("{}/{endpoint}", self.base))
            .query(&[
                ("l", "us-en"),
                ("o", "json"),
                ("q", query.text()),
                ("vqd", vqd.as_str()),
                ("p", safe),
            ])
            .header("Referer", format!("{}/", self.base))
            .header("Accept", "application/json")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Http(format!(
                "DuckDuckGo {endpoint} returned HTTP {status}"
            )));
        }

        let body: Value = response.json().await?;
        parse_duckduckgo_json(&body, query.results_per_provider())
    }

    /// Fetch the per-query token the JSON verticals require.
    async fn fetch_vqd(&self, text: &str) -> Result<String, SearchError> {
        let response = self
            .client
            .get(format!("{}/", self.base))
            .query(&[("q", text)])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Http(format!(
                "DuckDuckGo token page returned HTTP {status}"
            )));
        }
        let page = response.text().await?;
        extract_vqd(&page).ok_or_else(|| SearchError::Parse("DuckDuckGo vqd token not found".into()))
    }
}

#[async_trait]
impl ProviderClient for DuckDuckGoProvider {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn fetch(&self, query: &SearchQuery) -> Result<ProviderHits, SearchError> {
        tracing::trace!(query = query.text(), kind = %query.kind(), "DuckDuckGo search");

        let results = match query.kind() {
            SearchKind::General | SearchKind::Academic => self.search_html(query).await?,
            SearchKind::News => self.search_vertical(query, "news.js").await?,
            SearchKind::Images => self.search_vertical(query, "i.js").await?,
            SearchKind::Videos => self.search_vertical(query, "v.js").await?,
        };

        tracing::debug!(count = results.len(), "DuckDuckGo results parsed");
        Ok(ProviderHits {
            results,
            answer: None,
        })
    }
}

/// Extract the actual URL from DuckDuckGo's redirect wrapper.
///
/// DDG wraps URLs like: `//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com&rut=...`
/// We parse out the `uddg` query parameter and URL-decode it.
fn extract_url(href: &str) -> Option<String> {
    let full_href = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };

    let parsed = Url::parse(&full_href).ok()?;

    if parsed.host_str() == Some("duckduckgo.com") && parsed.path().starts_with("/l/") {
        parsed
            .query_pairs()
            .find(|(key, _)| key == "uddg")
            .map(|(_, value)| value.into_owned())
    } else {
        Some(full_href)
    }
}

/// Find the `vqd` token in the search page.
///
/// The page embeds it as `vqd="4-123..."`, `vqd='4-123...'`, or unquoted in
/// a URL (`vqd=4-123...&`).
fn extract_vqd(page: &str) -> Option<String> {
    const QUOTES: &[char] = &['"', '\''];
    const UNQUOTED_END: &[char] = &['&', '"', '\'', ' ', ';', ',', ')', '\n'];

    page.match_indices("vqd=").find_map(|(start, marker)| {
        let rest = &page[start + marker.len()..];
        let (rest, terminators) = match rest.chars().next() {
            Some(quote @ ('"' | '\'')) => (&rest[quote.len_utf8()..], QUOTES),
            _ => (rest, UNQUOTED_END),
        };
        let end = rest.find(terminators).unwrap_or(rest.len());
        let token = &rest[..end];
        (!token.is_empty()).then(|| token.to_string())
    })
}

/// Parse DuckDuckGo HTML response into search results with position scores.
///
/// Extracted as a separate function for testability with mock HTML.
pub(crate) fn parse_duckduckgo_html(
    html: &str,
    max_results: usize,
) -> Result<Vec<ProviderResult>, SearchError> {
    let document = Html::parse_document(html);

    let result_sel = Selector::parse(
        ".result.results_links.results_links_deep:not(.result--ad), .web-result:not(.result--ad)",
    )
    .map_err(|e| SearchError::Parse(format!("invalid result selector: {e:?}")))?;
    let title_sel = Selector::parse(".result__a")
        .map_err(|e| SearchError::Parse(format!("invalid title selector: {e:?}")))?;
    let snippet_sel = Selector::parse(".result__snippet")
        .map_err(|e| SearchError::Parse(format!("invalid snippet selector: {e:?}")))?;

    let mut results = Vec::new();

    for element in document.select(&result_sel) {
        let Some(title_el) = element.select(&title_sel).next() else {
            continue;
        };

        let title = title_el.text().collect::<String>().trim().to_string();
        if title.is_empty() {
            continue;
        }

        let Some(url) = title_el.value().attr("href").and_then(extract_url) else {
            continue;
        };

        let snippet = element
            .select(&snippet_sel)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        results.push(ProviderResult::new(
            title,
            url,
            snippet,
            0.0,
            DuckDuckGoProvider::ID,
        ));

        if results.len() >= max_results {
            break;
        }
    }

    Ok(score_by_position(results))
}

/// Parse a news/images/videos JSON body into results with position scores.
///
/// Items without any URL are skipped; every other missing field becomes an
/// empty value.
pub(crate) fn parse_duckduckgo_json(
    body: &Value,
    max_results: usize,
) -> Result<Vec<ProviderResult>, SearchError> {
    if !body.is_object() {
        return Err(SearchError::Parse("DuckDuckGo response is not a JSON object".into()));
    }

    let results = body
        .get("results")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(parse_vertical_item)
                .take(max_results)
                .collect()
        })
        .unwrap_or_default();

    Ok(score_by_position(results))
}

fn parse_vertical_item(item: &Value) -> Option<ProviderResult> {
    let url = optional_str(item, &["url", "content"])?;

    let mut result = ProviderResult::new(
        first_str(item, &["title"]),
        url,
        first_str(item, &["excerpt", "description", "body"]),
        0.0,
        DuckDuckGoProvider::ID,
    );

    result.published_at = item
        .get("date")
        .and_then(Value::as_i64)
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .or_else(|| parse_timestamp(&first_str(item, &["published", "date"])));
    result.image_url = optional_str(item, &["image"]);
    result.thumbnail_url = optional_str(item, &["thumbnail"]).or_else(|| {
        item.get("images")
            .and_then(|images| optional_str(images, &["medium", "small", "large"]))
    });

    Some(result)
}
