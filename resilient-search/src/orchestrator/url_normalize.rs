//! URL normalisation for cross-provider deduplication.
//!
//! Two providers frequently return the same page under slightly different
//! URLs (a trailing slash, different capitalisation, a tracking parameter,
//! a fragment). [`dedup_key`] maps all of those to one string.

use url::Url;

/// Tracking query parameters that are stripped during normalisation.
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "ref",
    "si",
    "feature",
];

/// Build the dedup key for a result URL.
///
/// Canonicalises the URL with [`canonicalize`], then trims trailing slashes
/// and lowercases the whole string. Inputs that do not parse as URLs get
/// only the trim and lowercase.
///
/// # Examples
///
/// ```
/// use resilient_search::orchestrator::url_normalize::dedup_key;
///
/// assert_eq!(dedup_key("https://X.com/a/"), dedup_key("https://x.com/a"));
/// ```
pub fn dedup_key(raw: &str) -> String {
    let canonical = canonicalize(raw.trim()).unwrap_or_else(|| raw.trim().to_string());
    canonical.trim_end_matches('/').to_lowercase()
}

/// Canonicalise a URL, or `None` if it cannot be parsed.
///
/// 1. Scheme and host are lowercased by the parser.
/// 2. Default ports (`:80` for HTTP, `:443` for HTTPS) are removed.
/// 3. Known tracking parameters (UTM, fbclid, gclid, ...) are dropped.
/// 4. Remaining query parameters are sorted by key, then value.
/// 5. The fragment is removed.
pub fn canonicalize(raw: &str) -> Option<String> {
    let mut parsed = Url::parse(raw).ok()?;

    parsed.set_fragment(None);

    if matches!(
        (parsed.scheme(), parsed.port()),
        ("http", Some(80)) | ("https", Some(443))
    ) {
        let _ = parsed.set_port(None);
    }

    let mut params: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.to_lowercase().as_str()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    params.sort();

    if params.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(&params);
    }

    Some(parsed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_variants_share_a_key() {
        assert_eq!(dedup_key("https://x.com/a"), dedup_key("https://x.com/a/"));
    }

    #[test]
    fn key_is_fully_lowercased() {
        assert_eq!(dedup_key("HTTPS://Example.COM/Path"), "https://example.com/path");
    }

    #[test]
    fn bare_host_and_root_slash_share_a_key() {
        assert_eq!(dedup_key("https://a.com"), dedup_key("https://a.com/"));
    }

    #[test]
    fn removes_default_ports() {
        assert_eq!(dedup_key("http://example.com:80/path"), "http://example.com/path");
        assert_eq!(dedup_key("https://example.com:443/path"), "https://example.com/path");
    }

    #[test]
    fn preserves_non_default_port() {
        assert_eq!(dedup_key("https://example.com:8080/path"), "https://example.com:8080/path");
    }

    #[test]
    fn sorts_query_params() {
        assert_eq!(
            dedup_key("https://example.com/search?z=1&a=2&m=3"),
            "https://example.com/search?a=2&m=3&z=1"
        );
    }

    #[test]
    fn strips_tracking_params_and_fragment() {
        assert_eq!(
            dedup_key("https://example.com/page?q=rust&utm_source=google&fbclid=abc#top"),
            "https://example.com/page?q=rust"
        );
    }

    #[test]
    fn tracking_param_keys_matched_case_insensitively() {
        assert_eq!(
            dedup_key("https://example.com/page?UTM_Source=x"),
            "https://example.com/page"
        );
    }

    #[test]
    fn unparseable_input_is_trimmed_and_lowercased() {
        assert_eq!(dedup_key("a.com/"), "a.com");
        assert_eq!(dedup_key("Not A URL"), "not a url");
    }

    #[test]
    fn empty_string_stays_empty() {
        assert_eq!(dedup_key(""), "");
    }

    #[test]
    fn canonicalize_rejects_garbage() {
        assert!(canonicalize("not a url at all").is_none());
    }
}
