//! Concrete provider adapters.
//!
//! Each module provides a struct implementing [`crate::provider::ProviderClient`]
//! that talks to one external search service.

pub mod duckduckgo;
pub mod tavily;

pub use duckduckgo::DuckDuckGoProvider;
pub use tavily::TavilyProvider;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

/// First non-blank string found under any of `keys`, or an empty string.
pub(crate) fn first_str(item: &Value, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| item.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_default()
}

/// Like [`first_str`], but `None` when nothing was found.
pub(crate) fn optional_str(item: &Value, keys: &[&str]) -> Option<String> {
    Some(first_str(item, keys)).filter(|s| !s.is_empty())
}

/// Parse the date formats providers actually send.
///
/// Accepts RFC 3339, RFC 2822, and a bare `YYYY-MM-DD` (midnight UTC).
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_rfc2822(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    #[test]
    fn first_str_skips_missing_and_blank_keys() {
        let item = json!({ "excerpt": "  ", "body": "text", "n": 3 });
        assert_eq!(first_str(&item, &["description", "excerpt", "body"]), "text");
        assert_eq!(first_str(&item, &["n"]), "");
        assert_eq!(optional_str(&item, &["missing"]), None);
    }

    #[test]
    fn parses_rfc3339() {
        let ts = parse_timestamp("2024-05-01T10:30:00+02:00").expect("rfc3339");
        assert_eq!(ts.hour(), 8);
    }

    #[test]
    fn parses_rfc2822() {
        let ts = parse_timestamp("Wed, 01 May 2024 10:30:00 GMT").expect("rfc2822");
        assert_eq!(ts.day(), 1);
    }

    #[test]
    fn parses_bare_date() {
        let ts = parse_timestamp("2024-05-01").expect("date");
        assert_eq!((ts.year(), ts.month(), ts.day()), (2024, 5, 1));
    }

    #[test]
    fn garbage_dates_are_none() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
