//! Plain-text rendering of a search response for the terminal.

use std::fmt::Write;

use resilient_search::{ProviderState, SearchResponse};

/// Longest snippet shown before it is cut with an ellipsis.
const SNIPPET_CHARS: usize = 240;

/// Render `response` as numbered results followed by provider status.
///
/// Provider rows follow `provider_order` (the orchestrator's priority
/// order); any provider missing from it is listed afterwards.
pub fn render_text(response: &SearchResponse, provider_order: &[&str]) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{} result(s) for \"{}\" [{}]{}",
        response.total_found,
        response.query,
        response.kind,
        if response.cached { " (cached)" } else { "" }
    );

    if let Some(answer) = &response.answer {
        let _ = writeln!(out, "\nAnswer: {answer}");
    }

    if !response.results.is_empty() {
        out.push('\n');
    }
    for result in &response.results {
        let title = if result.title.is_empty() {
            result.url.as_str()
        } else {
            result.title.as_str()
        };
        let _ = writeln!(out, "{:>3}. {title}", result.rank);
        let _ = writeln!(out, "     {}", result.url);
        if let Some(published) = result.published_at {
            let _ = writeln!(out, "     published {}", published.format("%Y-%m-%d"));
        }
        if !result.snippet.is_empty() {
            let _ = writeln!(out, "     {}", shorten(&result.snippet, SNIPPET_CHARS));
        }
        let _ = writeln!(out, "     via {}", result.source_provider);
    }

    let _ = writeln!(out, "\nProviders:");
    let ordered = provider_order
        .iter()
        .filter_map(|id| response.provider_status.get_key_value(*id))
        .chain(
            response
                .provider_status
                .iter()
                .filter(|(id, _)| !provider_order.contains(&id.as_str())),
        );
    for (id, status) in ordered {
        let detail = match status.state {
            ProviderState::Ok => match status.elapsed_ms {
                Some(ms) => format!("{} result(s) in {ms} ms", status.count),
                None => format!("{} result(s)", status.count),
            },
            _ => status.error.clone().unwrap_or_default(),
        };
        let state = serde_json::to_value(status.state)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        let _ = writeln!(out, "  {id:<12} {state:<12} {detail}");
    }

    out
}

/// Collapse whitespace and cut to `max` characters.
fn shorten(text: &str, max: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max {
        collapsed
    } else {
        let cut: String = collapsed.chars().take(max).collect();
        format!("{}...", cut.trim_end())
    }
}
