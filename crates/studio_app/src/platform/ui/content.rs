//! Text rendering of one step's payload.

use serde_json::Value;
use studio_core::{StepId, StepStatus};

pub fn step_content(step: StepId, status: StepStatus, payload: Option<&Value>) -> Vec<String> {
    if status == StepStatus::Wait {
        return vec!["This step hasn't started yet".to_string()];
    }
    let Some(payload) = payload.filter(|value| !value.is_null()) else {
        return match status {
            StepStatus::Process => vec!["Processing...".to_string()],
            _ => vec!["No data available".to_string()],
        };
    };

    match step {
        StepId::Search => search_results(payload),
        StepId::Selection => selected_urls(payload),
        StepId::Summary | StepId::Newsletter => text_block(payload),
    }
}

/// Plain text of the newsletter payload, as written to disk.
pub fn newsletter_text(payload: &Value) -> String {
    match payload {
        Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

/// Text worth saving as a download, or `None` when the payload is empty, null or `false`.
pub fn downloadable_newsletter(payload: Option<&Value>) -> Option<String> {
    match payload? {
        Value::Null | Value::Bool(false) => None,
        Value::String(text) if text.trim().is_empty() => None,
        other => Some(newsletter_text(other)),
    }
}

fn search_results(payload: &Value) -> Vec<String> {
    let results = payload
        .get("organic")
        .or_else(|| payload.get("results"))
        .unwrap_or(payload)
        .as_array()
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut lines = vec![format!("Search Results ({} found)", results.len())];
    for result in results {
        let title = non_empty_str(result, "title").unwrap_or("Untitled");
        let blurb = non_empty_str(result, "snippet")
            .or_else(|| non_empty_str(result, "description"))
            .unwrap_or("No description available");
        lines.push(format!("- {title}"));
        lines.push(format!("  {blurb}"));
        if let Some(link) = non_empty_str(result, "link") {
            lines.push(format!("  {link}"));
        }
    }
    lines
}

fn selected_urls(payload: &Value) -> Vec<String> {
    let urls = payload.as_array().map(Vec::as_slice).unwrap_or_default();
    let mut lines = vec![format!("Top {} Articles Selected", urls.len())];
    lines.extend(urls.iter().enumerate().map(|(index, url)| {
        let url = url.as_str().map_or_else(|| url.to_string(), str::to_string);
        format!("{}. {}", index + 1, url)
    }));
    lines
}

fn text_block(payload: &Value) -> Vec<String> {
    newsletter_text(payload).lines().map(str::to_string).collect()
}

fn non_empty_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|text| !text.trim().is_empty())
}
