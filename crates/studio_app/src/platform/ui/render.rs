use studio_core::{PipelineSnapshot, StepId, StepStatus};

use super::content::step_content;

/// One-line progress summary, e.g. `[x] Search Results  [>] Best URLs  [ ] Summary ...`.
pub fn progress_line(view: &PipelineSnapshot) -> String {
    let steps = StepId::ALL
        .iter()
        .map(|step| format!("{} {}", status_marker(view.status(*step)), step.title()))
        .collect::<Vec<_>>()
        .join("  ");

    let state = if view.completed {
        "done"
    } else if view.error.is_some() {
        "failed"
    } else if view.loading {
        "running"
    } else {
        "idle"
    };
    format!("{steps}  ({state})")
}

/// Header plus content block for one step.
pub fn step_section(view: &PipelineSnapshot, step: StepId) -> Vec<String> {
    let mut lines = vec![format!(
        "== Step {}: {} ({}) ==",
        step.ordinal(),
        step.title(),
        step.description()
    )];
    lines.extend(step_content(step, view.status(step), view.payload(step)));
    lines
}

/// Final banner once the session stops loading.
pub fn outcome(view: &PipelineSnapshot) -> Option<String> {
    if let Some(error) = &view.error {
        return Some(format!(
            "Error: {error}\nType :retry to run \"{}\" again.",
            view.query.as_deref().unwrap_or_default()
        ));
    }
    if view.completed {
        return Some("Newsletter Generated Successfully!".to_string());
    }
    None
}

pub fn query_banner(view: &PipelineSnapshot) -> Option<String> {
    view.query
        .as_ref()
        .map(|query| format!("Generating newsletter for: {query}"))
}

fn status_marker(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Wait => "[ ]",
        StepStatus::Process => "[>]",
        StepStatus::Finish => "[x]",
    }
}
