//! Small, reusable UI helpers used by multiple screens.

use kyc_core::session::ProcessingStatus;
use kyc_core::steps::Step;

/// Append `items` as option rows, marking the highlighted one.
pub fn push_options(lines: &mut Vec<String>, items: &[String], selected: usize) {
    if items.is_empty() {
        lines.push("  (no options available)".to_string());
        return;
    }
    for (idx, item) in items.iter().enumerate() {
        let marker = if idx == selected { "▶" } else { " " };
        lines.push(format!("{} {}", marker, item));
    }
}

/// Position of `step` in the wizard as a 0..=100 percentage.
pub fn progress_percent(step: Step) -> u16 {
    let last = Step::last().index().max(1);
    ((step.index() * 100) / last).min(100) as u16
}

pub fn status_badge(status: ProcessingStatus) -> &'static str {
    match status {
        ProcessingStatus::Pending => "· pending",
        ProcessingStatus::Processing => "⏳ processing",
        ProcessingStatus::Completed => "✅ completed",
        ProcessingStatus::Failed => "❌ failed",
    }
}

/// Marker for the completion summary: captured or not.
pub fn artifact_marker(present: bool) -> &'static str {
    if present {
        "✓"
    } else {
        "✗"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_spans_the_wizard() {
        assert_eq!(progress_percent(Step::Selfie), 0);
        assert_eq!(progress_percent(Step::DocumentFront), 50);
        assert_eq!(progress_percent(Step::Complete), 100);
    }

    #[test]
    fn options_mark_the_selection() {
        let mut lines = Vec::new();
        let items = vec!["Passport".to_string(), "Driver License".to_string()];
        push_options(&mut lines, &items, 1);
        assert_eq!(lines, vec!["  Passport", "▶ Driver License"]);
    }

    #[test]
    fn empty_options_render_a_placeholder() {
        let mut lines = Vec::new();
        push_options(&mut lines, &[], 0);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("no options"));
    }
}
