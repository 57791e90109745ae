//! Single-screen layout for the wizard.

use crate::app::App;
use crate::widgets::{artifact_marker, progress_percent, push_options, status_badge};
use kyc_core::session::CaptureSlot;
use kyc_core::steps::Step;
use kyc_workflow::StepState;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph},
    Frame,
};
use std::time::Instant;

const HEADER: &str = "KYC Verification";

pub fn draw(f: &mut Frame, app: &App) {
    // Title | Main Body | Progress Bar | Key Legend
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(3),
                Constraint::Length(4),
            ]
            .as_ref(),
        )
        .split(f.area());

    let (state_label, state_color) = match app.flow.step_state() {
        StepState::Live(_) => ("CAMERA ON", Color::Green),
        StepState::CameraFailed(_) | StepState::Unsupported(_) => ("BLOCKED", Color::Red),
        StepState::Rejected { .. } => ("RETRY", Color::Yellow),
        StepState::Idle => ("CAMERA OFF", Color::Gray),
    };
    let title_line = Line::from(vec![
        Span::styled(HEADER, Style::default().fg(Color::White)),
        Span::raw(" | "),
        Span::styled(
            app.flow.session().verification_id().to_string(),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(" | "),
        Span::styled(state_label, Style::default().fg(state_color)),
    ]);
    f.render_widget(
        Block::default().borders(Borders::ALL).title(title_line),
        main_chunks[0],
    );

    // Sidebar | Content | Info Panel
    let body_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage(20),
                Constraint::Percentage(55),
                Constraint::Percentage(25),
            ]
            .as_ref(),
        )
        .split(main_chunks[1]);

    let sidebar = Paragraph::new(build_step_sidebar(app))
        .block(Block::default().borders(Borders::ALL).title("Steps"));
    f.render_widget(sidebar, body_chunks[0]);

    let items = build_step_lines(app)
        .into_iter()
        .map(ListItem::new)
        .collect::<Vec<_>>();
    let content = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(app.current_step().title()),
    );
    f.render_widget(content, body_chunks[1]);

    let info = Paragraph::new(build_info_panel(app))
        .block(Block::default().borders(Borders::ALL).title("Info"));
    f.render_widget(info, body_chunks[2]);

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Progress"))
        .gauge_style(Style::default().fg(Color::Yellow))
        .percent(progress_percent(app.current_step()));
    f.render_widget(gauge, main_chunks[2]);

    let legend_text = format!("{}\n{}", app.status_message, expected_actions(app));
    let legend =
        Paragraph::new(legend_text).block(Block::default().borders(Borders::ALL).title("Keys"));
    f.render_widget(legend, main_chunks[3]);
}

pub fn dump_step(app: &App) -> String {
    let step = app.current_step();
    let lines = build_step_lines(app);
    let hint = lines
        .first()
        .cloned()
        .unwrap_or_else(|| "🧭 Step: (unknown)".to_string());
    let body = if lines.len() > 1 {
        lines[1..].join("\n")
    } else {
        "(no body content)".to_string()
    };

    format!(
        "STEP: {}\n\n- Header: {}\n- Hint line: {}\n- Body contents:\n{}\n- Info panel:\n{}\n- Footer/progress/status blocks:\nProgress: {}%\nStatus: {}\n- Expected user actions (keys): {}\n",
        step.title(),
        HEADER,
        hint,
        body,
        build_info_panel(app),
        progress_percent(step),
        app.status_message,
        expected_actions(app)
    )
}

fn build_step_sidebar(app: &App) -> String {
    let current = app.current_step();
    let session = app.flow.session();
    Step::all()
        .iter()
        .map(|step| {
            let marker = if *step == current {
                "▶"
            } else if step.is_skipped(session) {
                "–"
            } else if step.index() < current.index() {
                "✓"
            } else {
                " "
            };
            format!("{} {}", marker, step.title())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn build_step_lines(app: &App) -> Vec<String> {
    let step = app.current_step();
    let mut lines = vec![format!("🧭 Step {}: {}", step.index() + 1, step.title())];

    match step {
        Step::Selfie => {
            lines.push("Position your face in the frame and look straight ahead.".to_string());
        }
        Step::CountrySelection => {
            lines.push("Select the country that issued your document:".to_string());
            push_options(&mut lines, &app.options(), app.list_index);
        }
        Step::DocumentTypeSelection => {
            lines.push("Select the document you will present:".to_string());
            push_options(&mut lines, &app.options(), app.list_index);
        }
        Step::DocumentFront => {
            lines.push("Place the FRONT of your document inside the frame.".to_string());
        }
        Step::DocumentBack => {
            lines.push("Turn the document over and capture the BACK.".to_string());
        }
        Step::Scanning => {
            let method = app
                .flow
                .session()
                .scan_method()
                .map(|m| m.label())
                .unwrap_or("Unknown");
            lines.push(format!("Scan method: {}", method));
            lines.push("Hold the machine-readable area steady in the frame.".to_string());
        }
        Step::Complete => {
            push_completion(app, &mut lines);
            return lines;
        }
    }

    push_step_state(app.flow.step_state(), &mut lines);
    lines
}

fn push_step_state(state: &StepState, lines: &mut Vec<String>) {
    lines.push(String::new());
    match state {
        StepState::Live(guard) => {
            lines.push(format!("📸 Camera ready ({})", guard.facing()));
        }
        StepState::Idle => lines.push("📷 Camera idle".to_string()),
        _ => {}
    }
    if let Some(error) = state.error() {
        lines.push(format!("❌ {}", error.title()));
        lines.push(format!("   {}", error.message));
        for tip in &error.tips {
            lines.push(format!("   • {}", tip));
        }
    }
    if let Some(handle) = state.preview() {
        lines.push(format!(
            "🖼️ Last capture: {} ({} bytes)",
            handle.url(),
            handle.len()
        ));
    }
}

fn push_completion(app: &App, lines: &mut Vec<String>) {
    if !app.flow.completion_ready(Instant::now()) {
        lines.push("⏳ Processing your verification...".to_string());
        return;
    }
    let session = app.flow.session();
    lines.push("🎉 Verification submitted successfully.".to_string());
    lines.push(format!("Verification ID: {}", session.verification_id()));
    for slot in CaptureSlot::all() {
        lines.push(format!(
            "{} {}",
            artifact_marker(session.has_artifact(*slot)),
            slot.label()
        ));
    }
    if let Some(payload) = session.scan_payload() {
        lines.push("Scanned data:".to_string());
        lines.extend(payload.lines().map(|line| format!("  {}", line)));
    }
    if let Some(error) = app.flow.session_error() {
        lines.push(format!("⚠️ Summary not recorded: {}", error));
    }
    if let Some(path) = &app.last_report {
        lines.push(format!("💾 Report: {}", path.display()));
    }
}

fn build_info_panel(app: &App) -> String {
    let session = app.flow.session();
    let mut lines = vec![
        format!("ID: {}", session.verification_id()),
        format!(
            "Country: {}",
            session.selected_country_code().unwrap_or("-")
        ),
        format!(
            "Document: {}",
            session.selected_document_type().unwrap_or("-")
        ),
        format!(
            "Scan: {}",
            session.scan_method().map(|m| m.label()).unwrap_or("-")
        ),
        format!("Camera: {}", app.flow.step_state().label()),
        String::new(),
    ];
    for slot in CaptureSlot::all() {
        lines.push(format!("{}: {}", slot.label(), status_badge(session.status(*slot))));
    }
    lines.join("\n")
}

fn expected_actions(app: &App) -> &'static str {
    let step = app.current_step();
    if step.is_selection() {
        return "↑/↓ choose | Enter select | q quit";
    }
    if step == Step::Complete {
        return "d save report | r new verification | q quit";
    }
    match app.flow.step_state() {
        StepState::Unsupported(_) => "r restart | q quit",
        StepState::Live(_) => "Enter/Space/c capture | q quit",
        _ => "r retry | q quit",
    }
}
