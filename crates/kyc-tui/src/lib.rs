//! KYC wizard TUI.
//!
//! Renders the verification flow as a single ratatui screen and maps key
//! presses onto the flow controller.

pub mod app;
pub mod ui;
pub mod widgets;

pub use app::{App, InputResult};

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use kyc_core::backend::FakeBackend;
use kyc_core::reference::ReferenceData;
use kyc_core::scan::resolve_scan_method;
use kyc_core::steps::{self, Step};
use kyc_hal::FakeCamera;
use kyc_workflow::{CaptureOutcome, FlowController};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Run the wizard on the current terminal until the user quits.
pub fn run(mut app: App) -> Result<InputResult> {
    use std::io::IsTerminal;

    if !std::io::stdout().is_terminal() {
        anyhow::bail!(
            "No TTY detected. The wizard requires an interactive terminal.\n\
             Try running directly in a terminal (not piped or via script)."
        );
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, &mut app);

    // Restore the terminal even when the loop failed.
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<InputResult> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match app.handle_input(key) {
                    InputResult::Quit => {
                        log::info!(
                            "wizard closed at {:?} for {}",
                            app.current_step(),
                            app.flow.session().verification_id()
                        );
                        return Ok(InputResult::Quit);
                    }
                    InputResult::ReportSaved(path) => {
                        log::info!("report saved to {}", path.display());
                    }
                    InputResult::Restarted | InputResult::Continue => {}
                }
            }
        }
    }
}

/// Walk a simulated session through every step and render each one.
///
/// The walk prefers a non-passport document with a supported scanner so the
/// back-of-document step is shown too.
pub fn dump_all_steps(reference: Arc<ReferenceData>) -> String {
    let (country, document) = match demo_selection(&reference) {
        Some(selection) => selection,
        None => return "No reference data with a supported scanner.\n".to_string(),
    };
    let flow = FlowController::new(
        Arc::new(FakeCamera::new()),
        Arc::new(FakeBackend::new()),
        reference,
    )
    .with_completion_delay(Duration::ZERO);
    let mut app = App::new(flow, PathBuf::from("."));
    let mut out = String::new();

    for _ in Step::all() {
        out.push_str(&ui::dump_step(&app));
        out.push('\n');
        let step = app.current_step();
        let advanced = match step {
            Step::CountrySelection => app.flow.select_country(&country).is_ok(),
            Step::DocumentTypeSelection => app.flow.select_document_type(&document).is_ok(),
            Step::Complete => false,
            _ => matches!(app.flow.capture(), Ok(CaptureOutcome::Advanced(_))),
        };
        if !advanced {
            break;
        }
    }
    out
}

fn demo_selection(reference: &ReferenceData) -> Option<(String, String)> {
    let mut candidates = Vec::new();
    for country in reference.countries() {
        for option in reference.document_options(&country.code) {
            let method = resolve_scan_method(reference, &country.code, &option.value);
            if method.is_supported() {
                candidates.push((country.code.clone(), option.value));
            }
        }
    }
    candidates
        .iter()
        .find(|(_, document)| !steps::is_passport(Some(document.as_str())))
        .or_else(|| candidates.first())
        .cloned()
}
