//! Wizard state and key handling.

use crossterm::event::{KeyCode, KeyEvent};
use kyc_core::steps::Step;
use kyc_workflow::{CaptureOutcome, FlowController, StepState};
use std::path::PathBuf;
use std::time::Instant;

/// Result of handling input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputResult {
    Continue,
    Quit,
    Restarted,
    ReportSaved(PathBuf),
}

enum ListAction {
    None,
    Select,
}

pub struct App {
    pub flow: FlowController,
    /// Highlighted row on selection steps.
    pub list_index: usize,
    pub status_message: String,
    pub report_dir: PathBuf,
    pub last_report: Option<PathBuf>,
}

impl App {
    pub fn new(flow: FlowController, report_dir: PathBuf) -> Self {
        Self {
            flow,
            list_index: 0,
            status_message: "📸 Look at the camera and press Enter to take a selfie.".to_string(),
            report_dir,
            last_report: None,
        }
    }

    pub fn current_step(&self) -> Step {
        self.flow.current_step()
    }

    /// Labels of the options offered on the current selection step.
    pub fn options(&self) -> Vec<String> {
        match self.current_step() {
            Step::CountrySelection => self
                .flow
                .country_options()
                .into_iter()
                .map(|c| format!("{} ({})", c.name, c.code))
                .collect(),
            Step::DocumentTypeSelection => self
                .flow
                .document_options()
                .into_iter()
                .map(|d| d.label)
                .collect(),
            _ => Vec::new(),
        }
    }

    fn selected_value(&self) -> Option<String> {
        match self.current_step() {
            Step::CountrySelection => self
                .flow
                .country_options()
                .get(self.list_index)
                .map(|c| c.code.clone()),
            Step::DocumentTypeSelection => self
                .flow
                .document_options()
                .get(self.list_index)
                .map(|d| d.value.clone()),
            _ => None,
        }
    }

    pub fn handle_input(&mut self, key: KeyEvent) -> InputResult {
        if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
            return InputResult::Quit;
        }
        let step = self.current_step();
        if step.is_selection() {
            self.handle_selection_input(key)
        } else if step.is_capture() {
            self.handle_capture_input(key)
        } else {
            self.handle_complete_input(key)
        }
    }

    fn handle_selection_input(&mut self, key: KeyEvent) -> InputResult {
        let len = self.options().len();
        match Self::list_action(key, len, &mut self.list_index) {
            ListAction::Select => {
                let Some(value) = self.selected_value() else {
                    self.status_message = "ℹ️ No options available.".to_string();
                    return InputResult::Continue;
                };
                let result = match self.current_step() {
                    Step::CountrySelection => self.flow.select_country(&value),
                    _ => self.flow.select_document_type(&value),
                };
                match result {
                    Ok(next) => {
                        self.list_index = 0;
                        self.status_message = format!("✅ Selected {}. Next: {}", value, next.title());
                    }
                    Err(err) => self.status_message = format!("❌ {}", err),
                }
                InputResult::Continue
            }
            ListAction::None => InputResult::Continue,
        }
    }

    fn handle_capture_input(&mut self, key: KeyEvent) -> InputResult {
        match key.code {
            KeyCode::Char('r') if matches!(self.flow.step_state(), StepState::Unsupported(_)) => {
                return self.restart();
            }
            KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('c') => {
                self.status_message = match self.flow.capture() {
                    Ok(CaptureOutcome::Advanced(next)) => {
                        format!("✅ Accepted. Next: {}", next.title())
                    }
                    Ok(CaptureOutcome::Rejected(error)) => {
                        format!("❌ {} (press r to retry)", error)
                    }
                    Err(err) => format!("❌ {}", err),
                };
            }
            KeyCode::Char('r') => {
                self.status_message = match self.flow.retry() {
                    Ok(()) if self.flow.step_state().is_live() => "📸 Camera ready.".to_string(),
                    Ok(()) => "⚠️ Camera still unavailable.".to_string(),
                    Err(err) => format!("❌ {}", err),
                };
            }
            _ => {}
        }
        InputResult::Continue
    }

    fn handle_complete_input(&mut self, key: KeyEvent) -> InputResult {
        match key.code {
            KeyCode::Char('r') => self.restart(),
            KeyCode::Char('d') if !self.flow.completion_ready(Instant::now()) => {
                self.status_message = "⏳ Still processing your verification...".to_string();
                InputResult::Continue
            }
            KeyCode::Char('d') => match self.flow.write_report(&self.report_dir) {
                Ok(path) => {
                    self.status_message = format!("💾 Report saved to {}", path.display());
                    self.last_report = Some(path.clone());
                    InputResult::ReportSaved(path)
                }
                Err(err) => {
                    self.status_message = format!("❌ Failed to save report: {:#}", err);
                    InputResult::Continue
                }
            },
            _ => InputResult::Continue,
        }
    }

    fn restart(&mut self) -> InputResult {
        self.flow.restart();
        self.list_index = 0;
        self.last_report = None;
        self.status_message = "🔄 New verification started.".to_string();
        InputResult::Restarted
    }

    fn list_action(key: KeyEvent, len: usize, index: &mut usize) -> ListAction {
        match key.code {
            KeyCode::Up | KeyCode::Left | KeyCode::BackTab => {
                Self::adjust_index(len, index, -1);
                ListAction::None
            }
            KeyCode::Down | KeyCode::Right | KeyCode::Tab => {
                Self::adjust_index(len, index, 1);
                ListAction::None
            }
            KeyCode::Enter => ListAction::Select,
            _ => ListAction::None,
        }
    }

    fn adjust_index(len: usize, index: &mut usize, delta: isize) {
        if len == 0 {
            *index = 0;
            return;
        }
        let len_i = len as isize;
        let mut next = *index as isize + delta;
        if next < 0 {
            next = len_i - 1;
        } else if next >= len_i {
            next = 0;
        }
        *index = next as usize;
    }
}
