use crate::reference::same_code;
use crate::session::{CaptureSlot, VerificationSession};
use kyc_hal::Facing;

/// Document type code that has no back side to capture.
pub const PASSPORT_CODE: &str = "PP";

/// Defines the sequence of steps in the verification wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Selfie,
    CountrySelection,
    DocumentTypeSelection,
    DocumentFront,
    DocumentBack,
    Scanning,
    Complete,
}

impl Step {
    pub fn all() -> &'static [Step] {
        &[
            Step::Selfie,
            Step::CountrySelection,
            Step::DocumentTypeSelection,
            Step::DocumentFront,
            Step::DocumentBack,
            Step::Scanning,
            Step::Complete,
        ]
    }

    pub fn first() -> Step {
        Step::Selfie
    }

    pub fn last() -> Step {
        Step::Complete
    }

    pub fn index(&self) -> usize {
        Self::all()
            .iter()
            .position(|step| step == self)
            .unwrap_or_default()
    }

    /// Step at `index`; out-of-range indices clamp to the last step.
    pub fn from_index(index: usize) -> Step {
        let all = Self::all();
        all[index.min(all.len() - 1)]
    }

    pub fn title(&self) -> &'static str {
        match self {
            Step::Selfie => "Take a Selfie",
            Step::CountrySelection => "Select Country",
            Step::DocumentTypeSelection => "Select Document",
            Step::DocumentFront => "Document Front",
            Step::DocumentBack => "Document Back",
            Step::Scanning => "Scan Document",
            Step::Complete => "Verification Complete",
        }
    }

    pub fn is_capture(&self) -> bool {
        matches!(
            self,
            Step::Selfie | Step::DocumentFront | Step::DocumentBack | Step::Scanning
        )
    }

    pub fn is_selection(&self) -> bool {
        matches!(self, Step::CountrySelection | Step::DocumentTypeSelection)
    }

    /// Camera direction requested when a capture step mounts.
    pub fn facing(&self) -> Option<Facing> {
        match self {
            Step::Selfie => Some(Facing::User),
            Step::DocumentFront | Step::DocumentBack | Step::Scanning => Some(Facing::Environment),
            _ => None,
        }
    }

    pub fn slot(&self) -> Option<CaptureSlot> {
        match self {
            Step::Selfie => Some(CaptureSlot::Selfie),
            Step::DocumentFront => Some(CaptureSlot::DocumentFront),
            Step::DocumentBack => Some(CaptureSlot::DocumentBack),
            Step::Scanning => Some(CaptureSlot::Scan),
            _ => None,
        }
    }

    /// Transition table. The only conditional rule: leaving `DocumentFront`
    /// with a passport skips `DocumentBack`. `Complete` is terminal.
    pub fn next(&self, session: &VerificationSession) -> Step {
        match self {
            Step::Selfie => Step::CountrySelection,
            Step::CountrySelection => Step::DocumentTypeSelection,
            Step::DocumentTypeSelection => Step::DocumentFront,
            Step::DocumentFront => {
                if is_passport(session.selected_document_type()) {
                    Step::Scanning
                } else {
                    Step::DocumentBack
                }
            }
            Step::DocumentBack => Step::Scanning,
            Step::Scanning => Step::Complete,
            Step::Complete => Step::Complete,
        }
    }

    /// Whether the flow bypasses this step for the session's selections.
    pub fn is_skipped(&self, session: &VerificationSession) -> bool {
        *self == Step::DocumentBack && is_passport(session.selected_document_type())
    }
}

pub fn is_passport(document_type: Option<&str>) -> bool {
    document_type
        .map(|doc| same_code(doc, PASSPORT_CODE))
        .unwrap_or(false)
}

/// Index form of [`Step::next`]: never moves backwards, never leaves the
/// sequence.
pub fn advance(current_index: usize, session: &VerificationSession) -> usize {
    Step::from_index(current_index).next(session).index()
}
