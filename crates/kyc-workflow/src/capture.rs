//! Step-local capture state.
//!
//! Everything a mounted step holds lives here and is dropped when the step
//! unmounts: the camera guard (stopping the feed) and any rejected frame
//! (releasing its preview handle).

use kyc_core::scan::ScanMethod;
use kyc_core::session::CaptureRecord;
use kyc_core::steps::Step;
use kyc_error::{ErrorKind, KycError, StepError};
use kyc_hal::{CameraGuard, ImageHandle};

/// What a capture attempt led to.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    /// Accepted by the backend; the flow moved on to this step.
    Advanced(Step),
    /// The step stays put and shows this error until retried.
    Rejected(StepError),
}

#[derive(Debug)]
pub enum StepState {
    /// Selection and completion steps hold nothing.
    Idle,
    /// Camera feed is live and a capture may be taken.
    Live(CameraGuard),
    /// The feed could not be started.
    CameraFailed(StepError),
    /// The last capture failed; the frame is kept for preview until retry.
    Rejected {
        error: StepError,
        frame: Option<CaptureRecord>,
    },
    /// No scanner exists for the selected document; only restart helps.
    Unsupported(StepError),
}

impl StepState {
    pub fn is_live(&self) -> bool {
        matches!(self, StepState::Live(_))
    }

    pub fn error(&self) -> Option<&StepError> {
        match self {
            StepState::CameraFailed(error)
            | StepState::Rejected { error, .. }
            | StepState::Unsupported(error) => Some(error),
            StepState::Idle | StepState::Live(_) => None,
        }
    }

    pub fn preview(&self) -> Option<&ImageHandle> {
        match self {
            StepState::Rejected {
                frame: Some(frame), ..
            } => Some(frame.handle()),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StepState::Idle => "idle",
            StepState::Live(_) => "camera ready",
            StepState::CameraFailed(_) => "camera unavailable",
            StepState::Rejected { .. } => "retry needed",
            StepState::Unsupported(_) => "unsupported",
        }
    }
}

/// Hints shown when the backend rejects a capture on `step`.
pub(crate) fn rejection_tips(step: Step, method: Option<ScanMethod>) -> &'static [&'static str] {
    match (step, method) {
        (Step::Selfie, _) => &[
            "Face the camera directly with your whole face in frame.",
            "Ensure good lighting conditions.",
        ],
        (Step::DocumentFront | Step::DocumentBack, _) => &[
            "Ensure the document is fully visible.",
            "Avoid glare or shadows.",
        ],
        (Step::Scanning, Some(ScanMethod::Barcode)) => &[
            "Ensure barcode is clearly visible.",
            "Try again with better lighting or angle.",
        ],
        (Step::Scanning, _) => &[
            "Ensure MRZ area is clearly visible.",
            "Try again with better lighting.",
        ],
        _ => &[],
    }
}

pub(crate) fn rejection_error(step: Step, method: Option<ScanMethod>, message: &str) -> StepError {
    StepError::new(ErrorKind::Validation, message)
        .with_tips(rejection_tips(step, method).iter().copied())
}

pub(crate) fn unsupported_error(country: &str, document_type: &str) -> StepError {
    let err = KycError::UnsupportedConfiguration {
        country: country.to_string(),
        document_type: document_type.to_string(),
    };
    StepError::new(ErrorKind::Validation, err.to_string()).with_tips([
        "This document cannot be scanned.",
        "Restart the verification and choose a different document type.",
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_tips_depend_on_method() {
        let mrz = rejection_error(Step::Scanning, Some(ScanMethod::Mrz), "bad");
        let barcode = rejection_error(Step::Scanning, Some(ScanMethod::Barcode), "bad");
        assert!(mrz.tips[0].contains("MRZ"));
        assert!(barcode.tips[0].contains("barcode"));
        assert_eq!(mrz.kind, ErrorKind::Validation);
    }

    #[test]
    fn unsupported_names_the_combination() {
        let error = unsupported_error("YY", "NI");
        assert!(error.message.contains("YY"));
        assert!(error.message.contains("NI"));
    }

    #[test]
    fn idle_state_has_no_error_or_preview() {
        let state = StepState::Idle;
        assert!(state.error().is_none());
        assert!(state.preview().is_none());
        assert!(!state.is_live());
    }
}
