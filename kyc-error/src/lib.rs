use std::fmt;
use thiserror::Error;

pub type KycResult<T> = Result<T, KycError>;

/// Failures reported by a camera when acquiring a feed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("Camera access denied. Please allow camera permissions.")]
    PermissionDenied,

    #[error("Camera is already in use by another application.")]
    DeviceBusy,

    #[error("No camera device found")]
    DeviceNotFound,

    #[error("Camera error: {0}")]
    Unknown(String),
}

/// Failures taking a still frame from a live feed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Camera not available")]
    CameraUnavailable,

    #[error("Failed to capture image: {0}")]
    FrameCaptureFailed(String),
}

#[derive(Error, Debug)]
pub enum KycError {
    #[error(transparent)]
    Camera(#[from] CameraError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("{0}")]
    Validation(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("No scan method is available for document type {document_type} in {country}")]
    UnsupportedConfiguration {
        country: String,
        document_type: String,
    },

    #[error("{field} has already been selected for this session")]
    SelectionLocked { field: &'static str },

    #[error("Unknown {field}: {value}")]
    UnknownSelection { field: &'static str, value: String },

    #[error("The current step does not accept this action")]
    WrongStep,

    #[error("Reference data error: {0}")]
    ReferenceData(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Category shown to the user alongside a step failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Camera,
    Processing,
    Network,
    Validation,
}

impl ErrorKind {
    pub fn title(&self) -> &'static str {
        match self {
            ErrorKind::Camera => "Camera Access Required",
            ErrorKind::Processing => "Processing Failed",
            ErrorKind::Network => "Connection Error",
            ErrorKind::Validation => "Validation Error",
        }
    }

    fn default_tips(&self) -> Vec<String> {
        let tips: &[&str] = match self {
            ErrorKind::Camera => &[
                "Ensure your camera is connected and accessible.",
                "Allow camera access and try again.",
            ],
            ErrorKind::Processing => &[
                "Try again.",
                "Ensure good lighting conditions.",
            ],
            ErrorKind::Network => &["Check your internet connection.", "Try again later."],
            ErrorKind::Validation => &[
                "Hold the camera steady and fill the frame.",
                "Avoid glare and shadows.",
            ],
        };
        tips.iter().map(|s| s.to_string()).collect()
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::Camera => "camera",
            ErrorKind::Processing => "processing",
            ErrorKind::Network => "network",
            ErrorKind::Validation => "validation",
        };
        f.write_str(label)
    }
}

/// A recoverable failure surfaced on a capture step, with remediation tips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepError {
    pub kind: ErrorKind,
    pub message: String,
    pub tips: Vec<String>,
}

impl StepError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            tips: kind.default_tips(),
        }
    }

    pub fn with_tips<I, S>(mut self, tips: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tips = tips.into_iter().map(Into::into).collect();
        self
    }

    pub fn title(&self) -> &'static str {
        self.kind.title()
    }
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.title(), self.message)
    }
}

impl KycError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            KycError::Camera(_) => ErrorKind::Camera,
            KycError::Capture(CaptureError::CameraUnavailable) => ErrorKind::Camera,
            KycError::Capture(CaptureError::FrameCaptureFailed(_)) => ErrorKind::Processing,
            KycError::Validation(_) => ErrorKind::Validation,
            KycError::Network(_) => ErrorKind::Network,
            _ => ErrorKind::Processing,
        }
    }

    pub fn to_step_error(&self) -> StepError {
        StepError::new(self.kind(), self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_errors_map_to_camera_kind() {
        let err = KycError::from(CameraError::DeviceBusy);
        let step = err.to_step_error();
        assert_eq!(step.kind, ErrorKind::Camera);
        assert_eq!(step.title(), "Camera Access Required");
        assert!(step.message.contains("already in use"));
        assert!(!step.tips.is_empty());
    }

    #[test]
    fn frame_failure_is_processing() {
        let err = KycError::from(CaptureError::FrameCaptureFailed("encoder".into()));
        assert_eq!(err.kind(), ErrorKind::Processing);
    }

    #[test]
    fn reference_and_json_failures_are_processing() {
        let reference = KycError::ReferenceData("row 3: missing country_code".into());
        assert_eq!(reference.kind(), ErrorKind::Processing);

        let json = KycError::from(serde_json::from_str::<u8>("x").unwrap_err());
        let step = json.to_step_error();
        assert_eq!(step.kind, ErrorKind::Processing);
        assert!(step.message.starts_with("JSON error"));
    }

    #[test]
    fn with_tips_replaces_defaults() {
        let step = StepError::new(ErrorKind::Validation, "Fake face detected.")
            .with_tips(["Use your real face."]);
        assert_eq!(step.tips, vec!["Use your real face.".to_string()]);
        assert_eq!(step.to_string(), "Validation Error: Fake face detected.");
    }
}
