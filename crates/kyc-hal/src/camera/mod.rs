//! Camera trait definitions and implementations.
//!
//! This module defines the camera capability consumed by capture steps and
//! provides both a directory-backed (FileCamera) and fake (FakeCamera)
//! implementation.

pub mod fake_camera;
pub mod file_camera;

pub use fake_camera::{CameraOp, FakeCamera};
pub use file_camera::FileCamera;

use kyc_error::CameraError;
use std::fmt;

/// Which way the camera should face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facing {
    /// Front camera, used for selfies.
    User,
    /// Rear camera, used for documents and scans.
    Environment,
}

impl Facing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Facing::User => "user",
            Facing::Environment => "environment",
        }
    }
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A live image source.
///
/// `start` replaces any active feed. `stop` must be safe to call repeatedly.
pub trait Camera: Send + Sync {
    fn start(&self, facing: Facing) -> Result<(), CameraError>;

    fn stop(&self);

    fn is_streaming(&self) -> bool;

    /// Take a still frame from the live feed as encoded image bytes.
    ///
    /// Returns `None` when there is no feed or the frame could not be encoded.
    fn capture_frame(&self) -> Option<Vec<u8>>;
}
