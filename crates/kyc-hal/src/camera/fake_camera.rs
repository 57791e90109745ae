//! Fake camera implementation for testing.
//!
//! Records every call and serves scripted frames, so flow tests can assert that
//! streams are released on every exit path without touching real devices.

use super::{Camera, Facing};
use crate::lock;
use kyc_error::CameraError;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Operation records for testing and verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraOp {
    Start(Facing),
    Stop,
    Capture,
}

#[derive(Debug, Default)]
struct FakeCameraState {
    operations: Vec<CameraOp>,
    facing: Option<Facing>,
    start_failures: VecDeque<CameraError>,
    frames: VecDeque<Option<Vec<u8>>>,
    default_frame: Vec<u8>,
}

/// Fake camera that records operations and serves scripted frames.
///
/// Clones share state, so a test can keep one handle while the flow owns
/// another.
#[derive(Debug, Clone)]
pub struct FakeCamera {
    state: Arc<Mutex<FakeCameraState>>,
}

impl Default for FakeCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeCamera {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeCameraState {
                default_frame: b"\xFF\xD8fake-jpeg\xFF\xD9".to_vec(),
                ..FakeCameraState::default()
            })),
        }
    }

    /// Make the next `start` call fail with `err`.
    pub fn fail_next_start(&self, err: CameraError) {
        lock(&self.state).start_failures.push_back(err);
    }

    /// Queue the result of a future `capture_frame` call. `None` simulates an
    /// encoder failure.
    pub fn push_frame(&self, frame: Option<Vec<u8>>) {
        lock(&self.state).frames.push_back(frame);
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<CameraOp> {
        lock(&self.state).operations.clone()
    }

    pub fn starts(&self) -> usize {
        self.count(|op| matches!(op, CameraOp::Start(_)))
    }

    pub fn stops(&self) -> usize {
        self.count(|op| matches!(op, CameraOp::Stop))
    }

    pub fn last_facing(&self) -> Option<Facing> {
        lock(&self.state)
            .operations
            .iter()
            .rev()
            .find_map(|op| match op {
                CameraOp::Start(facing) => Some(*facing),
                _ => None,
            })
    }

    pub fn clear_operations(&self) {
        lock(&self.state).operations.clear();
    }

    fn count(&self, pred: impl Fn(&CameraOp) -> bool) -> usize {
        lock(&self.state)
            .operations
            .iter()
            .filter(|op| pred(op))
            .count()
    }
}

impl Camera for FakeCamera {
    fn start(&self, facing: Facing) -> Result<(), CameraError> {
        let mut state = lock(&self.state);
        state.operations.push(CameraOp::Start(facing));
        state.facing = None;
        if let Some(err) = state.start_failures.pop_front() {
            return Err(err);
        }
        state.facing = Some(facing);
        Ok(())
    }

    fn stop(&self) {
        let mut state = lock(&self.state);
        state.operations.push(CameraOp::Stop);
        state.facing = None;
    }

    fn is_streaming(&self) -> bool {
        lock(&self.state).facing.is_some()
    }

    fn capture_frame(&self) -> Option<Vec<u8>> {
        let mut state = lock(&self.state);
        state.operations.push(CameraOp::Capture);
        state.facing?;
        match state.frames.pop_front() {
            Some(frame) => frame,
            None => Some(state.default_frame.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_operations_in_order() {
        let camera = FakeCamera::new();
        camera.start(Facing::User).unwrap();
        assert!(camera.capture_frame().is_some());
        camera.stop();

        assert_eq!(
            camera.operations(),
            vec![
                CameraOp::Start(Facing::User),
                CameraOp::Capture,
                CameraOp::Stop
            ]
        );
    }

    #[test]
    fn scripted_start_failure_leaves_camera_idle() {
        let camera = FakeCamera::new();
        camera.fail_next_start(CameraError::PermissionDenied);
        assert_eq!(
            camera.start(Facing::Environment).unwrap_err(),
            CameraError::PermissionDenied
        );
        assert!(!camera.is_streaming());
        camera.start(Facing::Environment).unwrap();
        assert!(camera.is_streaming());
    }

    #[test]
    fn capture_without_feed_returns_none() {
        let camera = FakeCamera::new();
        assert!(camera.capture_frame().is_none());
    }

    #[test]
    fn scripted_frames_are_served_before_default() {
        let camera = FakeCamera::new();
        camera.start(Facing::User).unwrap();
        camera.push_frame(None);
        camera.push_frame(Some(b"one".to_vec()));
        assert!(camera.capture_frame().is_none());
        assert_eq!(camera.capture_frame().unwrap(), b"one");
        assert!(camera.capture_frame().is_some());
    }
}
