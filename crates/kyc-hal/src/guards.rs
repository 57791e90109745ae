use crate::{Camera, Facing};
use kyc_error::CameraError;
use std::sync::Arc;

/// RAII guard that stops a camera feed when dropped.
///
/// Every capture step holds one of these while mounted, so the stream is
/// released on success, error, restart, and abandonment alike.
pub struct CameraGuard<C: Camera + ?Sized = dyn Camera> {
    camera: Arc<C>,
    facing: Facing,
    active: bool,
}

impl<C: Camera + ?Sized> CameraGuard<C> {
    /// Start the camera and tie the feed's lifetime to the returned guard.
    pub fn acquire(camera: Arc<C>, facing: Facing) -> Result<Self, CameraError> {
        if let Err(err) = camera.start(facing) {
            camera.stop();
            return Err(err);
        }
        Ok(Self {
            camera,
            facing,
            active: true,
        })
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    /// Prevent automatic stopping and hand the camera back.
    pub fn release(mut self) -> Arc<C> {
        self.active = false;
        Arc::clone(&self.camera)
    }
}

impl<C: Camera + ?Sized> std::fmt::Debug for CameraGuard<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraGuard")
            .field("facing", &self.facing)
            .field("active", &self.active)
            .finish()
    }
}

impl<C: Camera + ?Sized> Drop for CameraGuard<C> {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        log::debug!("camera guard releasing {} feed", self.facing);
        self.camera.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CameraOp, FakeCamera};

    #[test]
    fn drop_stops_camera() {
        let camera = FakeCamera::new();
        {
            let guard = CameraGuard::acquire(Arc::new(camera.clone()), Facing::User).unwrap();
            assert!(guard.camera().is_streaming());
        }
        assert!(!camera.is_streaming());
        assert_eq!(camera.operations().last(), Some(&CameraOp::Stop));
    }

    #[test]
    fn failed_acquire_still_stops() {
        let camera = FakeCamera::new();
        camera.fail_next_start(CameraError::DeviceBusy);
        let err = CameraGuard::acquire(Arc::new(camera.clone()), Facing::Environment).unwrap_err();
        assert_eq!(err, CameraError::DeviceBusy);
        assert_eq!(camera.stops(), 1);
    }

    #[test]
    fn release_keeps_stream_open() {
        let camera = FakeCamera::new();
        let guard = CameraGuard::acquire(Arc::new(camera.clone()), Facing::User).unwrap();
        let _camera = guard.release();
        assert!(camera.is_streaming());
        assert_eq!(camera.stops(), 0);
    }

    #[test]
    fn works_with_trait_objects() {
        let camera = FakeCamera::new();
        let shared: Arc<dyn Camera> = Arc::new(camera.clone());
        drop(CameraGuard::acquire(shared, Facing::Environment).unwrap());
        assert_eq!(camera.last_facing(), Some(Facing::Environment));
        assert_eq!(camera.stops(), 1);
    }
}
