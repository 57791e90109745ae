//! KYC capture Hardware Abstraction Layer (HAL).
//!
//! Cameras and image display handles live behind small traits so the flow
//! controller can be driven by real devices, a directory of frames, or fakes
//! in tests.

pub mod camera;
pub mod guards;
pub mod handles;

pub use camera::{Camera, CameraOp, FakeCamera, Facing, FileCamera};
pub use guards::CameraGuard;
pub use handles::{HandleRegistry, ImageHandle};
pub use kyc_error::CameraError;

pub(crate) fn lock<T>(mutex: &std::sync::Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
