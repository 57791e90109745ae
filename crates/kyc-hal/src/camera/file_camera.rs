//! Directory-backed camera.
//!
//! Each facing maps to a subdirectory of the root (`user/`, `environment/`).
//! When the subdirectory is missing the root itself is used. Frames are served
//! in file-name order and wrap around.

use super::{Camera, Facing};
use crate::lock;
use kyc_error::CameraError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const FRAME_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

#[derive(Debug)]
struct ActiveFeed {
    facing: Facing,
    frames: Vec<PathBuf>,
    next: usize,
}

#[derive(Debug)]
pub struct FileCamera {
    root: PathBuf,
    feed: Mutex<Option<ActiveFeed>>,
}

impl FileCamera {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            feed: Mutex::new(None),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn facing(&self) -> Option<Facing> {
        lock(&self.feed).as_ref().map(|feed| feed.facing)
    }

    fn feed_dir(&self, facing: Facing) -> PathBuf {
        let dir = self.root.join(facing.as_str());
        if dir.is_dir() {
            dir
        } else {
            self.root.clone()
        }
    }
}

fn map_io_error(err: io::Error) -> CameraError {
    match err.kind() {
        io::ErrorKind::NotFound => CameraError::DeviceNotFound,
        io::ErrorKind::PermissionDenied => CameraError::PermissionDenied,
        io::ErrorKind::WouldBlock => CameraError::DeviceBusy,
        _ => CameraError::Unknown(err.to_string()),
    }
}

fn is_frame(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
}

fn list_frames(dir: &Path) -> Result<Vec<PathBuf>, CameraError> {
    let mut frames = Vec::new();
    for entry in fs::read_dir(dir).map_err(map_io_error)? {
        let path = entry.map_err(map_io_error)?.path();
        if is_frame(&path) {
            frames.push(path);
        }
    }
    frames.sort();
    Ok(frames)
}

impl Camera for FileCamera {
    fn start(&self, facing: Facing) -> Result<(), CameraError> {
        self.stop();

        let dir = self.feed_dir(facing);
        let frames = list_frames(&dir)?;
        if frames.is_empty() {
            log::warn!("camera: no frames found in {}", dir.display());
            return Err(CameraError::DeviceNotFound);
        }

        log::info!(
            "camera: started {} feed from {} ({} frames)",
            facing,
            dir.display(),
            frames.len()
        );
        *lock(&self.feed) = Some(ActiveFeed {
            facing,
            frames,
            next: 0,
        });
        Ok(())
    }

    fn stop(&self) {
        if let Some(feed) = lock(&self.feed).take() {
            log::info!("camera: stopped {} feed", feed.facing);
        }
    }

    fn is_streaming(&self) -> bool {
        lock(&self.feed).is_some()
    }

    fn capture_frame(&self) -> Option<Vec<u8>> {
        let mut guard = lock(&self.feed);
        let feed = guard.as_mut()?;
        let path = feed.frames.get(feed.next)?.clone();
        feed.next = (feed.next + 1) % feed.frames.len();
        drop(guard);

        match fs::read(&path) {
            Ok(bytes) if !bytes.is_empty() => Some(bytes),
            Ok(_) => {
                log::warn!("camera: frame {} is empty", path.display());
                None
            }
            Err(err) => {
                log::warn!("camera: failed to read frame {}: {}", path.display(), err);
                None
            }
        }
    }
}

impl Drop for FileCamera {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn serves_frames_in_name_order_and_wraps() {
        let dir = tempdir().unwrap();
        let env = dir.path().join("environment");
        fs::create_dir(&env).unwrap();
        fs::write(env.join("b.jpg"), b"second").unwrap();
        fs::write(env.join("a.jpg"), b"first").unwrap();
        fs::write(env.join("notes.txt"), b"ignored").unwrap();

        let camera = FileCamera::new(dir.path());
        camera.start(Facing::Environment).unwrap();
        assert!(camera.is_streaming());
        assert_eq!(camera.capture_frame().unwrap(), b"first");
        assert_eq!(camera.capture_frame().unwrap(), b"second");
        assert_eq!(camera.capture_frame().unwrap(), b"first");
    }

    #[test]
    fn falls_back_to_root_when_facing_dir_missing() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("face.png"), b"png").unwrap();

        let camera = FileCamera::new(dir.path());
        camera.start(Facing::User).unwrap();
        assert_eq!(camera.facing(), Some(Facing::User));
        assert_eq!(camera.capture_frame().unwrap(), b"png");
    }

    #[test]
    fn missing_root_is_device_not_found() {
        let dir = tempdir().unwrap();
        let camera = FileCamera::new(dir.path().join("nope"));
        assert_eq!(
            camera.start(Facing::User).unwrap_err(),
            CameraError::DeviceNotFound
        );
        assert!(!camera.is_streaming());
    }

    #[test]
    fn empty_dir_is_device_not_found() {
        let dir = tempdir().unwrap();
        let camera = FileCamera::new(dir.path());
        assert_eq!(
            camera.start(Facing::Environment).unwrap_err(),
            CameraError::DeviceNotFound
        );
    }

    #[test]
    fn stop_is_idempotent_and_ends_capture() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.jpg"), b"a").unwrap();
        let camera = FileCamera::new(dir.path());
        camera.start(Facing::User).unwrap();
        camera.stop();
        camera.stop();
        assert!(!camera.is_streaming());
        assert!(camera.capture_frame().is_none());
    }
}
