//! Display handles for captured images.
//!
//! A handle stands in for the preview resource a UI allocates per captured
//! image. Handles release themselves on drop; the registry counts what is
//! still live so leaks show up in tests.

use crate::lock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct RegistryState {
    next_id: u64,
    live: BTreeMap<u64, usize>,
}

#[derive(Debug, Clone, Default)]
pub struct HandleRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a handle for an image of `len` bytes.
    pub fn register(&self, len: usize) -> ImageHandle {
        let mut state = lock(&self.state);
        state.next_id += 1;
        let id = state.next_id;
        state.live.insert(id, len);
        ImageHandle {
            id,
            len,
            registry: self.clone(),
        }
    }

    pub fn live_count(&self) -> usize {
        lock(&self.state).live.len()
    }

    pub fn live_bytes(&self) -> usize {
        lock(&self.state).live.values().sum()
    }

    pub fn is_live(&self, id: u64) -> bool {
        lock(&self.state).live.contains_key(&id)
    }

    fn release(&self, id: u64) {
        if lock(&self.state).live.remove(&id).is_none() {
            log::warn!("image handle {} released twice", id);
        }
    }
}

/// Owned display handle; dropping it frees the registry entry.
pub struct ImageHandle {
    id: u64,
    len: usize,
    registry: HandleRegistry,
}

impl ImageHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn url(&self) -> String {
        format!("kyc-image://{}", self.id)
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHandle")
            .field("id", &self.id)
            .field("len", &self.len)
            .finish()
    }
}

impl Drop for ImageHandle {
    fn drop(&mut self) {
        self.registry.release(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_release_on_drop() {
        let registry = HandleRegistry::new();
        let a = registry.register(10);
        let b = registry.register(5);
        assert_eq!(registry.live_count(), 2);
        assert_eq!(registry.live_bytes(), 15);
        assert_ne!(a.url(), b.url());

        let a_id = a.id();
        drop(a);
        assert!(!registry.is_live(a_id));
        assert_eq!(registry.live_count(), 1);
        drop(b);
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn ids_are_never_reused() {
        let registry = HandleRegistry::new();
        let first = registry.register(1).id();
        let second = registry.register(1).id();
        assert!(second > first);
    }
}
