//! Ephemeral preview URLs for staged files.
//!
//! A `PreviewLease` is the only handle to a preview URL. It is created by
//! `PreviewRegistry::acquire` and releases its URL when dropped, so every URL
//! is released exactly once whichever way the owning slot or session goes
//! away.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use obra_core::LocalFile;
use uuid::Uuid;

pub const PREVIEW_SCHEME: &str = "preview://";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreviewStats {
    pub created: u64,
    pub released: u64,
    pub live: usize,
}

#[derive(Debug, Default)]
struct RegistryInner {
    live: HashMap<String, LocalFile>,
    created: u64,
    released: u64,
}

/// Issues and tracks preview URLs. Cheap to clone; clones share state.
#[derive(Debug, Clone, Default)]
pub struct PreviewRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn acquire(&self, file: &LocalFile) -> PreviewLease {
        let url = format!("{}{}/{}", PREVIEW_SCHEME, Uuid::new_v4().simple(), file.filename);
        let mut inner = self.lock();
        inner.live.insert(url.clone(), file.clone());
        inner.created += 1;
        tracing::debug!(url = %url, "preview acquired");
        PreviewLease {
            url,
            registry: self.clone(),
        }
    }

    /// Bytes and content type behind a live preview URL.
    pub fn resolve(&self, url: &str) -> Option<(String, Bytes)> {
        self.lock()
            .live
            .get(url)
            .map(|f| (f.content_type.clone(), f.bytes.clone()))
    }

    pub fn is_live(&self, url: &str) -> bool {
        self.lock().live.contains_key(url)
    }

    pub fn stats(&self) -> PreviewStats {
        let inner = self.lock();
        PreviewStats {
            created: inner.created,
            released: inner.released,
            live: inner.live.len(),
        }
    }

    fn release(&self, url: &str) {
        let mut inner = self.lock();
        if inner.live.remove(url).is_some() {
            inner.released += 1;
            tracing::debug!(url = %url, "preview released");
        }
    }
}

/// Owns one preview URL until dropped.
#[derive(Debug)]
pub struct PreviewLease {
    url: String,
    registry: PreviewRegistry,
}

impl PreviewLease {
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for PreviewLease {
    fn drop(&mut self) {
        self.registry.release(&self.url);
    }
}
