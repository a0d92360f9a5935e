//! Scoped image previews
//!
//! Selecting an image for a listing registers its bytes in a
//! [`PreviewRegistry`] and yields a [`PreviewHandle`] carrying a local
//! `preview:` URL. The registry entry lives exactly as long as the handle,
//! so every path that discards a selection (removing one image, clearing the
//! form, dropping it after an upload succeeds or fails) releases the preview.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tracing::debug;

use crate::{
    error::{CatalogError, CatalogResult},
    validation::MAX_IMAGES,
};

/// Largest accepted image file
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Default)]
struct Entries {
    next_id: u64,
    live: HashMap<u64, Arc<[u8]>>,
}

/// Registry of live preview handles
#[derive(Debug, Clone, Default)]
pub struct PreviewRegistry {
    entries: Arc<Mutex<Entries>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `bytes` and hand out the handle that owns the entry
    pub fn acquire(&self, bytes: impl Into<Arc<[u8]>>) -> PreviewHandle {
        let mut entries = self.lock();
        entries.next_id += 1;
        let id = entries.next_id;
        entries.live.insert(id, bytes.into());

        PreviewHandle {
            id,
            registry: self.clone(),
        }
    }

    /// Bytes behind a `preview:` URL, while its handle is alive
    pub fn resolve(&self, url: &str) -> Option<Arc<[u8]>> {
        let id = url.strip_prefix("preview:")?.parse::<u64>().ok()?;
        self.lock().live.get(&id).cloned()
    }

    /// Number of previews not yet released
    pub fn live_count(&self) -> usize {
        self.lock().live.len()
    }

    fn release(&self, id: u64) {
        if self.lock().live.remove(&id).is_some() {
            debug!("Released preview {}", id);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Owns one registry entry; dropping it releases the preview
#[derive(Debug)]
pub struct PreviewHandle {
    id: u64,
    registry: PreviewRegistry,
}

impl PreviewHandle {
    pub fn url(&self) -> String {
        format!("preview:{}", self.id)
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.registry.release(self.id);
    }
}

/// A file chosen for upload
#[derive(Debug)]
pub struct SelectedImage {
    pub name: String,
    bytes: Arc<[u8]>,
    preview: PreviewHandle,
}

impl SelectedImage {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn preview_url(&self) -> String {
        self.preview.url()
    }
}

/// The images picked in a listing form, capped at [`MAX_IMAGES`] together
/// with the images the listing already keeps
#[derive(Debug)]
pub struct ImageSelection {
    registry: PreviewRegistry,
    capacity: usize,
    images: Vec<SelectedImage>,
}

impl ImageSelection {
    /// Selection for a new listing
    pub fn new(registry: PreviewRegistry) -> Self {
        Self::with_existing(registry, 0)
    }

    /// Selection for an edited listing that keeps `existing` images
    pub fn with_existing(registry: PreviewRegistry, existing: usize) -> Self {
        Self {
            registry,
            capacity: MAX_IMAGES.saturating_sub(existing),
            images: Vec::new(),
        }
    }

    /// Add a batch of `(file name, bytes)`
    ///
    /// The whole batch is refused when it would exceed the cap. Within an
    /// accepted batch, files over [`MAX_IMAGE_BYTES`] are skipped and their
    /// names returned.
    pub fn add_files(&mut self, files: Vec<(String, Vec<u8>)>) -> CatalogResult<Vec<String>> {
        if self.images.len() + files.len() > self.capacity {
            return Err(CatalogError::Validation {
                field: "images",
                message: format!("Maximum {} images allowed", MAX_IMAGES),
            });
        }

        let mut oversized = Vec::new();
        for (name, bytes) in files {
            if bytes.len() > MAX_IMAGE_BYTES {
                oversized.push(name);
                continue;
            }

            let bytes: Arc<[u8]> = bytes.into();
            let preview = self.registry.acquire(bytes.clone());
            self.images.push(SelectedImage {
                name,
                bytes,
                preview,
            });
        }

        Ok(oversized)
    }

    /// Drop the image at `index`, releasing its preview
    pub fn remove(&mut self, index: usize) -> Option<String> {
        (index < self.images.len()).then(|| self.images.remove(index).name)
    }

    pub fn clear(&mut self) {
        self.images.clear();
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn images(&self) -> &[SelectedImage] {
        &self.images
    }
}
