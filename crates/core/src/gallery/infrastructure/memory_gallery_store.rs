use std::sync::Mutex;

use crate::gallery::domain::gallery::Gallery;
use crate::gallery::domain::gallery_store::{GalleryStore, StoreError};

/// Keeps the gallery in process memory only.
///
/// Useful when embedding the engine in a host that owns persistence itself.
#[derive(Default)]
pub struct MemoryGalleryStore {
    gallery: Mutex<Option<Gallery>>,
}

impl MemoryGalleryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GalleryStore for MemoryGalleryStore {
    fn load(&self) -> Result<Gallery, StoreError> {
        let guard = self.gallery.lock().unwrap_or_else(|e| e.into_inner());
        Ok(guard.clone().unwrap_or_default())
    }

    fn save(&self, gallery: &Gallery) -> Result<(), StoreError> {
        *self.gallery.lock().unwrap_or_else(|e| e.into_inner()) = Some(gallery.clone());
        Ok(())
    }

    fn is_persisted(&self) -> bool {
        self.gallery
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }
}
