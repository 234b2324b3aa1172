use std::path::PathBuf;

use thiserror::Error;

use crate::gallery::domain::gallery::Gallery;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to read gallery from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write gallery to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed gallery file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unsupported gallery format version {version} in {path}")]
    UnsupportedVersion { path: PathBuf, version: u32 },
}

/// Persistence for the gallery.
///
/// `save` replaces the persisted gallery wholesale; a concurrent `load`
/// observes either the previous or the new gallery, never a mix.
pub trait GalleryStore: Send {
    /// Returns an empty gallery when nothing has been persisted yet.
    fn load(&self) -> Result<Gallery, StoreError>;

    fn save(&self, gallery: &Gallery) -> Result<(), StoreError>;

    fn is_persisted(&self) -> bool;
}
