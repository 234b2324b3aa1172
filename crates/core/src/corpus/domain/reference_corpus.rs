use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::gallery::domain::identity_name::IdentityName;

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("failed to read reference corpus at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to store reference image at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to remove reference material at {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One identity in the reference corpus and the images that describe it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferenceIdentity {
    pub name: String,
    pub images: Vec<PathBuf>,
    /// The image listing could not be read; `images` is empty.
    pub unreadable: bool,
}

/// The authoritative collection of reference images.
///
/// The gallery is derived from it and can always be rebuilt from it.
pub trait ReferenceCorpus: Send {
    /// All identities in a stable order. When two entries resolve to the
    /// same name, the later one supersedes the earlier in the gallery.
    fn identities(&self) -> Result<Vec<ReferenceIdentity>, CorpusError>;

    /// Copies `source` into the reference set of `name`, returning the stored path.
    ///
    /// Never overwrites an existing reference file, so the returned path is
    /// always safe to remove again if the caller needs to undo the add.
    fn add_image(&self, name: &IdentityName, source: &Path) -> Result<PathBuf, CorpusError>;

    /// Removes one stored reference file.
    fn remove_image(&self, path: &Path) -> Result<(), CorpusError>;

    /// Removes every reference entry stored under exactly `name`.
    /// Returns the removed paths.
    fn remove_identity(&self, name: &IdentityName) -> Result<Vec<PathBuf>, CorpusError>;

    /// Removes top-level reference files whose file name starts with `prefix`.
    /// Returns the removed paths.
    fn remove_by_prefix(&self, prefix: &str) -> Result<Vec<PathBuf>, CorpusError>;
}
