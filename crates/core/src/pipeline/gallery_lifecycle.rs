use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::corpus::domain::image_loader::{ImageLoader, LoadError};
use crate::corpus::domain::reference_corpus::{CorpusError, ReferenceCorpus};
use crate::detection::domain::face_encoder::{EncodeError, FaceEncoder};
use crate::gallery::domain::gallery::Gallery;
use crate::gallery::domain::gallery_store::{GalleryStore, StoreError};
use crate::gallery::domain::identity_name::{IdentityName, InvalidName};
use crate::pipeline::rebuild_gallery_use_case::{RebuildGalleryUseCase, RebuildSummary};

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error(transparent)]
    InvalidName(#[from] InvalidName),
    #[error("no face detected in {0}; try another image")]
    NoFaceDetected(PathBuf),
    #[error("no reference data found for '{0}'")]
    NotFound(String),
    #[error("failed to load image {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: LoadError,
    },
    #[error("face extraction failed for {path}: {source}")]
    Extraction {
        path: PathBuf,
        #[source]
        source: EncodeError,
    },
    #[error(transparent)]
    Corpus(#[from] CorpusError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What an add or remove changed on disk, plus the rebuild that followed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentityChange {
    pub name: String,
    pub paths: Vec<PathBuf>,
    pub summary: RebuildSummary,
}

/// Keeps the persisted gallery consistent with the reference corpus.
///
/// Every mutation edits the corpus and then rebuilds and saves the whole
/// gallery. Callers must serialize calls; the manager itself holds no lock.
pub struct GalleryLifecycleManager {
    store: Box<dyn GalleryStore>,
    corpus: Box<dyn ReferenceCorpus>,
    loader: Arc<dyn ImageLoader>,
    encoder: Arc<dyn FaceEncoder>,
    rebuild: RebuildGalleryUseCase,
}

impl GalleryLifecycleManager {
    pub fn new(
        store: Box<dyn GalleryStore>,
        corpus: Box<dyn ReferenceCorpus>,
        loader: Arc<dyn ImageLoader>,
        encoder: Arc<dyn FaceEncoder>,
    ) -> Self {
        let rebuild = RebuildGalleryUseCase::new(loader.clone(), encoder.clone());
        Self {
            store,
            corpus,
            loader,
            encoder,
            rebuild,
        }
    }

    /// Loads the persisted gallery as is; empty when nothing was saved yet.
    pub fn load(&self) -> Result<Gallery, LifecycleError> {
        Ok(self.store.load()?)
    }

    /// Loads the persisted gallery, training it first if none exists yet.
    pub fn load_or_bootstrap(&self) -> Result<Gallery, LifecycleError> {
        if self.store.is_persisted() {
            return Ok(self.store.load()?);
        }
        log::info!("No persisted gallery found, training from reference corpus");
        let (gallery, _) = self.rebuild_all()?;
        Ok(gallery)
    }

    /// Recomputes the gallery from the whole corpus and persists it.
    pub fn rebuild_all(&self) -> Result<(Gallery, RebuildSummary), LifecycleError> {
        let identities = self.corpus.identities()?;
        let (gallery, summary) = self.rebuild.execute(&identities);
        self.store.save(&gallery)?;
        log::info!(
            "Encoded {} face image(s) for {} identities ({} without a face, {} failed)",
            summary.vector_count,
            summary.identity_count,
            summary.skipped_images,
            summary.failed_images
        );
        Ok((gallery, summary))
    }

    /// Adds one reference image for `raw_name` and retrains.
    ///
    /// Nothing is written unless the image contains a face.
    pub fn add_identity(
        &self,
        raw_name: &str,
        image: &Path,
    ) -> Result<(Gallery, IdentityChange), LifecycleError> {
        let name = IdentityName::sanitize(raw_name)?;

        let frame = self
            .loader
            .load(image)
            .map_err(|source| LifecycleError::ImageLoad {
                path: image.to_path_buf(),
                source,
            })?;
        let faces = self
            .encoder
            .detect_and_encode(&frame.to_rgb())
            .map_err(|source| LifecycleError::Extraction {
                path: image.to_path_buf(),
                source,
            })?;
        if faces.is_empty() {
            return Err(LifecycleError::NoFaceDetected(image.to_path_buf()));
        }
        if faces.len() > 1 {
            log::warn!(
                "{} contains {} faces; only the first is used for '{name}'",
                image.display(),
                faces.len()
            );
        }

        let stored = self.corpus.add_image(&name, image)?;
        let (gallery, summary) = match self.rebuild_all() {
            Ok(rebuilt) => rebuilt,
            Err(e) => {
                if let Err(cleanup) = self.corpus.remove_image(&stored) {
                    log::warn!("Could not roll back {}: {cleanup}", stored.display());
                }
                return Err(e);
            }
        };
        if !gallery.contains(name.as_str()) {
            log::warn!("'{name}' was stored but contributed no embedding to the gallery");
        }

        log::info!("Added face for '{name}' and retrained encodings");
        Ok((
            gallery,
            IdentityChange {
                name: name.into_string(),
                paths: vec![stored],
                summary,
            },
        ))
    }

    /// Deletes all reference material stored under exactly `raw_name` and retrains.
    ///
    /// The name is matched verbatim, so any name listed by
    /// [`identities`](Self::identities) can be removed.
    pub fn remove_identity(&self, raw_name: &str) -> Result<(Gallery, IdentityChange), LifecycleError> {
        let name = IdentityName::existing(raw_name)?;
        let removed = self.corpus.remove_identity(&name)?;
        self.finish_removal(name, removed)
    }

    /// Deletes top-level reference files whose name starts with `raw_prefix`
    /// and retrains.
    ///
    /// This is the cleanup path for legacy single-file entries such as
    /// `alice_1.jpg`; it can match other identities sharing the prefix, so
    /// every deleted file is logged.
    pub fn remove_by_prefix(
        &self,
        raw_prefix: &str,
    ) -> Result<(Gallery, IdentityChange), LifecycleError> {
        let prefix = IdentityName::existing(raw_prefix)?;
        let removed = self.corpus.remove_by_prefix(prefix.as_str())?;
        for path in &removed {
            log::warn!("Removed {} (prefix '{prefix}')", path.display());
        }
        self.finish_removal(prefix, removed)
    }

    /// Names of all identities in the reference corpus, sorted.
    pub fn identities(&self) -> Result<Vec<String>, LifecycleError> {
        let mut names: Vec<String> = self
            .corpus
            .identities()?
            .into_iter()
            .map(|identity| identity.name)
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    fn finish_removal(
        &self,
        name: IdentityName,
        removed: Vec<PathBuf>,
    ) -> Result<(Gallery, IdentityChange), LifecycleError> {
        if removed.is_empty() {
            return Err(LifecycleError::NotFound(name.into_string()));
        }
        let (gallery, summary) = self.rebuild_all()?;
        log::info!("Deleted data for '{name}' and retrained encodings");
        Ok((
            gallery,
            IdentityChange {
                name: name.into_string(),
                paths: removed,
                summary,
            },
        ))
    }
}
