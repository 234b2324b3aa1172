use std::path::Path;
use std::sync::Arc;

use crate::corpus::domain::image_loader::ImageLoader;
use crate::corpus::domain::reference_corpus::ReferenceIdentity;
use crate::detection::domain::face_encoder::FaceEncoder;
use crate::gallery::domain::gallery::Gallery;
use crate::shared::embedding::Embedding;

/// Counts from one full rebuild.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RebuildSummary {
    pub identity_count: usize,
    pub vector_count: usize,
    /// Reference images in which the extractor found no face.
    pub skipped_images: usize,
    /// Reference images that could not be loaded or encoded, plus identity
    /// listings that could not be read.
    pub failed_images: usize,
}

enum ImageContribution {
    Embedding(Embedding),
    NoFace,
    Failed,
}

/// Derives a fresh gallery from the reference corpus.
///
/// Each reference image contributes the embedding of its first detected
/// face; additional faces in a reference image are ignored. Images that
/// fail to load or encode are logged and counted without stopping the
/// rebuild, and identities left with no embeddings are omitted.
pub struct RebuildGalleryUseCase {
    loader: Arc<dyn ImageLoader>,
    encoder: Arc<dyn FaceEncoder>,
}

impl RebuildGalleryUseCase {
    pub fn new(loader: Arc<dyn ImageLoader>, encoder: Arc<dyn FaceEncoder>) -> Self {
        Self { loader, encoder }
    }

    pub fn execute(&self, identities: &[ReferenceIdentity]) -> (Gallery, RebuildSummary) {
        let mut gallery = Gallery::new();
        let mut summary = RebuildSummary::default();
        let mut dimension: Option<usize> = None;

        for identity in identities {
            if identity.unreadable {
                summary.failed_images += 1;
            }
            let mut embeddings = Vec::with_capacity(identity.images.len());
            for path in &identity.images {
                match self.encode_reference(path) {
                    ImageContribution::Embedding(embedding) => {
                        let expected = *dimension.get_or_insert(embedding.dimension());
                        if embedding.dimension() != expected {
                            log::warn!(
                                "Skipping {}: embedding dimension {} differs from gallery dimension {expected}",
                                path.display(),
                                embedding.dimension()
                            );
                            summary.failed_images += 1;
                            continue;
                        }
                        embeddings.push(embedding);
                    }
                    ImageContribution::NoFace => summary.skipped_images += 1,
                    ImageContribution::Failed => summary.failed_images += 1,
                }
            }

            if embeddings.is_empty() {
                log::info!("Identity '{}' has no usable reference images", identity.name);
                continue;
            }
            log::debug!(
                "Identity '{}': {} reference embedding(s)",
                identity.name,
                embeddings.len()
            );
            gallery.insert(identity.name.clone(), embeddings);
        }

        summary.identity_count = gallery.identity_count();
        summary.vector_count = gallery.vector_count();
        (gallery, summary)
    }

    fn encode_reference(&self, path: &Path) -> ImageContribution {
        let frame = match self.loader.load(path) {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("Skipping {}: {e}", path.display());
                return ImageContribution::Failed;
            }
        };
        let faces = match self.encoder.detect_and_encode(&frame.to_rgb()) {
            Ok(faces) => faces,
            Err(e) => {
                log::warn!("Skipping {}: face extraction failed: {e}", path.display());
                return ImageContribution::Failed;
            }
        };

        let face_count = faces.len();
        match faces.into_iter().next() {
            Some(face) => {
                if face_count > 1 {
                    log::debug!(
                        "{}: {face_count} faces detected, using the first",
                        path.display()
                    );
                }
                ImageContribution::Embedding(face.embedding)
            }
            None => {
                log::debug!("{}: no face detected", path.display());
                ImageContribution::NoFace
            }
        }
    }
}
