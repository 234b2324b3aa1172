use std::sync::Arc;

use thiserror::Error;

use crate::corpus::domain::image_loader::LoadError;
use crate::detection::domain::face_encoder::{EncodeError, FaceEncoder};
use crate::matching::domain::candidate_set::CandidateSet;
use crate::matching::domain::match_result::{MatchOutcome, MatchResult};
use crate::matching::domain::matcher::Matcher;
use crate::pipeline::recognition_outcome::{FaceRecognition, RecognitionOutcome};
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum RecognitionError {
    #[error("face extraction failed: {0}")]
    Extraction(#[source] EncodeError),
    #[error("failed to load image {path}: {source}")]
    ImageLoad {
        path: std::path::PathBuf,
        #[source]
        source: LoadError,
    },
}

/// Single-image recognition: normalize → extract → match each face.
///
/// Read-only with respect to the gallery; safe to run concurrently.
pub struct RecognizeFacesUseCase {
    encoder: Arc<dyn FaceEncoder>,
    matcher: Matcher,
}

impl RecognizeFacesUseCase {
    pub fn new(encoder: Arc<dyn FaceEncoder>, matcher: Matcher) -> Self {
        Self { encoder, matcher }
    }

    pub fn execute(
        &self,
        frame: &Frame,
        candidates: &CandidateSet,
    ) -> Result<RecognitionOutcome, RecognitionError> {
        if candidates.is_empty() {
            return Ok(RecognitionOutcome::NoEncodings);
        }

        let rgb = frame.to_rgb();
        let faces = self
            .encoder
            .detect_and_encode(&rgb)
            .map_err(RecognitionError::Extraction)?;
        if faces.is_empty() {
            return Ok(RecognitionOutcome::NoFaces);
        }

        let results = faces
            .into_iter()
            .enumerate()
            .map(|(face_index, face)| {
                let result = match self.matcher.find(&face.embedding, candidates) {
                    MatchOutcome::Matched(result) => result,
                    // Unreachable with a non-empty candidate set.
                    MatchOutcome::NoEncodings => MatchResult::Unknown,
                };
                FaceRecognition {
                    face_index,
                    region: face.region,
                    result,
                }
            })
            .collect::<Vec<_>>();

        log::debug!(
            "Frame {}: {} face(s), {} recognized",
            frame.index(),
            results.len(),
            results.iter().filter(|r| r.result.is_known()).count()
        );
        Ok(RecognitionOutcome::Ok { results })
    }
}
