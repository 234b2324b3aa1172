use serde::Serialize;

use crate::matching::domain::match_result::MatchResult;
use crate::shared::region::Region;

/// Result for one detected face, tagged with its position in detection order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FaceRecognition {
    pub face_index: usize,
    pub region: Region,
    #[serde(flatten)]
    pub result: MatchResult,
}

/// Per-image recognition result.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecognitionOutcome {
    /// The gallery is empty; nothing to compare against.
    NoEncodings,
    /// The extractor found no face in the input.
    NoFaces,
    Ok { results: Vec<FaceRecognition> },
}

impl RecognitionOutcome {
    pub fn message(&self) -> String {
        match self {
            RecognitionOutcome::NoEncodings => {
                "No known faces. Add faces and retrain.".to_string()
            }
            RecognitionOutcome::NoFaces => "No faces detected in the image.".to_string(),
            RecognitionOutcome::Ok { results } => {
                let known = results.iter().filter(|r| r.result.is_known()).count();
                format!(
                    "Recognized {known} of {} detected face(s).",
                    results.len()
                )
            }
        }
    }

    pub fn results(&self) -> &[FaceRecognition] {
        match self {
            RecognitionOutcome::Ok { results } => results,
            _ => &[],
        }
    }
}
