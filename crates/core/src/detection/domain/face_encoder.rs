use crate::shared::embedding::Embedding;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Error raised by an extractor; opaque to the gallery engine.
pub type EncodeError = Box<dyn std::error::Error + Send + Sync>;

/// One face found by the extractor.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectedFace {
    pub region: Region,
    pub embedding: Embedding,
}

/// Domain interface for the external face detection and embedding extractor.
///
/// Receives RGB frames and returns faces in detection order. Shared between
/// concurrent recognitions, hence `&self` and `Sync`.
pub trait FaceEncoder: Send + Sync {
    fn detect_and_encode(&self, frame: &Frame) -> Result<Vec<DetectedFace>, EncodeError>;
}
