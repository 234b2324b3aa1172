//! Stub loader and extractor shared by the pipeline tests.
//!
//! Reference "images" are small text files. The loader hands their bytes to
//! the extractor unchanged, and the extractor interprets them:
//!
//! - `none` → no face detected
//! - `fail` → extraction error
//! - `0.1,0.2;0.3,0.4` → two faces with those embeddings

use std::fs;
use std::path::{Path, PathBuf};

use crate::corpus::domain::image_loader::{ImageLoader, LoadError};
use crate::detection::domain::face_encoder::{DetectedFace, EncodeError, FaceEncoder};
use crate::shared::embedding::Embedding;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

pub struct TextImageLoader;

impl ImageLoader for TextImageLoader {
    fn load(&self, path: &Path) -> Result<Frame, LoadError> {
        let bytes = fs::read(path)?;
        let width = bytes.len() as u32;
        Ok(Frame::new(bytes, width, 1, 1, 0))
    }
}

pub struct ScriptedEncoder;

impl FaceEncoder for ScriptedEncoder {
    fn detect_and_encode(&self, frame: &Frame) -> Result<Vec<DetectedFace>, EncodeError> {
        let script = std::str::from_utf8(frame.data())?.trim();
        match script {
            "none" => Ok(Vec::new()),
            "fail" => Err("scripted extractor failure".into()),
            faces => faces
                .split(';')
                .enumerate()
                .map(|(i, values)| -> Result<DetectedFace, EncodeError> {
                    let embedding = values
                        .split(',')
                        .map(|v| v.trim().parse::<f32>())
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(DetectedFace {
                        region: Region::new(i as i32 * 10, 0, 10, 10),
                        embedding: Embedding::new(embedding),
                    })
                })
                .collect(),
        }
    }
}

/// A frame whose bytes script the extractor, for direct recognition calls.
pub fn scripted_frame(script: &str) -> Frame {
    let bytes = script.as_bytes().to_vec();
    let width = bytes.len() as u32;
    Frame::new(bytes, width, 1, 1, 0)
}

/// Writes a scripted reference image at `root/relative`.
pub fn write_reference(root: &Path, relative: &str, script: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, script).unwrap();
    path
}
