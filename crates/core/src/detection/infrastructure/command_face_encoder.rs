use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use serde::Deserialize;

use crate::detection::domain::face_encoder::{DetectedFace, EncodeError, FaceEncoder};
use crate::shared::embedding::Embedding;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

#[derive(Deserialize)]
struct ExtractorFace {
    region: Region,
    embedding: Vec<f32>,
}

/// Runs an external extractor program once per frame.
///
/// The frame is piped to the program's stdin as a PNG. The program must
/// print a JSON array to stdout:
///
/// ```json
/// [{"region": {"x": 10, "y": 20, "width": 64, "height": 64}, "embedding": [0.01, ...]}]
/// ```
///
/// A non-zero exit status is reported as an extraction failure together
/// with whatever the program wrote to stderr.
pub struct CommandFaceEncoder {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandFaceEncoder {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Builds an encoder from a command line: the first element is the
    /// program, the rest are its arguments.
    pub fn from_command_line(command: &[String]) -> Result<Self, EncodeError> {
        let (program, args) = command
            .split_first()
            .ok_or("extractor command is empty")?;
        Ok(Self::new(program, args.to_vec()))
    }
}

impl FaceEncoder for CommandFaceEncoder {
    fn detect_and_encode(&self, frame: &Frame) -> Result<Vec<DetectedFace>, EncodeError> {
        let png = encode_png(frame)?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| format!("failed to start extractor {}: {e}", self.program.display()))?;

        // Feed stdin from another thread so a chatty extractor cannot block
        // on a full stdout pipe while we are still writing.
        let mut stdin = child.stdin.take().ok_or("extractor stdin unavailable")?;
        let writer = std::thread::spawn(move || stdin.write_all(&png));

        let output = child.wait_with_output()?;
        match writer.join() {
            Ok(Ok(())) => {}
            // The extractor may stop reading once it has what it needs.
            Ok(Err(e)) if e.kind() == ErrorKind::BrokenPipe => {}
            Ok(Err(e)) => return Err(format!("failed to send frame to extractor: {e}").into()),
            Err(_) => return Err("extractor stdin writer panicked".into()),
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!(
                "extractor {} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )
            .into());
        }

        parse_faces(&output.stdout)
    }
}

fn encode_png(frame: &Frame) -> Result<Vec<u8>, EncodeError> {
    let color = match frame.channels() {
        1 => ExtendedColorType::L8,
        3 => ExtendedColorType::Rgb8,
        4 => ExtendedColorType::Rgba8,
        n => return Err(format!("unsupported channel count: {n}").into()),
    };
    let mut png = Vec::new();
    PngEncoder::new(&mut png).write_image(frame.data(), frame.width(), frame.height(), color)?;
    Ok(png)
}

fn parse_faces(stdout: &[u8]) -> Result<Vec<DetectedFace>, EncodeError> {
    let faces: Vec<ExtractorFace> = serde_json::from_slice(stdout)
        .map_err(|e| format!("malformed extractor output: {e}"))?;
    faces
        .into_iter()
        .enumerate()
        .map(|(i, face)| -> Result<DetectedFace, EncodeError> {
            if face.embedding.is_empty() {
                return Err(format!("extractor returned an empty embedding for face {i}").into());
            }
            Ok(DetectedFace {
                region: face.region,
                embedding: Embedding::new(face.embedding),
            })
        })
        .collect()
}
