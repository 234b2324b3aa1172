use std::path::Path;

use crate::corpus::domain::image_loader::{ImageLoader, LoadError};
use crate::shared::frame::Frame;

/// Decodes image files with the `image` crate into 3-channel RGB frames.
///
/// Grayscale, alpha and 16-bit inputs are all flattened to 8-bit RGB so the
/// extractor sees a single pixel format.
#[derive(Default)]
pub struct ImageFileLoader;

impl ImageFileLoader {
    pub fn new() -> Self {
        Self
    }
}

impl ImageLoader for ImageFileLoader {
    fn load(&self, path: &Path) -> Result<Frame, LoadError> {
        let decoded = image::open(path)
            .map_err(|e| format!("failed to decode {}: {e}", path.display()))?;
        let rgb = decoded.into_rgb8();
        let (width, height) = rgb.dimensions();
        Ok(Frame::new(rgb.into_raw(), width, height, 3, 0))
    }
}
