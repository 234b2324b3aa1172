use std::path::Path;

use crate::shared::frame::Frame;

/// Error raised while decoding an image file.
pub type LoadError = Box<dyn std::error::Error + Send + Sync>;

/// Decodes image files into RGB frames.
pub trait ImageLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Frame, LoadError>;
}
