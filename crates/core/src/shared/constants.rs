/// Default match tolerance: lower is stricter.
pub const DEFAULT_TOLERANCE: f64 = 0.5;

/// Label reported for faces that match no gallery identity.
pub const UNKNOWN_IDENTITY: &str = "Unknown";

pub const GALLERY_FILE_NAME: &str = "gallery.json";
pub const GALLERY_FORMAT_VERSION: u32 = 1;

/// Extensions recognized for legacy single-file identities in the corpus root.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
