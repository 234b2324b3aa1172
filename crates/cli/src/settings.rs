use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use facegallery_core::shared::constants::{DEFAULT_TOLERANCE, GALLERY_FILE_NAME};

const APP_DIR: &str = "FaceGallery";

/// Defaults read from `<config dir>/FaceGallery/settings.json`.
///
/// Every field may be omitted from the file; command-line flags override
/// whatever is loaded here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub corpus_dir: PathBuf,
    pub gallery_path: PathBuf,
    pub tolerance: f64,
    /// Extractor program followed by its arguments.
    pub extractor: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);
        Self {
            corpus_dir: data_dir.join("known_faces"),
            gallery_path: data_dir.join(GALLERY_FILE_NAME),
            tolerance: DEFAULT_TOLERANCE,
            extractor: Vec::new(),
        }
    }
}

impl Settings {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("settings.json"))
    }

    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    pub fn load_from(path: &Path) -> Self {
        let Ok(json) = fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&json) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Ignoring unreadable settings {}: {e}", path.display());
                Self::default()
            }
        }
    }
}
