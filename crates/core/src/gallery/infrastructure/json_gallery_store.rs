use std::collections::BTreeMap;
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::gallery::domain::gallery::Gallery;
use crate::gallery::domain::gallery_store::{GalleryStore, StoreError};
use crate::shared::constants::GALLERY_FORMAT_VERSION;
use crate::shared::embedding::Embedding;

#[derive(Serialize, Deserialize)]
struct GalleryFile {
    version: u32,
    identities: BTreeMap<String, Vec<Embedding>>,
}

/// Stores the gallery as a single JSON document.
///
/// Saves go to a temporary file in the target directory which is synced and
/// then renamed over the previous file.
pub struct JsonGalleryStore {
    path: PathBuf,
}

impl JsonGalleryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> &Path {
        self.path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    fn write_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl GalleryStore for JsonGalleryStore {
    fn load(&self) -> Result<Gallery, StoreError> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Gallery::new()),
            Err(e) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };

        let parsed: GalleryFile =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| StoreError::Malformed {
                path: self.path.clone(),
                source: e,
            })?;
        if parsed.version != GALLERY_FORMAT_VERSION {
            return Err(StoreError::UnsupportedVersion {
                path: self.path.clone(),
                version: parsed.version,
            });
        }

        let gallery = Gallery::from_entries(parsed.identities);
        log::debug!(
            "Loaded gallery from {}: {} identities, {} vectors",
            self.path.display(),
            gallery.identity_count(),
            gallery.vector_count()
        );
        Ok(gallery)
    }

    fn save(&self, gallery: &Gallery) -> Result<(), StoreError> {
        let dir = self.parent_dir();
        fs::create_dir_all(dir).map_err(|e| self.write_err(e))?;

        let document = GalleryFile {
            version: GALLERY_FORMAT_VERSION,
            identities: gallery.clone().into_entries(),
        };

        let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(|e| self.write_err(e))?;
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            serde_json::to_writer(&mut writer, &document).map_err(|e| {
                self.write_err(std::io::Error::new(std::io::ErrorKind::Other, e))
            })?;
            writer.flush().map_err(|e| self.write_err(e))?;
        }
        temp.as_file().sync_all().map_err(|e| self.write_err(e))?;
        temp.persist(&self.path)
            .map_err(|e| self.write_err(e.error))?;

        log::debug!(
            "Saved gallery to {}: {} identities, {} vectors",
            self.path.display(),
            gallery.identity_count(),
            gallery.vector_count()
        );
        Ok(())
    }

    fn is_persisted(&self) -> bool {
        self.path.is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emb(values: &[f32]) -> Embedding {
        Embedding::from(values.to_vec())
    }

    fn sample_gallery() -> Gallery {
        let mut gallery = Gallery::new();
        gallery.insert("alice".into(), vec![emb(&[0.1, 0.2, 0.3]), emb(&[0.4, 0.5, 0.6])]);
        gallery.insert("bob".into(), vec![emb(&[-1.0, 0.0, 1.0 / 3.0])]);
        gallery
    }

    #[test]
    fn test_load_missing_file_returns_empty_gallery() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonGalleryStore::new(dir.path().join("gallery.json"));

        assert!(!store.is_persisted());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonGalleryStore::new(dir.path().join("gallery.json"));
        let gallery = sample_gallery();

        store.save(&gallery).unwrap();

        assert!(store.is_persisted());
        assert_eq!(store.load().unwrap(), gallery);
    }

    #[test]
    fn test_resave_of_loaded_gallery_is_identical() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonGalleryStore::new(dir.path().join("gallery.json"));
        store.save(&sample_gallery()).unwrap();
        let first_bytes = fs::read(store.path()).unwrap();

        let loaded = store.load().unwrap();
        store.save(&loaded).unwrap();

        assert_eq!(fs::read(store.path()).unwrap(), first_bytes);
        assert_eq!(store.load().unwrap(), loaded);
    }

    #[test]
    fn test_save_replaces_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonGalleryStore::new(dir.path().join("gallery.json"));
        store.save(&sample_gallery()).unwrap();

        let mut smaller = Gallery::new();
        smaller.insert("carol".into(), vec![emb(&[1.0, 1.0, 1.0])]);
        store.save(&smaller).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.names().collect::<Vec<_>>(), vec!["carol"]);
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonGalleryStore::new(dir.path().join("nested/deeper/gallery.json"));

        store.save(&sample_gallery()).unwrap();

        assert!(store.is_persisted());
    }

    #[test]
    fn test_save_leaves_no_temporary_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonGalleryStore::new(dir.path().join("gallery.json"));

        store.save(&sample_gallery()).unwrap();
        store.save(&Gallery::new()).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_empty_gallery_persists_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonGalleryStore::new(dir.path().join("gallery.json"));

        store.save(&Gallery::new()).unwrap();

        assert!(store.is_persisted());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_load_drops_empty_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gallery.json");
        fs::write(
            &path,
            r#"{"version":1,"identities":{"alice":[[1.0,2.0]],"ghost":[]}}"#,
        )
        .unwrap();

        let gallery = JsonGalleryStore::new(&path).load().unwrap();

        assert_eq!(gallery.names().collect::<Vec<_>>(), vec!["alice"]);
    }

    #[test]
    fn test_load_malformed_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gallery.json");
        fs::write(&path, b"{not json").unwrap();

        let err = JsonGalleryStore::new(&path).load().unwrap_err();

        assert!(matches!(err, StoreError::Malformed { .. }));
    }

    #[test]
    fn test_load_unknown_version_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gallery.json");
        fs::write(&path, r#"{"version":99,"identities":{}}"#).unwrap();

        let err = JsonGalleryStore::new(&path).load().unwrap_err();

        assert!(matches!(
            err,
            StoreError::UnsupportedVersion { version: 99, .. }
        ));
    }

    #[test]
    fn test_relative_path_without_parent() {
        let store = JsonGalleryStore::new("gallery.json");
        assert_eq!(store.parent_dir(), Path::new("."));
    }
}
