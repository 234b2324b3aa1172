use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use crate::corpus::domain::reference_corpus::{CorpusError, ReferenceCorpus, ReferenceIdentity};
use crate::gallery::domain::identity_name::IdentityName;
use crate::shared::constants::IMAGE_EXTENSIONS;

const DEFAULT_EXTENSION: &str = "jpg";

/// Reference corpus laid out on disk as:
///
/// ```text
/// root/
///   alice/            one directory per identity
///     alice_1.jpg
///     alice_2.png
///   bob.jpg           legacy: a single image whose stem is the identity
/// ```
///
/// Entries are visited in file-name order; hidden files are ignored. An
/// identity directory that cannot be listed is reported as unreadable
/// instead of failing the whole listing; only the root must be readable.
pub struct DirectoryCorpus {
    root: PathBuf,
}

impl DirectoryCorpus {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn sorted_entries(&self, dir: &Path) -> Result<Vec<PathBuf>, CorpusError> {
        let read_err = |source| CorpusError::Read {
            path: dir.to_path_buf(),
            source,
        };
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir).map_err(read_err)? {
            let path = entry.map_err(read_err)?.path();
            if !is_hidden(&path) {
                entries.push(path);
            }
        }
        entries.sort();
        Ok(entries)
    }

    fn legacy_files(&self) -> Result<Vec<PathBuf>, CorpusError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        Ok(self
            .sorted_entries(&self.root)?
            .into_iter()
            .filter(|p| p.is_file() && is_image(p))
            .collect())
    }
}

impl ReferenceCorpus for DirectoryCorpus {
    fn identities(&self) -> Result<Vec<ReferenceIdentity>, CorpusError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut identities = Vec::new();
        for path in self.sorted_entries(&self.root)? {
            if path.is_dir() {
                let name = file_name(&path);
                let (images, unreadable) = match self.sorted_entries(&path) {
                    Ok(entries) => (entries.into_iter().filter(|p| p.is_file()).collect(), false),
                    Err(e) => {
                        log::warn!("Skipping reference images of '{name}': {e}");
                        (Vec::new(), true)
                    }
                };
                identities.push(ReferenceIdentity {
                    name,
                    images,
                    unreadable,
                });
            } else if is_image(&path) {
                identities.push(ReferenceIdentity {
                    name: file_stem(&path),
                    images: vec![path],
                    unreadable: false,
                });
            }
        }
        Ok(identities)
    }

    fn add_image(&self, name: &IdentityName, source: &Path) -> Result<PathBuf, CorpusError> {
        let mut input = File::open(source).map_err(|e| CorpusError::Write {
            path: source.to_path_buf(),
            source: e,
        })?;
        let person_dir = self.root.join(name.as_str());
        fs::create_dir_all(&person_dir).map_err(|e| CorpusError::Write {
            path: person_dir.clone(),
            source: e,
        })?;

        let extension = source
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or(DEFAULT_EXTENSION);
        let base = format!("{name}_{}", file_stem(source));
        let (target, mut output) = create_unique(&person_dir, &base, extension)?;
        if let Err(e) = io::copy(&mut input, &mut output).and_then(|_| output.sync_all()) {
            drop(output);
            if let Err(cleanup) = fs::remove_file(&target) {
                log::warn!("Could not remove partial copy {}: {cleanup}", target.display());
            }
            return Err(CorpusError::Write {
                path: target,
                source: e,
            });
        }
        Ok(target)
    }

    /// Removes `path`, and its identity directory when that leaves it empty.
    fn remove_image(&self, path: &Path) -> Result<(), CorpusError> {
        fs::remove_file(path).map_err(|e| CorpusError::Remove {
            path: path.to_path_buf(),
            source: e,
        })?;

        if let Some(dir) = path.parent().filter(|dir| *dir != self.root) {
            let is_empty = fs::read_dir(dir)
                .map(|mut entries| entries.next().is_none())
                .unwrap_or(false);
            if is_empty {
                fs::remove_dir(dir).map_err(|e| CorpusError::Remove {
                    path: dir.to_path_buf(),
                    source: e,
                })?;
            }
        }
        Ok(())
    }

    fn remove_identity(&self, name: &IdentityName) -> Result<Vec<PathBuf>, CorpusError> {
        let mut removed = Vec::new();

        let person_dir = self.root.join(name.as_str());
        if person_dir.is_dir() {
            fs::remove_dir_all(&person_dir).map_err(|e| CorpusError::Remove {
                path: person_dir.clone(),
                source: e,
            })?;
            removed.push(person_dir);
        }

        for path in self.legacy_files()? {
            if file_stem(&path) == name.as_str() {
                self.remove_image(&path)?;
                removed.push(path);
            }
        }
        Ok(removed)
    }

    fn remove_by_prefix(&self, prefix: &str) -> Result<Vec<PathBuf>, CorpusError> {
        let mut removed = Vec::new();
        for path in self.legacy_files()? {
            if file_name(&path).starts_with(prefix) {
                self.remove_image(&path)?;
                removed.push(path);
            }
        }
        Ok(removed)
    }
}

/// Creates `dir/base.ext`, or `dir/base_N.ext` for the first free `N`.
fn create_unique(dir: &Path, base: &str, extension: &str) -> Result<(PathBuf, File), CorpusError> {
    let mut attempt = 0u32;
    loop {
        let file_name = match attempt {
            0 => format!("{base}.{extension}"),
            n => format!("{base}_{n}.{extension}"),
        };
        let target = dir.join(file_name);
        match OpenOptions::new().write(true).create_new(true).open(&target) {
            Ok(file) => return Ok((target, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => {
                return Err(CorpusError::Write {
                    path: target,
                    source: e,
                })
            }
        }
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
