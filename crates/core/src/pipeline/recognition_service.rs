use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};

use crate::corpus::domain::image_loader::ImageLoader;
use crate::corpus::domain::reference_corpus::ReferenceCorpus;
use crate::detection::domain::face_encoder::FaceEncoder;
use crate::gallery::domain::gallery::Gallery;
use crate::gallery::domain::gallery_store::GalleryStore;
use crate::matching::domain::candidate_set::CandidateSet;
use crate::matching::domain::matcher::Matcher;
use crate::pipeline::gallery_lifecycle::{GalleryLifecycleManager, IdentityChange, LifecycleError};
use crate::pipeline::rebuild_gallery_use_case::RebuildSummary;
use crate::pipeline::recognition_outcome::RecognitionOutcome;
use crate::pipeline::recognize_faces_use_case::{RecognitionError, RecognizeFacesUseCase};
use crate::shared::frame::Frame;

/// An immutable view of the gallery together with its flattened candidates.
pub struct GallerySnapshot {
    gallery: Gallery,
    candidates: CandidateSet,
}

impl GallerySnapshot {
    fn new(gallery: Gallery) -> Self {
        let candidates = CandidateSet::from(&gallery);
        Self {
            gallery,
            candidates,
        }
    }

    pub fn gallery(&self) -> &Gallery {
        &self.gallery
    }

    pub fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }
}

/// Shared entry point for recognition and gallery maintenance.
///
/// Recognitions read the current snapshot and never block on each other.
/// Mutations are serialized; each one publishes a new snapshot only after
/// the rebuilt gallery has been persisted, so a recognition sees either the
/// old gallery or the new one in full.
pub struct FaceRecognitionService {
    snapshot: RwLock<Arc<GallerySnapshot>>,
    lifecycle: Mutex<GalleryLifecycleManager>,
    recognizer: RecognizeFacesUseCase,
    loader: Arc<dyn ImageLoader>,
}

/// What [`FaceRecognitionService::open_with`] does when no gallery has been
/// persisted yet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Bootstrap {
    /// Train from the reference corpus and persist the result.
    #[default]
    IfMissing,
    /// Start from an empty gallery; the caller retrains or mutates next.
    Skip,
}

impl FaceRecognitionService {
    /// Loads the persisted gallery, training it from the corpus if none
    /// has been saved yet.
    pub fn open(
        store: Box<dyn GalleryStore>,
        corpus: Box<dyn ReferenceCorpus>,
        loader: Arc<dyn ImageLoader>,
        encoder: Arc<dyn FaceEncoder>,
        matcher: Matcher,
    ) -> Result<Self, LifecycleError> {
        Self::open_with(store, corpus, loader, encoder, matcher, Bootstrap::IfMissing)
    }

    pub fn open_with(
        store: Box<dyn GalleryStore>,
        corpus: Box<dyn ReferenceCorpus>,
        loader: Arc<dyn ImageLoader>,
        encoder: Arc<dyn FaceEncoder>,
        matcher: Matcher,
        bootstrap: Bootstrap,
    ) -> Result<Self, LifecycleError> {
        let lifecycle = GalleryLifecycleManager::new(store, corpus, loader.clone(), encoder.clone());
        let gallery = match bootstrap {
            Bootstrap::IfMissing => lifecycle.load_or_bootstrap()?,
            Bootstrap::Skip => lifecycle.load()?,
        };
        log::info!(
            "Gallery ready: {} identities, {} encodings",
            gallery.identity_count(),
            gallery.vector_count()
        );
        Ok(Self {
            snapshot: RwLock::new(Arc::new(GallerySnapshot::new(gallery))),
            lifecycle: Mutex::new(lifecycle),
            recognizer: RecognizeFacesUseCase::new(encoder, matcher),
            loader,
        })
    }

    pub fn snapshot(&self) -> Arc<GallerySnapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Recognizes every face in an already decoded image.
    pub fn recognize_image(&self, image: &Frame) -> Result<RecognitionOutcome, RecognitionError> {
        let snapshot = self.snapshot();
        self.recognizer.execute(image, snapshot.candidates())
    }

    /// Same as [`recognize_image`](Self::recognize_image) for a camera
    /// frame; BGR frames are normalized by their channel order.
    pub fn recognize_frame(&self, frame: &Frame) -> Result<RecognitionOutcome, RecognitionError> {
        self.recognize_image(frame)
    }

    pub fn recognize_image_file(&self, path: &Path) -> Result<RecognitionOutcome, RecognitionError> {
        let frame = self
            .loader
            .load(path)
            .map_err(|source| RecognitionError::ImageLoad {
                path: path.to_path_buf(),
                source,
            })?;
        self.recognize_image(&frame)
    }

    pub fn rebuild_all(&self) -> Result<RebuildSummary, LifecycleError> {
        let lifecycle = self.lock_lifecycle();
        let (gallery, summary) = lifecycle.rebuild_all()?;
        self.publish(gallery);
        Ok(summary)
    }

    pub fn add_identity(&self, name: &str, image: &Path) -> Result<IdentityChange, LifecycleError> {
        let lifecycle = self.lock_lifecycle();
        let (gallery, change) = lifecycle.add_identity(name, image)?;
        self.publish(gallery);
        Ok(change)
    }

    pub fn remove_identity(&self, name: &str) -> Result<IdentityChange, LifecycleError> {
        let lifecycle = self.lock_lifecycle();
        let (gallery, change) = lifecycle.remove_identity(name)?;
        self.publish(gallery);
        Ok(change)
    }

    pub fn remove_by_prefix(&self, prefix: &str) -> Result<IdentityChange, LifecycleError> {
        let lifecycle = self.lock_lifecycle();
        let (gallery, change) = lifecycle.remove_by_prefix(prefix)?;
        self.publish(gallery);
        Ok(change)
    }

    /// Identities present in the reference corpus.
    pub fn identities(&self) -> Result<Vec<String>, LifecycleError> {
        self.lock_lifecycle().identities()
    }

    fn lock_lifecycle(&self) -> std::sync::MutexGuard<'_, GalleryLifecycleManager> {
        self.lifecycle.lock().unwrap_or_else(|e| e.into_inner())
    }

    // Called with the lifecycle lock held.
    fn publish(&self, gallery: Gallery) {
        let next = Arc::new(GallerySnapshot::new(gallery));
        *self.snapshot.write().unwrap_or_else(|e| e.into_inner()) = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::infrastructure::directory_corpus::DirectoryCorpus;
    use crate::gallery::infrastructure::json_gallery_store::JsonGalleryStore;
    use crate::matching::domain::match_result::MatchResult;
    use crate::pipeline::test_support::{
        scripted_frame, write_reference, ScriptedEncoder, TextImageLoader,
    };
    use approx::assert_relative_eq;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn open(dir: &TempDir) -> FaceRecognitionService {
        FaceRecognitionService::open(
            Box::new(JsonGalleryStore::new(dir.path().join("gallery.json"))),
            Box::new(DirectoryCorpus::new(dir.path().join("faces"))),
            Arc::new(TextImageLoader),
            Arc::new(ScriptedEncoder),
            Matcher::default(),
        )
        .unwrap()
    }

    fn faces(dir: &TempDir) -> PathBuf {
        dir.path().join("faces")
    }

    #[test]
    fn test_empty_service_reports_no_encodings() {
        let dir = tempfile::tempdir().unwrap();
        let service = open(&dir);

        let outcome = service.recognize_image(&scripted_frame("0.1,0.1")).unwrap();

        assert_eq!(outcome, RecognitionOutcome::NoEncodings);
        assert!(dir.path().join("gallery.json").exists());
    }

    #[test]
    fn test_add_recognize_remove_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let service = open(&dir);
        let upload = write_reference(dir.path(), "uploads/alice.jpg", "0.1,0.1");

        service.add_identity("alice", &upload).unwrap();
        let outcome = service.recognize_image(&scripted_frame("0.1,0.1")).unwrap();
        let result = &outcome.results()[0].result;
        assert_eq!(result.identity(), "alice");
        assert_relative_eq!(result.distance().unwrap(), 0.0);

        service.remove_identity("alice").unwrap();
        let outcome = service.recognize_image(&scripted_frame("0.1,0.1")).unwrap();
        assert_eq!(outcome, RecognitionOutcome::NoEncodings);
    }

    #[test]
    fn test_unknown_face_against_known_gallery() {
        let dir = tempfile::tempdir().unwrap();
        write_reference(&faces(&dir), "alice/1.jpg", "0.0,0.0");
        let service = open(&dir);

        let outcome = service
            .recognize_frame(&scripted_frame("0.0,0.0;0.9,0.0"))
            .unwrap();

        let results = outcome.results();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].result.identity(), "alice");
        assert_eq!(results[1].result, MatchResult::Unknown);
    }

    #[test]
    fn test_recognize_image_file() {
        let dir = tempfile::tempdir().unwrap();
        write_reference(&faces(&dir), "alice/1.jpg", "0.0,0.0");
        let service = open(&dir);
        let query = write_reference(dir.path(), "query.jpg", "none");

        let outcome = service.recognize_image_file(&query).unwrap();
        assert_eq!(outcome, RecognitionOutcome::NoFaces);

        let err = service
            .recognize_image_file(&dir.path().join("missing.jpg"))
            .unwrap_err();
        assert!(matches!(err, RecognitionError::ImageLoad { .. }));
    }

    #[test]
    fn test_reopen_uses_persisted_gallery() {
        let dir = tempfile::tempdir().unwrap();
        write_reference(&faces(&dir), "alice/1.jpg", "0.0,0.0");
        drop(open(&dir));
        std::fs::remove_dir_all(faces(&dir)).unwrap();

        let service = open(&dir);

        assert!(service.snapshot().gallery().contains("alice"));
        assert!(service.identities().unwrap().is_empty());
    }

    #[test]
    fn test_open_without_bootstrap_does_not_train() {
        let dir = tempfile::tempdir().unwrap();
        write_reference(&faces(&dir), "alice/1.jpg", "0.0,0.0");

        let service = FaceRecognitionService::open_with(
            Box::new(JsonGalleryStore::new(dir.path().join("gallery.json"))),
            Box::new(DirectoryCorpus::new(faces(&dir))),
            Arc::new(TextImageLoader),
            Arc::new(ScriptedEncoder),
            Matcher::default(),
            Bootstrap::Skip,
        )
        .unwrap();

        assert!(service.snapshot().gallery().is_empty());
        assert!(!dir.path().join("gallery.json").exists());
        assert_eq!(service.identities().unwrap(), vec!["alice"]);

        service.rebuild_all().unwrap();
        assert!(service.snapshot().gallery().contains("alice"));
    }

    #[test]
    fn test_rebuild_all_publishes_new_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let service = open(&dir);
        let before = service.snapshot();
        write_reference(&faces(&dir), "bob/1.jpg", "0.5,0.5");

        let summary = service.rebuild_all().unwrap();

        assert_eq!(summary.identity_count, 1);
        assert!(before.gallery().is_empty());
        assert!(service.snapshot().gallery().contains("bob"));
        assert_eq!(service.snapshot().candidates().len(), 1);
    }

    #[test]
    fn test_failed_mutation_keeps_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        write_reference(&faces(&dir), "alice/1.jpg", "0.0,0.0");
        let service = open(&dir);
        let blank = write_reference(dir.path(), "uploads/blank.jpg", "none");

        assert!(service.add_identity("bob", &blank).is_err());
        assert!(service.remove_identity("carol").is_err());

        assert_eq!(
            service.snapshot().gallery().names().collect::<Vec<_>>(),
            vec!["alice"]
        );
    }

    #[test]
    fn test_concurrent_recognitions_and_mutations() {
        let dir = tempfile::tempdir().unwrap();
        write_reference(&faces(&dir), "alice/1.jpg", "0.0,0.0");
        let service = open(&dir);
        let uploads: Vec<PathBuf> = (0..4)
            .map(|i| write_reference(dir.path(), &format!("uploads/{i}.jpg"), "3.0,3.0"))
            .collect();

        std::thread::scope(|scope| {
            for (i, upload) in uploads.iter().enumerate() {
                let service = &service;
                scope.spawn(move || {
                    service.add_identity(&format!("person{i}"), upload).unwrap();
                });
            }
            for _ in 0..4 {
                let service = &service;
                scope.spawn(move || {
                    for _ in 0..10 {
                        let outcome = service.recognize_image(&scripted_frame("0.0,0.0")).unwrap();
                        assert_eq!(outcome.results()[0].result.identity(), "alice");
                    }
                });
            }
        });

        let names = service.identities().unwrap();
        assert_eq!(names.len(), 5);
        assert_eq!(service.snapshot().gallery().identity_count(), 5);
        let persisted = JsonGalleryStore::new(dir.path().join("gallery.json"))
            .load()
            .unwrap();
        assert_eq!(&persisted, service.snapshot().gallery());
    }
}
