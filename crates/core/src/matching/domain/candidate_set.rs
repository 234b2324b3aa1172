use std::sync::Arc;

use crate::gallery::domain::gallery::Gallery;
use crate::shared::embedding::Embedding;

/// A gallery flattened into parallel `(name, embedding)` arrays.
///
/// An identity with five reference embeddings contributes five candidates,
/// so the nearest-neighbor scan is one flat pass in gallery order.
#[derive(Clone, Debug, Default)]
pub struct CandidateSet {
    names: Vec<Arc<str>>,
    embeddings: Vec<Embedding>,
}

impl CandidateSet {
    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Embedding)> {
        self.names
            .iter()
            .map(|name| &**name)
            .zip(self.embeddings.iter())
    }
}

impl From<&Gallery> for CandidateSet {
    fn from(gallery: &Gallery) -> Self {
        let mut names = Vec::with_capacity(gallery.vector_count());
        let mut embeddings = Vec::with_capacity(gallery.vector_count());
        for (name, refs) in gallery.iter() {
            let shared: Arc<str> = Arc::from(name);
            for embedding in refs {
                names.push(shared.clone());
                embeddings.push(embedding.clone());
            }
        }
        Self { names, embeddings }
    }
}
