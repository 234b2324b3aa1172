use std::collections::BTreeMap;

use crate::shared::embedding::Embedding;

/// Mapping from identity name to its reference embeddings.
///
/// Iteration follows name order, which fixes candidate order (and therefore
/// tie-breaks) independently of how the gallery was assembled. An identity
/// is only ever stored with at least one embedding.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Gallery {
    identities: BTreeMap<String, Vec<Embedding>>,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a gallery from raw entries, dropping empty ones with a warning.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<Embedding>)>,
    {
        let mut gallery = Self::new();
        for (name, embeddings) in entries {
            if !gallery.insert(name.clone(), embeddings) {
                log::warn!("Dropping gallery entry '{name}' with no embeddings");
            }
        }
        gallery
    }

    /// Stores `embeddings` under `name`, replacing any previous entry.
    ///
    /// Returns `false` and leaves the gallery unchanged when `name` or
    /// `embeddings` is empty.
    pub fn insert(&mut self, name: String, embeddings: Vec<Embedding>) -> bool {
        if name.is_empty() || embeddings.is_empty() {
            return false;
        }
        self.identities.insert(name, embeddings);
        true
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<Embedding>> {
        self.identities.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&[Embedding]> {
        self.identities.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.identities.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.identities.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Embedding])> {
        self.identities
            .iter()
            .map(|(name, embeddings)| (name.as_str(), embeddings.as_slice()))
    }

    pub fn identity_count(&self) -> usize {
        self.identities.len()
    }

    pub fn vector_count(&self) -> usize {
        self.identities.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn into_entries(self) -> BTreeMap<String, Vec<Embedding>> {
        self.identities
    }
}
