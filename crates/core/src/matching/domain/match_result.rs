use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::shared::constants::UNKNOWN_IDENTITY;

/// Classification of one query face.
#[derive(Clone, Debug, PartialEq)]
pub enum MatchResult {
    Known { identity: String, distance: f64 },
    Unknown,
}

impl MatchResult {
    /// Identity label, `"Unknown"` when nothing matched.
    pub fn identity(&self) -> &str {
        match self {
            MatchResult::Known { identity, .. } => identity,
            MatchResult::Unknown => UNKNOWN_IDENTITY,
        }
    }

    pub fn distance(&self) -> Option<f64> {
        match self {
            MatchResult::Known { distance, .. } => Some(*distance),
            MatchResult::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, MatchResult::Known { .. })
    }
}

// Flat `{"name": ..., "distance": ...}` so results read the same for known
// and unknown faces.
impl Serialize for MatchResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("MatchResult", 2)?;
        state.serialize_field("name", self.identity())?;
        state.serialize_field("distance", &self.distance())?;
        state.end()
    }
}

/// Outcome of matching one query against a gallery.
#[derive(Clone, Debug, PartialEq)]
pub enum MatchOutcome {
    /// The gallery holds no embeddings, so nothing was compared.
    NoEncodings,
    Matched(MatchResult),
}
