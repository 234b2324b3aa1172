use crate::matching::domain::candidate_set::CandidateSet;
use crate::matching::domain::distance::euclidean_distance;
use crate::matching::domain::match_result::{MatchOutcome, MatchResult};
use crate::shared::constants::DEFAULT_TOLERANCE;
use crate::shared::embedding::Embedding;

/// Nearest-neighbor identity matcher.
///
/// A candidate matches when its distance to the query is strictly below
/// `tolerance`; among matches the smallest distance wins, and an exact tie
/// goes to the earlier candidate. Candidates whose dimension differs from
/// the query are skipped with a warning instead of failing the whole scan.
#[derive(Clone, Copy, Debug)]
pub struct Matcher {
    tolerance: f64,
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

impl Matcher {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn find(&self, query: &Embedding, candidates: &CandidateSet) -> MatchOutcome {
        if candidates.is_empty() {
            return MatchOutcome::NoEncodings;
        }

        let mut best: Option<(&str, f64)> = None;
        for (name, distance) in self.distances(query, candidates) {
            if distance < self.tolerance && best.map_or(true, |(_, d)| distance < d) {
                best = Some((name, distance));
            }
        }

        MatchOutcome::Matched(match best {
            Some((name, distance)) => MatchResult::Known {
                identity: name.to_string(),
                distance,
            },
            None => MatchResult::Unknown,
        })
    }

    /// Every candidate within tolerance, in candidate order.
    pub fn matches_within<'a>(
        &self,
        query: &Embedding,
        candidates: &'a CandidateSet,
    ) -> Vec<(&'a str, f64)> {
        self.distances(query, candidates)
            .filter(|(_, distance)| *distance < self.tolerance)
            .collect()
    }

    fn distances<'a, 'q>(
        &self,
        query: &'q Embedding,
        candidates: &'a CandidateSet,
    ) -> impl Iterator<Item = (&'a str, f64)> + 'q
    where
        'a: 'q,
    {
        candidates
            .iter()
            .enumerate()
            .filter_map(move |(idx, (name, embedding))| {
                match euclidean_distance(query, embedding) {
                    Ok(distance) => Some((name, distance)),
                    Err(e) => {
                        log::warn!("Skipping gallery candidate #{idx} ({name}): {e}");
                        None
                    }
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gallery::domain::gallery::Gallery;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn emb(values: &[f32]) -> Embedding {
        Embedding::from(values.to_vec())
    }

    fn candidates(entries: Vec<(&str, Vec<Vec<f32>>)>) -> CandidateSet {
        let mut gallery = Gallery::new();
        for (name, vectors) in entries {
            gallery.insert(name.to_string(), vectors.into_iter().map(Embedding::from).collect());
        }
        CandidateSet::from(&gallery)
    }

    fn known(outcome: MatchOutcome) -> (String, f64) {
        match outcome {
            MatchOutcome::Matched(MatchResult::Known { identity, distance }) => (identity, distance),
            other => panic!("expected a known match, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_gallery_reports_no_encodings() {
        let outcome = Matcher::default().find(&emb(&[0.0, 0.0]), &CandidateSet::default());
        assert_eq!(outcome, MatchOutcome::NoEncodings);
    }

    #[test]
    fn test_identical_vector_matches_with_zero_distance() {
        let set = candidates(vec![("alice", vec![vec![0.1, 0.2, 0.3]])]);

        let (identity, distance) = known(Matcher::new(0.5).find(&emb(&[0.1, 0.2, 0.3]), &set));

        assert_eq!(identity, "alice");
        assert_eq!(distance, 0.0);
    }

    #[test]
    fn test_distant_vector_is_unknown() {
        let set = candidates(vec![("alice", vec![vec![0.0, 0.0]])]);

        let outcome = Matcher::new(0.5).find(&emb(&[0.9, 0.0]), &set);

        assert_eq!(outcome, MatchOutcome::Matched(MatchResult::Unknown));
    }

    #[test]
    fn test_distance_equal_to_tolerance_is_not_a_match() {
        let set = candidates(vec![("alice", vec![vec![0.0]])]);

        let outcome = Matcher::new(0.5).find(&emb(&[0.5]), &set);

        assert_eq!(outcome, MatchOutcome::Matched(MatchResult::Unknown));
    }

    #[test]
    fn test_global_minimum_wins_over_first_match() {
        // Both within tolerance; bob is listed after alice but closer.
        let set = candidates(vec![("alice", vec![vec![0.4]]), ("bob", vec![vec![0.1]])]);

        let (identity, distance) = known(Matcher::new(0.5).find(&emb(&[0.0]), &set));

        assert_eq!(identity, "bob");
        assert_relative_eq!(distance, 0.1, epsilon = 1e-6);
    }

    #[test]
    fn test_best_reference_of_multi_vector_identity_counts() {
        let set = candidates(vec![("alice", vec![vec![0.9], vec![0.05]]), ("bob", vec![vec![0.2]])]);

        let (identity, _) = known(Matcher::new(0.5).find(&emb(&[0.0]), &set));

        assert_eq!(identity, "alice");
    }

    #[test]
    fn test_exact_tie_goes_to_first_candidate() {
        let set = candidates(vec![("alice", vec![vec![0.2]]), ("bob", vec![vec![-0.2]])]);

        let (identity, _) = known(Matcher::new(0.5).find(&emb(&[0.0]), &set));

        assert_eq!(identity, "alice");
    }

    #[test]
    fn test_mismatched_candidate_is_skipped() {
        let set = candidates(vec![("alice", vec![vec![0.0, 0.0, 0.0]]), ("bob", vec![vec![0.1, 0.0]])]);

        let (identity, _) = known(Matcher::new(0.5).find(&emb(&[0.0, 0.0]), &set));

        assert_eq!(identity, "bob");
    }

    #[test]
    fn test_all_candidates_mismatched_is_unknown() {
        let set = candidates(vec![("alice", vec![vec![0.0, 0.0, 0.0]])]);

        let outcome = Matcher::new(0.5).find(&emb(&[0.0, 0.0]), &set);

        assert_eq!(outcome, MatchOutcome::Matched(MatchResult::Unknown));
    }

    #[test]
    fn test_matches_within_lists_all_in_order() {
        let set = candidates(vec![("alice", vec![vec![0.3], vec![0.9]]), ("bob", vec![vec![0.1]])]);

        let matches = Matcher::new(0.5).matches_within(&emb(&[0.0]), &set);

        let names: Vec<&str> = matches.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["alice", "bob"]);
    }

    #[rstest]
    #[case(0.1, 0.3)]
    #[case(0.25, 0.6)]
    #[case(0.0, 1.0)]
    #[case(0.5, 0.5000001)]
    fn test_larger_tolerance_matches_superset(#[case] t1: f64, #[case] t2: f64) {
        let set = candidates(vec![
            ("alice", vec![vec![0.05, 0.0], vec![0.3, 0.1]]),
            ("bob", vec![vec![0.0, 0.5]]),
            ("carol", vec![vec![0.2, 0.2]]),
            ("dave", vec![vec![0.9, 0.9]]),
        ]);
        let query = emb(&[0.0, 0.0]);

        let strict = Matcher::new(t1).matches_within(&query, &set);
        let loose = Matcher::new(t2).matches_within(&query, &set);

        for m in &strict {
            assert!(loose.contains(m), "{m:?} missing at tolerance {t2}");
        }
        assert!(loose.len() >= strict.len());
    }
}
