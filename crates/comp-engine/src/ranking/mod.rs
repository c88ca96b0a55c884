//! Top-K selection with a deterministic tie-break chain.

mod views;

pub use views::{PoolCoverage, QualityLabel, RankedComp, Ranking, RankingRow};

use crate::domain::PropertyId;
use crate::scoring::FeatureVector;
use std::cmp::Ordering;

pub const DEFAULT_TOP_K: usize = 3;

/// Composite scores closer than this are ranked by the tie-break chain.
pub const DEFAULT_TIE_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone)]
pub struct Ranker {
    top_k: usize,
    tie_epsilon: f64,
}

impl Default for Ranker {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_K)
    }
}

impl Ranker {
    pub fn new(top_k: usize) -> Self {
        Self {
            top_k,
            tie_epsilon: DEFAULT_TIE_EPSILON,
        }
    }

    pub fn with_tie_epsilon(mut self, tie_epsilon: f64) -> Self {
        self.tie_epsilon = tie_epsilon.abs();
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Rank every vector of one subject's pool and keep the best `top_k`.
    pub fn rank(&self, subject_id: &PropertyId, mut vectors: Vec<FeatureVector>) -> Ranking {
        let pool_size = vectors.len();
        self.order(&mut vectors);

        let entries = vectors
            .into_iter()
            .take(self.top_k)
            .enumerate()
            .map(|(index, vector)| RankedComp::new(index + 1, vector))
            .collect::<Vec<_>>();

        let coverage = PoolCoverage::assess(pool_size, entries.len(), self.top_k);

        Ranking {
            subject_id: subject_id.clone(),
            top_k: self.top_k,
            pool_size,
            coverage,
            entries,
        }
    }

    /// Sorts best-first. Composites within `tie_epsilon` of a group's leader
    /// form a tie group that is re-ordered by the tie-break chain. Grouping is
    /// not chained: an entry within epsilon of a member but not of the leader
    /// starts the next group.
    fn order(&self, vectors: &mut [FeatureVector]) {
        vectors.sort_by(|a, b| {
            b.composite
                .total_cmp(&a.composite)
                .then_with(|| tie_break(a, b))
        });

        let mut start = 0;
        while start < vectors.len() {
            let leader = vectors[start].composite;
            let mut end = start + 1;
            while end < vectors.len() && leader - vectors[end].composite <= self.tie_epsilon {
                end += 1;
            }
            if end - start > 1 {
                vectors[start..end].sort_by(tie_break);
            }
            start = end;
        }
    }
}

/// Physical, then location, then temporal sub-score (higher first), then the
/// smaller candidate identifier.
fn tie_break(a: &FeatureVector, b: &FeatureVector) -> Ordering {
    b.physical
        .value
        .total_cmp(&a.physical.value)
        .then_with(|| b.location.value.total_cmp(&a.location.value))
        .then_with(|| b.temporal.value.total_cmp(&a.temporal.value))
        .then_with(|| a.candidate_id.cmp(&b.candidate_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::SubScore;

    fn vector(id: &str, composite: f64, physical: f64, location: f64, temporal: f64) -> FeatureVector {
        FeatureVector {
            candidate_id: PropertyId::new(id),
            physical: SubScore::measured(physical, Vec::new()),
            location: SubScore::measured(location, Vec::new()),
            temporal: SubScore::measured(temporal, Vec::new()),
            market: SubScore::measured(50.0, Vec::new()),
            composite,
            distance_km: None,
            days_since_sale: None,
            sold_after_effective: None,
        }
    }

    fn ids(ranking: &Ranking) -> Vec<&str> {
        ranking
            .entries
            .iter()
            .map(|entry| entry.candidate_id.as_str())
            .collect()
    }

    #[test]
    fn ranks_by_composite_descending_and_caps_at_k() {
        let ranking = Ranker::new(3).rank(
            &PropertyId::new("s"),
            vec![
                vector("a", 60.0, 50.0, 50.0, 50.0),
                vector("b", 90.0, 50.0, 50.0, 50.0),
                vector("c", 75.0, 50.0, 50.0, 50.0),
                vector("d", 10.0, 50.0, 50.0, 50.0),
            ],
        );

        assert_eq!(ids(&ranking), vec!["b", "c", "a"]);
        assert_eq!(
            ranking.entries.iter().map(|e| e.rank).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(ranking.coverage, PoolCoverage::Full);
        assert_eq!(ranking.pool_size, 4);
    }

    #[test]
    fn near_ties_fall_through_the_chain() {
        let ranking = Ranker::new(5).rank(
            &PropertyId::new("s"),
            vec![
                vector("by-id-b", 80.0, 70.0, 60.0, 50.0),
                vector("by-temporal", 80.0, 70.0, 60.0, 55.0),
                vector("by-location", 80.0 + 1e-9, 70.0, 65.0, 10.0),
                vector("by-physical", 80.0 - 1e-9, 75.0, 0.0, 0.0),
                vector("by-id-a", 80.0, 70.0, 60.0, 50.0),
            ],
        );

        assert_eq!(
            ids(&ranking),
            vec!["by-physical", "by-location", "by-temporal", "by-id-a", "by-id-b"]
        );
    }

    #[test]
    fn identical_scores_prefer_smaller_identifier() {
        let ranker = Ranker::new(3);
        let forward = ranker.rank(
            &PropertyId::new("s"),
            vec![
                vector("zeta", 77.0, 60.0, 60.0, 60.0),
                vector("alpha", 77.0, 60.0, 60.0, 60.0),
            ],
        );
        let reverse = ranker.rank(
            &PropertyId::new("s"),
            vec![
                vector("alpha", 77.0, 60.0, 60.0, 60.0),
                vector("zeta", 77.0, 60.0, 60.0, 60.0),
            ],
        );
        assert_eq!(ids(&forward), vec!["alpha", "zeta"]);
        assert_eq!(ids(&forward), ids(&reverse));
    }

    #[test]
    fn distinct_composites_ignore_tie_break() {
        let ranking = Ranker::new(3).rank(
            &PropertyId::new("s"),
            vec![
                vector("strong-physical", 70.0, 99.0, 99.0, 99.0),
                vector("higher-composite", 70.5, 10.0, 10.0, 10.0),
            ],
        );
        assert_eq!(ids(&ranking), vec!["higher-composite", "strong-physical"]);
    }

    #[test]
    fn short_and_empty_pools_are_flagged() {
        let ranker = Ranker::new(3);
        let short = ranker.rank(
            &PropertyId::new("s"),
            vec![vector("a", 0.0, 0.0, 0.0, 0.0)],
        );
        assert_eq!(short.coverage, PoolCoverage::Short { available: 1 });
        assert!(short.is_short());
        assert_eq!(short.entries[0].quality, QualityLabel::Poor);

        let empty = ranker.rank(&PropertyId::new("s"), Vec::new());
        assert_eq!(empty.coverage, PoolCoverage::Empty);
        assert!(empty.entries.is_empty());
        assert!(empty.is_short());
        assert_ne!(short.coverage, empty.coverage);

        assert!(short.has_no_viable_comps());
        assert!(!empty.has_no_viable_comps());
        assert!(empty.is_empty_pool());
        assert!(!short.is_empty_pool());

        let one_viable = ranker.rank(
            &PropertyId::new("s"),
            vec![
                vector("zero", 0.0, 0.0, 0.0, 0.0),
                vector("positive", 12.5, 20.0, 0.0, 0.0),
            ],
        );
        assert!(!one_viable.has_no_viable_comps());
    }

    #[test]
    fn tie_groups_anchor_on_their_leader() {
        let pool = || {
            vec![
                vector("x", 80.000_001_5, 10.0, 50.0, 50.0),
                vector("y", 80.000_000_8, 10.0, 50.0, 50.0),
                vector("z", 80.0, 90.0, 50.0, 50.0),
            ]
        };

        let default = Ranker::new(3).rank(&PropertyId::new("s"), pool());
        assert_eq!(ids(&default), vec!["x", "y", "z"]);

        let wide = Ranker::new(3)
            .with_tie_epsilon(2e-6)
            .rank(&PropertyId::new("s"), pool());
        assert_eq!(ids(&wide), vec!["z", "x", "y"]);
    }
}
