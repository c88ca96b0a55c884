use crate::domain::PropertyId;
use crate::scoring::FeatureVector;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityLabel {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl QualityLabel {
    pub const fn ordered() -> [Self; 4] {
        [Self::Excellent, Self::Good, Self::Fair, Self::Poor]
    }

    /// Lower bounds are inclusive: 85.0 is Excellent, 84.999 is Good.
    pub fn from_score(composite: f64) -> Self {
        if composite >= 85.0 {
            Self::Excellent
        } else if composite >= 70.0 {
            Self::Good
        } else if composite >= 50.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
        }
    }
}

/// How a subject's pool compares to the requested `top_k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum PoolCoverage {
    /// The pool had no candidates at all.
    Empty,
    /// The pool had candidates but fewer than `top_k`.
    Short { available: usize },
    Full,
}

impl PoolCoverage {
    pub(crate) fn assess(pool_size: usize, ranked: usize, top_k: usize) -> Self {
        if pool_size == 0 {
            Self::Empty
        } else if ranked < top_k {
            Self::Short { available: ranked }
        } else {
            Self::Full
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Short { .. } => "short",
            Self::Full => "full",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedComp {
    pub rank: usize,
    pub candidate_id: PropertyId,
    pub composite: f64,
    pub quality: QualityLabel,
    pub features: FeatureVector,
}

impl RankedComp {
    pub(crate) fn new(rank: usize, features: FeatureVector) -> Self {
        Self {
            rank,
            candidate_id: features.candidate_id.clone(),
            composite: features.composite,
            quality: QualityLabel::from_score(features.composite),
            features,
        }
    }
}

/// Best-first comps for one subject. Built once by the ranker, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    pub subject_id: PropertyId,
    pub top_k: usize,
    pub pool_size: usize,
    pub coverage: PoolCoverage,
    pub entries: Vec<RankedComp>,
}

impl Ranking {
    /// True whenever fewer than `top_k` entries were produced.
    pub fn is_short(&self) -> bool {
        self.entries.len() < self.top_k
    }

    pub fn is_empty_pool(&self) -> bool {
        self.coverage == PoolCoverage::Empty
    }

    /// Candidates were available but every one scored zero.
    pub fn has_no_viable_comps(&self) -> bool {
        !self.entries.is_empty() && self.entries.iter().all(|entry| entry.composite <= 0.0)
    }

    pub fn candidate_ids(&self) -> impl Iterator<Item = &PropertyId> {
        self.entries.iter().map(|entry| &entry.candidate_id)
    }

    pub fn rows(&self) -> Vec<RankingRow> {
        self.entries
            .iter()
            .map(|entry| RankingRow {
                subject_id: self.subject_id.0.clone(),
                candidate_id: entry.candidate_id.0.clone(),
                rank: entry.rank,
                composite_score: entry.composite,
                physical_score: entry.features.physical.value,
                location_score: entry.features.location.value,
                temporal_score: entry.features.temporal.value,
                market_score: entry.features.market.value,
                quality_label: entry.quality.label(),
            })
            .collect()
    }
}

/// Flat table row for CSV export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingRow {
    pub subject_id: String,
    pub candidate_id: String,
    pub rank: usize,
    pub composite_score: f64,
    pub physical_score: f64,
    pub location_score: f64,
    pub temporal_score: f64,
    pub market_score: f64,
    pub quality_label: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_label_boundaries_close_on_upper_label() {
        assert_eq!(QualityLabel::from_score(100.0), QualityLabel::Excellent);
        assert_eq!(QualityLabel::from_score(85.0), QualityLabel::Excellent);
        assert_eq!(QualityLabel::from_score(84.999), QualityLabel::Good);
        assert_eq!(QualityLabel::from_score(70.0), QualityLabel::Good);
        assert_eq!(QualityLabel::from_score(69.999), QualityLabel::Fair);
        assert_eq!(QualityLabel::from_score(50.0), QualityLabel::Fair);
        assert_eq!(QualityLabel::from_score(49.999), QualityLabel::Poor);
        assert_eq!(QualityLabel::from_score(0.0), QualityLabel::Poor);
    }

    #[test]
    fn coverage_distinguishes_empty_from_short() {
        assert_eq!(PoolCoverage::assess(0, 0, 3), PoolCoverage::Empty);
        assert_eq!(
            PoolCoverage::assess(2, 2, 3),
            PoolCoverage::Short { available: 2 }
        );
        assert_eq!(PoolCoverage::assess(9, 3, 3), PoolCoverage::Full);
    }
}
