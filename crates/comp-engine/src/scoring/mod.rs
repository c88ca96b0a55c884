//! Composite scoring over the four feature groups.

mod weights;

pub use weights::{ScoringWeights, WeightError, WEIGHT_SUM_TOLERANCE};

use crate::domain::PropertyId;
use crate::features::{PairFeatures, SubScore};
use serde::{Deserialize, Serialize};

/// Feature groups of one pair plus the composite derived from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub candidate_id: PropertyId,
    pub physical: SubScore,
    pub location: SubScore,
    pub temporal: SubScore,
    pub market: SubScore,
    pub composite: f64,
    pub distance_km: Option<f64>,
    pub days_since_sale: Option<i64>,
    pub sold_after_effective: Option<bool>,
}

impl FeatureVector {
    pub fn is_degraded(&self) -> bool {
        [&self.physical, &self.location, &self.temporal, &self.market]
            .into_iter()
            .any(|score| score.defaulted || !score.missing.is_empty())
    }
}

/// Applies a validated convex weighting to feature groups.
#[derive(Debug, Clone, Default)]
pub struct CompositeScorer {
    weights: ScoringWeights,
}

impl CompositeScorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    /// Weighted sum of the four sub-scores, clamped to `[0, 100]`.
    pub fn composite(&self, physical: f64, location: f64, temporal: f64, market: f64) -> f64 {
        let weights = &self.weights;
        let sum = weights.physical() * physical
            + weights.location() * location
            + weights.temporal() * temporal
            + weights.market() * market;
        sum.clamp(0.0, 100.0)
    }

    pub fn score(&self, features: PairFeatures) -> FeatureVector {
        let composite = self.composite(
            features.physical.value,
            features.location.value,
            features.temporal.value,
            features.market.value,
        );

        FeatureVector {
            candidate_id: features.candidate_id,
            physical: features.physical,
            location: features.location,
            temporal: features.temporal,
            market: features.market,
            composite,
            distance_km: features.distance_km,
            days_since_sale: features.days_since_sale,
            sold_after_effective: features.sold_after_effective,
        }
    }
}
