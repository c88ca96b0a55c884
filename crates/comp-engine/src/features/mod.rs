//! Per-pair feature groups feeding the composite score.
//!
//! Each group is a pure function of one (subject, candidate) pair and yields a
//! [`SubScore`] in `[0, 100]`. Missing inputs never fail the pair: the group
//! falls back to [`NEUTRAL_SCORE`] and records what was absent.

mod decay;
mod location;
mod market;
mod physical;
mod temporal;

pub use location::{forward_sortation_area, haversine_km};
pub use market::MarketContext;

pub(crate) use decay::ratio_gap;

use crate::domain::{Property, PropertyId, Subject};
use serde::{Deserialize, Serialize};

/// Score assigned to a feature group whose inputs are unavailable.
pub const NEUTRAL_SCORE: f64 = 50.0;

/// Input that a feature group needed but could not read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingInput {
    StructureType,
    LivingArea,
    Bedrooms,
    Bathrooms,
    LotSize,
    Levels,
    YearBuilt,
    Coordinates,
    City,
    EffectiveDate,
    SaleDate,
    SubjectPrice,
    CandidatePrice,
}

/// One feature group's score plus the audit trail of degraded inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubScore {
    pub value: f64,
    /// True when the group had nothing to measure and fell back to neutral.
    pub defaulted: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<MissingInput>,
}

impl SubScore {
    pub fn measured(value: f64, missing: Vec<MissingInput>) -> Self {
        Self {
            value: value.clamp(0.0, 100.0),
            defaulted: false,
            missing,
        }
    }

    pub fn neutral(missing: Vec<MissingInput>) -> Self {
        Self {
            value: NEUTRAL_SCORE,
            defaulted: true,
            missing,
        }
    }
}

/// Calibration dials for the decay curves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    pub structure_mismatch_ceiling: f64,
    pub gla_tolerance: f64,
    pub gla_scale: f64,
    pub bedroom_tolerance: f64,
    pub bedroom_scale: f64,
    pub bathroom_tolerance: f64,
    pub bathroom_scale: f64,
    pub lot_tolerance: f64,
    pub lot_scale: f64,
    pub level_tolerance: f64,
    pub level_scale: f64,
    pub year_built_tolerance: f64,
    pub year_built_scale: f64,
    pub max_radius_km: f64,
    pub district_bonus: f64,
    pub recency_window_days: i64,
    pub recency_window_floor: f64,
    pub recency_decay_days: f64,
    pub recency_horizon_days: i64,
    pub market_width: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            structure_mismatch_ceiling: 20.0,
            gla_tolerance: 0.10,
            gla_scale: 0.15,
            bedroom_tolerance: 0.0,
            bedroom_scale: 1.5,
            bathroom_tolerance: 0.5,
            bathroom_scale: 1.0,
            lot_tolerance: 0.20,
            lot_scale: 0.30,
            level_tolerance: 0.0,
            level_scale: 1.0,
            year_built_tolerance: 5.0,
            year_built_scale: 15.0,
            max_radius_km: 5.0,
            district_bonus: 10.0,
            recency_window_days: 90,
            recency_window_floor: 50.0,
            recency_decay_days: 10.0,
            recency_horizon_days: 180,
            market_width: 0.25,
        }
    }
}

/// The four feature groups for one (subject, candidate) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairFeatures {
    pub candidate_id: PropertyId,
    pub physical: SubScore,
    pub location: SubScore,
    pub temporal: SubScore,
    pub market: SubScore,
    pub distance_km: Option<f64>,
    pub days_since_sale: Option<i64>,
    pub sold_after_effective: Option<bool>,
}

/// Stateless extractor applying [`FeatureConfig`] to subject/candidate pairs.
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    config: FeatureConfig,
}

impl FeatureExtractor {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    /// Extract features for every candidate of one subject's pool.
    pub fn extract_pool(&self, subject: &Subject, candidates: &[Property]) -> Vec<PairFeatures> {
        let market = MarketContext::from_pool(subject, candidates);
        candidates
            .iter()
            .map(|candidate| self.extract(subject, candidate, &market))
            .collect()
    }

    pub fn extract(
        &self,
        subject: &Subject,
        candidate: &Property,
        market: &MarketContext,
    ) -> PairFeatures {
        let physical = physical::physical_similarity(&subject.property, candidate, &self.config);
        let (location, distance_km) =
            location::location_proximity(&subject.property, candidate, &self.config);
        let (temporal, signed_days) = temporal::temporal_recency(subject, candidate, &self.config);
        let market = market.compatibility(candidate, &self.config);

        PairFeatures {
            candidate_id: candidate.id.clone(),
            physical,
            location,
            temporal,
            market,
            distance_km,
            days_since_sale: signed_days.map(i64::abs),
            sold_after_effective: signed_days.map(|days| days < 0),
        }
    }
}
