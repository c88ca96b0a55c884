use super::decay::bell_decay;
use super::{FeatureConfig, MissingInput, SubScore};
use crate::domain::{Property, Subject};

/// Price-per-sqft distribution of one subject's local market (its pool).
#[derive(Debug, Clone, PartialEq)]
pub struct MarketContext {
    population: Vec<f64>,
    subject_percentile: Option<f64>,
}

impl MarketContext {
    pub fn from_pool(subject: &Subject, candidates: &[Property]) -> Self {
        let mut population: Vec<f64> = candidates
            .iter()
            .filter_map(Property::price_per_sqft)
            .collect();
        population.sort_by(f64::total_cmp);

        let subject_percentile = subject
            .property
            .price_per_sqft()
            .and_then(|ppsf| percentile_rank(&population, ppsf));

        Self {
            population,
            subject_percentile,
        }
    }

    pub fn population_size(&self) -> usize {
        self.population.len()
    }

    pub fn subject_percentile(&self) -> Option<f64> {
        self.subject_percentile
    }

    pub fn percentile_of(&self, price_per_sqft: f64) -> Option<f64> {
        percentile_rank(&self.population, price_per_sqft)
    }

    pub(crate) fn compatibility(&self, candidate: &Property, config: &FeatureConfig) -> SubScore {
        let mut missing = Vec::new();
        let candidate_percentile = candidate
            .price_per_sqft()
            .and_then(|ppsf| self.percentile_of(ppsf));

        if self.subject_percentile.is_none() {
            missing.push(MissingInput::SubjectPrice);
        }
        if candidate_percentile.is_none() {
            missing.push(MissingInput::CandidatePrice);
        }

        match (self.subject_percentile, candidate_percentile) {
            (Some(subject), Some(candidate)) => SubScore::measured(
                100.0 * bell_decay(candidate - subject, config.market_width),
                missing,
            ),
            _ => SubScore::neutral(missing),
        }
    }
}

/// Mid-rank percentile of `value` within a sorted population, in `[0, 1]`.
fn percentile_rank(sorted: &[f64], value: f64) -> Option<f64> {
    if sorted.is_empty() || !value.is_finite() {
        return None;
    }
    let below = sorted.partition_point(|probe| *probe < value);
    let through = sorted.partition_point(|probe| *probe <= value);
    let equal = through - below;
    Some((below as f64 + 0.5 * equal as f64) / sorted.len() as f64)
}
