use serde::{Deserialize, Serialize};

/// Allowed drift between the weight sum and `1.0`.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

const DEFAULT_PHYSICAL: f64 = 0.40;
const DEFAULT_LOCATION: f64 = 0.30;
const DEFAULT_TEMPORAL: f64 = 0.20;
const DEFAULT_MARKET: f64 = 0.10;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WeightError {
    #[error("{group} weight must be a finite, non-negative number (found {value})")]
    InvalidComponent { group: &'static str, value: f64 },
    #[error("composite weights must sum to 1.0 (found {sum:.6})")]
    InvalidSum { sum: f64 },
}

/// Convex weighting of the four feature groups. Only constructible when valid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoringWeights {
    physical: f64,
    location: f64,
    temporal: f64,
    market: f64,
}

impl ScoringWeights {
    pub fn new(physical: f64, location: f64, temporal: f64, market: f64) -> Result<Self, WeightError> {
        for (group, value) in [
            ("physical", physical),
            ("location", location),
            ("temporal", temporal),
            ("market", market),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(WeightError::InvalidComponent { group, value });
            }
        }

        let sum = physical + location + temporal + market;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(WeightError::InvalidSum { sum });
        }

        Ok(Self {
            physical,
            location,
            temporal,
            market,
        })
    }

    pub fn physical(&self) -> f64 {
        self.physical
    }

    pub fn location(&self) -> f64 {
        self.location
    }

    pub fn temporal(&self) -> f64 {
        self.temporal
    }

    pub fn market(&self) -> f64 {
        self.market
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            physical: DEFAULT_PHYSICAL,
            location: DEFAULT_LOCATION,
            temporal: DEFAULT_TEMPORAL,
            market: DEFAULT_MARKET,
        }
    }
}

impl<'de> Deserialize<'de> for ScoringWeights {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            physical: f64,
            location: f64,
            temporal: f64,
            market: f64,
        }

        let raw = Raw::deserialize(deserializer)?;
        Self::new(raw.physical, raw.location, raw.temporal, raw.market)
            .map_err(serde::de::Error::custom)
    }
}
