use super::decay::{ratio_gap, tolerant_decay};
use super::{FeatureConfig, MissingInput, SubScore, NEUTRAL_SCORE};
use crate::domain::Property;

const GLA_WEIGHT: f64 = 0.30;
const BEDROOM_WEIGHT: f64 = 0.15;
const BATHROOM_WEIGHT: f64 = 0.15;
const LOT_WEIGHT: f64 = 0.15;
const LEVEL_WEIGHT: f64 = 0.10;
const YEAR_BUILT_WEIGHT: f64 = 0.15;

/// Weighted blend over whichever graded attributes both sides report.
#[derive(Default)]
struct Blend {
    weighted: f64,
    weight: f64,
    missing: Vec<MissingInput>,
}

impl Blend {
    fn grade(&mut self, input: MissingInput, factor: Option<f64>, weight: f64) {
        match factor {
            Some(factor) => {
                self.weighted += factor * weight;
                self.weight += weight;
            }
            None => self.missing.push(input),
        }
    }
}

fn both<T: Copy>(a: Option<T>, b: Option<T>) -> Option<(T, T)> {
    a.zip(b)
}

pub(crate) fn physical_similarity(
    subject: &Property,
    candidate: &Property,
    config: &FeatureConfig,
) -> SubScore {
    let mut blend = Blend::default();

    let structure_mismatch = match both(subject.structure_type, candidate.structure_type) {
        Some((left, right)) => left != right,
        None => {
            blend.missing.push(MissingInput::StructureType);
            false
        }
    };

    blend.grade(
        MissingInput::LivingArea,
        both(subject.gla_sqft, candidate.gla_sqft)
            .and_then(|(a, b)| ratio_gap(a, b))
            .map(|gap| tolerant_decay(gap, config.gla_tolerance, config.gla_scale)),
        GLA_WEIGHT,
    );
    blend.grade(
        MissingInput::Bedrooms,
        both(subject.bedrooms, candidate.bedrooms).map(|(a, b)| {
            let delta = (f64::from(a) - f64::from(b)).abs();
            tolerant_decay(delta, config.bedroom_tolerance, config.bedroom_scale)
        }),
        BEDROOM_WEIGHT,
    );
    blend.grade(
        MissingInput::Bathrooms,
        both(subject.bathrooms, candidate.bathrooms).map(|(a, b)| {
            tolerant_decay(a - b, config.bathroom_tolerance, config.bathroom_scale)
        }),
        BATHROOM_WEIGHT,
    );
    blend.grade(
        MissingInput::LotSize,
        both(subject.lot_size_sqft, candidate.lot_size_sqft)
            .and_then(|(a, b)| ratio_gap(a, b))
            .map(|gap| tolerant_decay(gap, config.lot_tolerance, config.lot_scale)),
        LOT_WEIGHT,
    );
    blend.grade(
        MissingInput::Levels,
        both(subject.levels, candidate.levels)
            .map(|(a, b)| tolerant_decay(a - b, config.level_tolerance, config.level_scale)),
        LEVEL_WEIGHT,
    );
    blend.grade(
        MissingInput::YearBuilt,
        both(subject.year_built, candidate.year_built).map(|(a, b)| {
            let delta = f64::from(a) - f64::from(b);
            tolerant_decay(delta, config.year_built_tolerance, config.year_built_scale)
        }),
        YEAR_BUILT_WEIGHT,
    );

    let Blend {
        weighted,
        weight,
        missing,
    } = blend;

    if weight <= 0.0 {
        if structure_mismatch {
            return SubScore::measured(NEUTRAL_SCORE.min(config.structure_mismatch_ceiling), missing);
        }
        return SubScore::neutral(missing);
    }

    let graded = 100.0 * weighted / weight;
    let value = if structure_mismatch {
        graded.min(config.structure_mismatch_ceiling)
    } else {
        graded
    };

    SubScore::measured(value, missing)
}
