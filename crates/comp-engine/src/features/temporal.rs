use super::{FeatureConfig, MissingInput, SubScore};
use crate::domain::{Property, Subject};

/// Score for a sale `days` away from the effective date (absolute).
pub(crate) fn recency_score(days: i64, config: &FeatureConfig) -> f64 {
    let days = days.abs();
    let window = config.recency_window_days.max(1);

    if days <= window {
        let share = days as f64 / window as f64;
        return 100.0 - (100.0 - config.recency_window_floor) * share;
    }
    if days >= config.recency_horizon_days {
        return 0.0;
    }
    if config.recency_decay_days <= 0.0 {
        return 0.0;
    }

    let overrun = (days - window) as f64;
    config.recency_window_floor * (-overrun / config.recency_decay_days).exp()
}

/// Returns the sub-score plus the signed day gap (positive: sold before the
/// effective date).
pub(crate) fn temporal_recency(
    subject: &Subject,
    candidate: &Property,
    config: &FeatureConfig,
) -> (SubScore, Option<i64>) {
    let mut missing = Vec::new();
    if subject.effective_date.is_none() {
        missing.push(MissingInput::EffectiveDate);
    }
    if candidate.sale_date.is_none() {
        missing.push(MissingInput::SaleDate);
    }

    match (subject.effective_date, candidate.sale_date) {
        (Some(effective), Some(sold)) => {
            let signed = (effective - sold).num_days();
            (
                SubScore::measured(recency_score(signed, config), missing),
                Some(signed),
            )
        }
        _ => (SubScore::neutral(missing), None),
    }
}
