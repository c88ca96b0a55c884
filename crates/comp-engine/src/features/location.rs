use super::decay::radial_decay;
use super::{FeatureConfig, MissingInput, SubScore};
use crate::domain::Property;
use regex::Regex;
use std::sync::OnceLock;

const EARTH_RADIUS_KM: f64 = 6_371.0088;

static FSA_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Great-circle distance between two `(lat, lon)` points in kilometres.
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = (from.0.to_radians(), from.1.to_radians());
    let (lat2, lon2) = (to.0.to_radians(), to.1.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
}

/// First three characters of a Canadian postal code found in `text`.
pub fn forward_sortation_area(text: &str) -> Option<String> {
    let pattern = FSA_PATTERN.get_or_init(|| {
        Regex::new(r"\b([A-Z]\d[A-Z])(?:\s*\d[A-Z]\d)?\b").expect("valid FSA pattern")
    });
    pattern
        .captures(&text.to_ascii_uppercase())
        .and_then(|captures| captures.get(1))
        .map(|fsa| fsa.as_str().to_string())
}

fn property_fsa(property: &Property) -> Option<String> {
    property
        .postal_code
        .as_deref()
        .and_then(forward_sortation_area)
        .or_else(|| property.address.as_deref().and_then(forward_sortation_area))
}

/// Returns `None` when the two sides cannot be compared at all.
fn same_district(subject: &Property, candidate: &Property) -> Option<bool> {
    let city = match (subject.city.as_deref(), candidate.city.as_deref()) {
        (Some(left), Some(right)) => Some(left == right),
        _ => None,
    };
    let fsa = match (property_fsa(subject), property_fsa(candidate)) {
        (Some(left), Some(right)) => Some(left == right),
        _ => None,
    };

    match (city, fsa) {
        (None, None) => None,
        (city, fsa) => Some(city.unwrap_or(false) || fsa.unwrap_or(false)),
    }
}

pub(crate) fn location_proximity(
    subject: &Property,
    candidate: &Property,
    config: &FeatureConfig,
) -> (SubScore, Option<f64>) {
    let mut missing = Vec::new();
    let district = same_district(subject, candidate);
    if district.is_none() {
        missing.push(MissingInput::City);
    }

    let Some((from, to)) = subject.coordinates().zip(candidate.coordinates()) else {
        missing.insert(0, MissingInput::Coordinates);
        return (SubScore::neutral(missing), None);
    };

    let distance_km = haversine_km(from, to);
    let base = 100.0 * radial_decay(distance_km, config.max_radius_km);
    let bonus = if district.unwrap_or(false) {
        config.district_bonus
    } else {
        0.0
    };

    (
        SubScore::measured((base + bonus).min(100.0), missing),
        Some(distance_km),
    )
}
