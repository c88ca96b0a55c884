use super::address::{address_similarity, normalize_address, NormalizedAddress};
use super::DedupConfig;
use crate::domain::{Property, StructureType};
use crate::features::{haversine_km, ratio_gap};

const ADDRESS_WEIGHT: f64 = 0.45;
const PRICE_WEIGHT: f64 = 0.20;
const LIVING_AREA_WEIGHT: f64 = 0.20;
const PROXIMITY_WEIGHT: f64 = 0.15;

/// A candidate record carrying the fields duplicate detection cannot do without.
#[derive(Debug, Clone)]
pub(crate) struct ComparableRecord<'a> {
    pub(crate) property: &'a Property,
    pub(crate) structure: StructureType,
    pub(crate) address: NormalizedAddress,
}

impl<'a> ComparableRecord<'a> {
    /// `None` when the address or structure type is missing; such records are
    /// never considered for merging.
    pub(crate) fn from_property(property: &'a Property) -> Option<Self> {
        let structure = property.structure_type?;
        let address = normalize_address(property.address.as_deref()?);
        if address.base.is_empty() {
            return None;
        }
        Some(Self {
            property,
            structure,
            address,
        })
    }
}

/// Linear credit for a relative gap: 1 at zero, 0 at or beyond `tolerance`.
fn closeness(gap: f64, tolerance: f64) -> f64 {
    if tolerance <= 0.0 {
        return if gap <= 0.0 { 1.0 } else { 0.0 };
    }
    (1.0 - gap / tolerance).max(0.0)
}

fn proximity(left: &Property, right: &Property, config: &DedupConfig) -> Option<f64> {
    let meters = haversine_km(left.coordinates()?, right.coordinates()?) * 1_000.0;

    if meters <= config.colocated_meters {
        return Some(1.0);
    }
    let span = config.proximity_radius_meters - config.colocated_meters;
    if span <= 0.0 {
        return Some(0.0);
    }
    Some(((config.proximity_radius_meters - meters) / span).clamp(0.0, 1.0))
}

/// Weighted duplicate confidence in `[0, 1]`, or `None` when the records are
/// provably different dwellings or lack corroborating evidence.
pub(crate) fn duplicate_confidence(
    left: &ComparableRecord<'_>,
    right: &ComparableRecord<'_>,
    config: &DedupConfig,
) -> Option<f64> {
    if left.structure != right.structure {
        return None;
    }

    let (a, b) = (left.property, right.property);
    if let (Some(beds_a), Some(beds_b)) = (a.bedrooms, b.bedrooms) {
        if beds_a != beds_b {
            return None;
        }
    }
    if let (Some(baths_a), Some(baths_b)) = (a.bathrooms, b.bathrooms) {
        if (baths_a - baths_b).abs() > f64::EPSILON {
            return None;
        }
    }

    match (&left.address.unit, &right.address.unit) {
        (Some(unit_a), Some(unit_b)) if unit_a != unit_b => return None,
        (Some(_), None) | (None, Some(_)) if left.structure == StructureType::Condominium => {
            return None
        }
        _ => {}
    }
    if let (Some(civic_a), Some(civic_b)) =
        (left.address.civic_number(), right.address.civic_number())
    {
        if civic_a != civic_b {
            return None;
        }
    }

    let rule = config.rule_for(left.structure);
    let price = a
        .sale_price
        .zip(b.sale_price)
        .and_then(|(pa, pb)| ratio_gap(pa, pb))
        .map(|gap| closeness(gap, rule.tolerance));
    let living_area = a
        .gla_sqft
        .zip(b.gla_sqft)
        .and_then(|(ga, gb)| ratio_gap(ga, gb))
        .map(|gap| closeness(gap, rule.tolerance));

    // An address match alone is not enough to collapse two sales.
    if price.is_none() && living_area.is_none() {
        return None;
    }

    let signals = [
        Some((address_similarity(&left.address, &right.address), ADDRESS_WEIGHT)),
        price.map(|score| (score, PRICE_WEIGHT)),
        living_area.map(|score| (score, LIVING_AREA_WEIGHT)),
        proximity(a, b, config).map(|score| (score, PROXIMITY_WEIGHT)),
    ];

    let (weighted, total) = signals
        .into_iter()
        .flatten()
        .fold((0.0, 0.0), |(weighted, total), (score, weight)| {
            (weighted + score * weight, total + weight)
        });

    Some((weighted / total).clamp(0.0, 1.0))
}
