use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier shared by subjects and candidates; unique within a loaded dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyId(pub String);

impl PropertyId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureType {
    Detached,
    SemiDetached,
    Townhouse,
    Condominium,
    Duplex,
    Triplex,
    Fourplex,
    Mobile,
}

impl StructureType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Detached => "Detached",
            Self::SemiDetached => "Semi-Detached",
            Self::Townhouse => "Townhouse",
            Self::Condominium => "Condominium",
            Self::Duplex => "Duplex",
            Self::Triplex => "Triplex",
            Self::Fourplex => "Fourplex",
            Self::Mobile => "Mobile",
        }
    }

    /// Maps the spellings seen in appraisal exports onto the fixed vocabulary.
    pub fn parse(raw: &str) -> Option<Self> {
        let key: String = raw
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();

        match key.as_str() {
            "detached" | "singlefamily" | "singlefamilydetached" | "house" | "sfd" => {
                Some(Self::Detached)
            }
            "semidetached" | "semi" => Some(Self::SemiDetached),
            "townhouse" | "townhome" | "rowhouse" | "row" | "freeholdtownhouse" => {
                Some(Self::Townhouse)
            }
            "condominium" | "condo" | "apartment" | "condoapartment" | "condotownhouse" => {
                Some(Self::Condominium)
            }
            "duplex" => Some(Self::Duplex),
            "triplex" => Some(Self::Triplex),
            "fourplex" | "quadplex" | "4plex" => Some(Self::Fourplex),
            "mobile" | "mobilehome" | "manufactured" => Some(Self::Mobile),
            _ => None,
        }
    }
}

/// A real-estate unit, either the subject of an appraisal or a candidate comp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub structure_type: Option<StructureType>,
    pub gla_sqft: Option<f64>,
    pub bedrooms: Option<u8>,
    pub bathrooms: Option<f64>,
    pub sale_date: Option<NaiveDate>,
    pub sale_price: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub city: Option<String>,
    pub lot_size_sqft: Option<f64>,
    pub levels: Option<f64>,
    pub year_built: Option<i32>,
}

impl Property {
    /// A property with only an identifier; every attribute is missing.
    pub fn bare(id: impl Into<String>) -> Self {
        Self {
            id: PropertyId::new(id),
            address: None,
            postal_code: None,
            structure_type: None,
            gla_sqft: None,
            bedrooms: None,
            bathrooms: None,
            sale_date: None,
            sale_price: None,
            latitude: None,
            longitude: None,
            city: None,
            lot_size_sqft: None,
            levels: None,
            year_built: None,
        }
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
            _ => None,
        }
    }

    pub fn price_per_sqft(&self) -> Option<f64> {
        match (self.sale_price, self.gla_sqft) {
            (Some(price), Some(gla)) if price > 0.0 && gla > 0.0 => Some(price / gla),
            _ => None,
        }
    }

    /// Number of populated optional attributes, used to pick merge survivors.
    pub fn completeness(&self) -> usize {
        [
            self.address.is_some(),
            self.postal_code.is_some(),
            self.structure_type.is_some(),
            self.gla_sqft.is_some(),
            self.bedrooms.is_some(),
            self.bathrooms.is_some(),
            self.sale_date.is_some(),
            self.sale_price.is_some(),
            self.latitude.is_some(),
            self.longitude.is_some(),
            self.city.is_some(),
            self.lot_size_sqft.is_some(),
            self.levels.is_some(),
            self.year_built.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }
}

/// The property under appraisal plus the date its value is estimated at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub property: Property,
    pub effective_date: Option<NaiveDate>,
}

impl Subject {
    pub fn id(&self) -> &PropertyId {
        &self.property.id
    }
}

/// A candidate comp tied to the subject whose pool it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub subject_id: PropertyId,
    pub property: Property,
}
