use super::normalizer::{
    combine_bathrooms, normalize_city, normalize_text, parse_bathrooms, parse_count, parse_date,
    parse_levels, parse_measure, parse_number, parse_year,
};
use super::DatasetError;
use crate::domain::{Candidate, Property, PropertyId, StructureType, Subject};
use serde::{Deserialize, Deserializer};
use std::io::Read;

pub(crate) const SUBJECT_COLUMNS: &[&str] = &["id", "effective_date"];
pub(crate) const CANDIDATE_COLUMNS: &[&str] = &["subject_id", "id"];
pub(crate) const SELECTION_COLUMNS: &[&str] = &["subject_id", "candidate_id"];

/// One subject or candidate line. Every column is optional at this layer;
/// required columns are enforced against the header.
#[derive(Debug, Deserialize)]
struct PropertyRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    subject_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    effective_date: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    address: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    postal_code: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    structure_type: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    gla_sqft: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    bedrooms: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    bathrooms: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    full_baths: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    half_baths: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    sale_date: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    sale_price: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    latitude: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    longitude: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    city: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    lot_size_sqft: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    levels: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    year_built: Option<String>,
}

impl PropertyRow {
    fn required(
        value: Option<&str>,
        row: usize,
        column: &'static str,
    ) -> Result<String, DatasetError> {
        value
            .map(str::to_string)
            .ok_or(DatasetError::MissingValue { row, column })
    }

    fn into_property(self, row: usize) -> Result<Property, DatasetError> {
        let id = Self::required(self.id.as_deref(), row, "id")?;
        let structure_type = match self.structure_type.as_deref() {
            Some(raw) => Some(StructureType::parse(raw).ok_or_else(|| {
                DatasetError::UnknownStructureType {
                    row,
                    value: raw.to_string(),
                }
            })?),
            None => None,
        };

        let bathrooms = self.bathrooms.as_deref().and_then(parse_bathrooms).or_else(|| {
            combine_bathrooms(self.full_baths.as_deref(), self.half_baths.as_deref())
        });

        Ok(Property {
            id: PropertyId::new(id),
            address: self.address.as_deref().and_then(normalize_text),
            postal_code: self.postal_code.as_deref().and_then(normalize_text),
            structure_type,
            gla_sqft: self.gla_sqft.as_deref().and_then(parse_measure),
            bedrooms: self.bedrooms.as_deref().and_then(parse_count),
            bathrooms,
            sale_date: self.sale_date.as_deref().and_then(parse_date),
            sale_price: self.sale_price.as_deref().and_then(parse_measure),
            latitude: self
                .latitude
                .as_deref()
                .and_then(parse_number)
                .filter(|lat| (-90.0..=90.0).contains(lat)),
            longitude: self
                .longitude
                .as_deref()
                .and_then(parse_number)
                .filter(|lon| (-180.0..=180.0).contains(lon)),
            city: self.city.as_deref().and_then(normalize_city),
            lot_size_sqft: self.lot_size_sqft.as_deref().and_then(parse_measure),
            levels: self.levels.as_deref().and_then(parse_levels),
            year_built: self.year_built.as_deref().and_then(parse_year),
        })
    }
}

#[derive(Debug, Deserialize)]
struct SelectionRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    subject_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    candidate_id: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn open_reader<R: Read>(
    reader: R,
    required: &[&'static str],
) -> Result<csv::Reader<R>, DatasetError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    for column in required {
        if !headers.iter().any(|header| header == *column) {
            return Err(DatasetError::MissingColumn { column });
        }
    }

    Ok(csv_reader)
}

/// Data rows are numbered from 2; line 1 is the header.
fn line_number(index: usize) -> usize {
    index + 2
}

pub(crate) fn parse_subjects<R: Read>(reader: R) -> Result<Vec<Subject>, DatasetError> {
    let mut csv_reader = open_reader(reader, SUBJECT_COLUMNS)?;
    let mut subjects = Vec::new();

    for (index, record) in csv_reader.deserialize::<PropertyRow>().enumerate() {
        let row = line_number(index);
        let record = record?;
        let effective_date = record.effective_date.as_deref().and_then(parse_date);
        subjects.push(Subject {
            property: record.into_property(row)?,
            effective_date,
        });
    }

    Ok(subjects)
}

pub(crate) fn parse_candidates<R: Read>(reader: R) -> Result<Vec<Candidate>, DatasetError> {
    let mut csv_reader = open_reader(reader, CANDIDATE_COLUMNS)?;
    let mut candidates = Vec::new();

    for (index, record) in csv_reader.deserialize::<PropertyRow>().enumerate() {
        let row = line_number(index);
        let record = record?;
        let subject_id = PropertyRow::required(record.subject_id.as_deref(), row, "subject_id")?;
        candidates.push(Candidate {
            subject_id: PropertyId::new(subject_id),
            property: record.into_property(row)?,
        });
    }

    Ok(candidates)
}

pub(crate) fn parse_selections<R: Read>(
    reader: R,
) -> Result<Vec<(PropertyId, PropertyId)>, DatasetError> {
    let mut csv_reader = open_reader(reader, SELECTION_COLUMNS)?;
    let mut selections = Vec::new();

    for (index, record) in csv_reader.deserialize::<SelectionRow>().enumerate() {
        let row = line_number(index);
        let record = record?;
        let subject_id = PropertyRow::required(record.subject_id.as_deref(), row, "subject_id")?;
        let candidate_id =
            PropertyRow::required(record.candidate_id.as_deref(), row, "candidate_id")?;
        selections.push((PropertyId::new(subject_id), PropertyId::new(candidate_id)));
    }

    Ok(selections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn parses_candidate_rows_leniently() {
        let csv = "\
subject_id,id,address,structure_type,gla_sqft,bedrooms,bathrooms,sale_date,sale_price,city,levels
S-1, C-1 ,12 Maple  St,Semi-Detached,\"1,450\",3,2:1,\"Mar 05, 2025\",\"$512,000\",  Kingston ,2 Storey
S-1,C-2,,,,,,,,,
";
        let candidates = parse_candidates(csv.as_bytes()).expect("valid candidates");
        assert_eq!(candidates.len(), 2);

        let first = &candidates[0].property;
        assert_eq!(first.id.as_str(), "C-1");
        assert_eq!(first.address.as_deref(), Some("12 Maple St"));
        assert_eq!(first.structure_type, Some(StructureType::SemiDetached));
        assert_eq!(first.gla_sqft, Some(1_450.0));
        assert_eq!(first.bathrooms, Some(2.5));
        assert_eq!(first.sale_price, Some(512_000.0));
        assert_eq!(first.city.as_deref(), Some("kingston"));
        assert_eq!(first.levels, Some(2.0));

        let second = &candidates[1].property;
        assert_eq!(second.completeness(), 0);
    }

    #[test]
    fn missing_required_column_is_rejected() {
        let csv = "id,address\nS-1,1 Main St\n";
        match parse_subjects(csv.as_bytes()) {
            Err(DatasetError::MissingColumn { column }) => assert_eq!(column, "effective_date"),
            other => panic!("expected missing column, got {other:?}"),
        }
    }

    #[test]
    fn unknown_structure_type_reports_line() {
        let csv = "subject_id,id,structure_type\nS-1,C-1,detached\nS-1,C-2,castle\n";
        match parse_candidates(csv.as_bytes()) {
            Err(DatasetError::UnknownStructureType { row, value }) => {
                assert_eq!(row, 3);
                assert_eq!(value, "castle");
            }
            other => panic!("expected unknown structure type, got {other:?}"),
        }
    }

    #[test]
    fn subjects_keep_effective_date_and_separate_bath_columns() {
        let csv = "id,effective_date,full_baths,half_baths\nS-1,2025-03-01,2,1\n";
        let subjects = parse_subjects(csv.as_bytes()).expect("valid subjects");
        assert_eq!(subjects[0].effective_date, NaiveDate::from_ymd_opt(2025, 3, 1));
        assert_eq!(subjects[0].property.bathrooms, Some(2.5));
    }

    #[test]
    fn blank_identifier_is_a_missing_value() {
        let csv = "subject_id,candidate_id\nS-1,\n";
        assert!(matches!(
            parse_selections(csv.as_bytes()),
            Err(DatasetError::MissingValue {
                row: 2,
                column: "candidate_id"
            })
        ));
    }
}
