use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::OnceLock;

static LEADING_NUMBER: OnceLock<Regex> = OnceLock::new();

// Two-digit years come first: chrono's `%Y` also accepts short years.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%m/%d/%y", "%m/%d/%Y", "%b %d, %Y", "%b/%d/%y", "%b/%d/%Y", "%Y/%m/%d",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

/// Accepts the date spellings seen in appraisal exports; anything else is missing.
pub(crate) fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
    {
        return Some(date);
    }

    if let Some(datetime) = DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
    {
        return Some(datetime.date());
    }

    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.naive_utc().date())
}

/// Strips currency symbols and thousands separators before parsing.
pub(crate) fn parse_number(value: &str) -> Option<f64> {
    let cleaned: String = value
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    cleaned.parse::<f64>().ok().filter(|number| number.is_finite())
}

/// A measurement that must be strictly positive to be meaningful.
pub(crate) fn parse_measure(value: &str) -> Option<f64> {
    parse_number(value).filter(|number| *number > 0.0)
}

pub(crate) fn parse_count(value: &str) -> Option<u8> {
    parse_number(value)
        .filter(|number| *number >= 0.0 && *number <= f64::from(u8::MAX))
        .map(|number| number.round() as u8)
}

pub(crate) fn parse_year(value: &str) -> Option<i32> {
    parse_number(value)
        .filter(|year| (1600.0..=2200.0).contains(year))
        .map(|year| year.round() as i32)
}

/// Decimal bathrooms or `full:half` notation, where a half bath counts 0.5.
pub(crate) fn parse_bathrooms(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    match trimmed.split_once(':') {
        Some((full, half)) => {
            let full = parse_number(full).unwrap_or(0.0);
            let half = parse_number(half).unwrap_or(0.0);
            let total = full + half * 0.5;
            (total >= 0.0).then_some(total)
        }
        None => parse_number(trimmed).filter(|baths| *baths >= 0.0),
    }
}

/// Separate full and half bath columns, when an export provides them.
pub(crate) fn combine_bathrooms(full: Option<&str>, half: Option<&str>) -> Option<f64> {
    let full = full.and_then(parse_number)?;
    let half = half.and_then(parse_number).unwrap_or(0.0);
    let total = full + half * 0.5;
    (total >= 0.0).then_some(total)
}

/// Storey counts, tolerating text such as `2 Storey` or `1.5-storey`.
pub(crate) fn parse_levels(value: &str) -> Option<f64> {
    if let Some(levels) = parse_measure(value) {
        return Some(levels);
    }
    let pattern = LEADING_NUMBER.get_or_init(|| {
        Regex::new(r"(\d+(?:\.\d+)?)").expect("valid leading number pattern")
    });
    pattern
        .captures(value)
        .and_then(|captures| captures.get(1))
        .and_then(|number| parse_measure(number.as_str()))
}

pub(crate) fn normalize_city(value: &str) -> Option<String> {
    let collapsed = value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    (!collapsed.is_empty()).then_some(collapsed)
}

pub(crate) fn normalize_text(value: &str) -> Option<String> {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn parses_export_date_formats() {
        assert_eq!(parse_date("2025-03-01"), date(2025, 3, 1));
        assert_eq!(parse_date("03/01/2025"), date(2025, 3, 1));
        assert_eq!(parse_date("Mar 01, 2025"), date(2025, 3, 1));
        assert_eq!(parse_date("2025-03-01T14:30:00.000Z"), date(2025, 3, 1));
        assert_eq!(parse_date("Mar/01/2025"), date(2025, 3, 1));
        assert_eq!(parse_date("Mar/01/25"), date(2025, 3, 1));
        assert_eq!(parse_date("03/01/25"), date(2025, 3, 1));
        assert_eq!(parse_date("2025/03/01"), date(2025, 3, 1));
        assert_eq!(parse_date("sometime in spring"), None);
        assert_eq!(parse_date("  "), None);
    }

    #[test]
    fn numbers_tolerate_currency_formatting() {
        assert_eq!(parse_number("$1,250,000"), Some(1_250_000.0));
        assert_eq!(parse_number(" 1 850.5 "), Some(1_850.5));
        assert_eq!(parse_measure("0"), None);
        assert_eq!(parse_measure("-12"), None);
        assert_eq!(parse_measure("n/a"), None);
        assert_eq!(parse_count("3.0"), Some(3));
        assert_eq!(parse_year("1978"), Some(1978));
        assert_eq!(parse_year("19"), None);
    }

    #[test]
    fn bathrooms_accept_full_half_notation() {
        assert_eq!(parse_bathrooms("2:1"), Some(2.5));
        assert_eq!(parse_bathrooms("3:0"), Some(3.0));
        assert_eq!(parse_bathrooms("1.5"), Some(1.5));
        assert_eq!(parse_bathrooms("many"), None);
        assert_eq!(combine_bathrooms(Some("2"), Some("2")), Some(3.0));
        assert_eq!(combine_bathrooms(None, Some("1")), None);
    }

    #[test]
    fn levels_and_cities_normalize() {
        assert_eq!(parse_levels("2"), Some(2.0));
        assert_eq!(parse_levels("1.5-Storey"), Some(1.5));
        assert_eq!(parse_levels("Bungalow"), None);
        assert_eq!(normalize_city("  Kingston   West "), Some("kingston west".to_string()));
        assert_eq!(normalize_city("   "), None);
    }
}
