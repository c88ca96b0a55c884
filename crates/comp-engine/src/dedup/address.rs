use regex::Regex;
use std::sync::OnceLock;

static ABBREVIATIONS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
static UNIT_DESIGNATOR: OnceLock<Regex> = OnceLock::new();
static UNIT_PREFIX: OnceLock<Regex> = OnceLock::new();

/// Street address reduced to a comparable form with the unit split off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NormalizedAddress {
    pub(crate) unit: Option<String>,
    pub(crate) base: String,
}

impl NormalizedAddress {
    /// Leading civic number, when the address starts with one.
    pub(crate) fn civic_number(&self) -> Option<&str> {
        self.base
            .split(' ')
            .next()
            .filter(|token| token.chars().next().is_some_and(|c| c.is_ascii_digit()))
    }

    /// Tokens sorted alphabetically so word order does not affect matching.
    pub(crate) fn sorted_tokens(&self) -> String {
        let mut tokens: Vec<&str> = self.base.split(' ').collect();
        tokens.sort_unstable();
        tokens.join(" ")
    }
}

fn abbreviations() -> &'static [(Regex, &'static str)] {
    ABBREVIATIONS.get_or_init(|| {
        const TABLE: &[(&str, &str)] = &[
            (r"\bSTREET\b", "ST"),
            (r"\bAVENUE\b", "AVE"),
            (r"\bDRIVE\b", "DR"),
            (r"\bROAD\b", "RD"),
            (r"\bBOULEVARD\b", "BLVD"),
            (r"\bCOURT\b", "CT"),
            (r"\bLANE\b", "LN"),
            (r"\bPLACE\b", "PL"),
            (r"\bCIRCLE\b", "CIR"),
            (r"\bCIRC\b", "CIR"),
            (r"\bPARKWAY\b", "PKWY"),
            (r"\bTERRACE\b", "TER"),
            (r"\bCRESCENT\b", "CRES"),
            (r"\bHEIGHTS\b", "HTS"),
            (r"\bMOUNT\b", "MT"),
            (r"\bSAINT\b", "ST"),
            (r"\bNORTH\b", "N"),
            (r"\bSOUTH\b", "S"),
            (r"\bEAST\b", "E"),
            (r"\bWEST\b", "W"),
        ];

        TABLE
            .iter()
            .map(|(pattern, replacement)| {
                (
                    Regex::new(pattern).expect("valid abbreviation pattern"),
                    *replacement,
                )
            })
            .collect()
    })
}

fn unit_designator() -> &'static Regex {
    UNIT_DESIGNATOR.get_or_init(|| {
        Regex::new(r"(?:\b(?:UNIT|APT|SUITE|STE)\s*#?\s*|#\s*)([0-9]+[A-Z]?)\b\s*-?\s*")
            .expect("valid unit designator pattern")
    })
}

fn unit_prefix() -> &'static Regex {
    // "1203-55 BAY ST" style: unit, dash, civic number.
    UNIT_PREFIX.get_or_init(|| {
        Regex::new(r"^([0-9]+[A-Z]?)\s*-\s*([0-9])").expect("valid unit prefix pattern")
    })
}

fn collapse(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn normalize_address(raw: &str) -> NormalizedAddress {
    let mut text = collapse(&raw.replace(['\u{feff}', '\u{200b}'], "").to_ascii_uppercase());
    let mut unit = None;

    if let Some(captures) = unit_designator().captures(&text) {
        if let (Some(whole), Some(number)) = (captures.get(0), captures.get(1)) {
            unit = Some(number.as_str().to_string());
            text = format!("{} {}", &text[..whole.start()], &text[whole.end()..]);
        }
    } else if let Some(captures) = unit_prefix().captures(&text) {
        if let (Some(number), Some(civic)) = (captures.get(1), captures.get(2)) {
            unit = Some(number.as_str().to_string());
            text = text[civic.start()..].to_string();
        }
    }

    for (pattern, replacement) in abbreviations() {
        text = pattern.replace_all(&text, *replacement).into_owned();
    }

    let stripped: String = text
        .chars()
        .map(|c| match c {
            '.' | ',' | '\'' | '"' | '!' | '?' | ';' | ':' | '#' => ' ',
            other => other,
        })
        .collect();

    NormalizedAddress {
        unit,
        base: collapse(&stripped),
    }
}

/// Similarity of two normalized addresses in `[0, 1]`, order-insensitive.
pub(crate) fn address_similarity(left: &NormalizedAddress, right: &NormalizedAddress) -> f64 {
    strsim::normalized_levenshtein(&left.sorted_tokens(), &right.sorted_tokens())
}
