//! Strongly-typed identifier value objects.
//!
//! Hierarchy ids are fixed-width, zero-padded digit strings: two digits per
//! level (`"02"`, `"0201"`, `"020101"`). Dotted codes (`"2.1"`, `"7.1.10"`)
//! are accepted on input and padded segment by segment.

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Academic year an assessment round covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Session(i32);

impl Session {
    pub const MIN_YEAR: i32 = 1900;
    pub const MAX_YEAR: i32 = 9999;

    /// Creates a session for the given year.
    pub fn new(year: i32) -> Result<Self, ValidationError> {
        if !(Self::MIN_YEAR..=Self::MAX_YEAR).contains(&year) {
            return Err(ValidationError::out_of_range(
                "session",
                Self::MIN_YEAR,
                Self::MAX_YEAR,
                year,
            ));
        }
        Ok(Self(year))
    }

    /// The session for the current calendar year (UTC).
    pub fn current() -> Self {
        Self(Utc::now().year())
    }

    pub fn year(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Session {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let year = s
            .trim()
            .parse::<i32>()
            .map_err(|_| ValidationError::invalid_format("session", "expected a four-digit year"))?;
        Self::new(year)
    }
}

/// Normalizes a dotted or fixed-width code into `levels * 2` digits.
fn normalize_code(raw: &str, levels: usize, field: &str) -> Result<String, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::empty_field(field));
    }

    if raw.contains('.') {
        let segments: Vec<&str> = raw.split('.').collect();
        if segments.len() != levels {
            return Err(ValidationError::invalid_format(
                field,
                format!("expected {} dotted segment(s), got '{}'", levels, raw),
            ));
        }
        let mut padded = String::with_capacity(levels * 2);
        for segment in segments {
            if segment.is_empty()
                || segment.len() > 2
                || !segment.bytes().all(|b| b.is_ascii_digit())
            {
                return Err(ValidationError::invalid_format(
                    field,
                    format!("segment '{}' must be one or two digits", segment),
                ));
            }
            padded.push_str(&format!("{:0>2}", segment));
        }
        return Ok(padded);
    }

    if raw.len() == levels * 2 && raw.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(raw.to_string());
    }

    // A bare single-level number such as "2" is a criterion in dotted form.
    if levels == 1 && raw.len() == 1 && raw.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(format!("0{}", raw));
    }

    Err(ValidationError::invalid_format(
        field,
        format!("expected {} digits or a dotted code, got '{}'", levels * 2, raw),
    ))
}

/// Renders a fixed-width code back to dotted form (`"070110"` -> `"7.1.10"`).
fn dotted(code: &str) -> String {
    code.as_bytes()
        .chunks(2)
        .map(|pair| {
            let segment = std::str::from_utf8(pair).unwrap_or("0");
            segment.trim_start_matches('0').to_string()
        })
        .map(|s| if s.is_empty() { "0".to_string() } else { s })
        .collect::<Vec<_>>()
        .join(".")
}

macro_rules! hierarchy_id {
    ($(#[$meta:meta])* $name:ident, $levels:expr, $field:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parses a dotted (`"2.1"`) or fixed-width (`"0201"`) code.
            pub fn parse(raw: &str) -> Result<Self, ValidationError> {
                normalize_code(raw, $levels, $field).map(Self)
            }

            /// The fixed-width form stored in score rows.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// The dotted display form.
            pub fn dotted(&self) -> String {
                dotted(&self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

hierarchy_id!(
    /// Top-level criterion (`"02"`).
    CriterionId,
    1,
    "criteria_id"
);

hierarchy_id!(
    /// Second-level grouping under a criterion (`"0201"`).
    SubCriterionId,
    2,
    "sub_criteria_id"
);

hierarchy_id!(
    /// Leaf metric carrying a raw grade (`"020101"`).
    SubSubCriterionId,
    3,
    "sub_sub_criteria_id"
);

impl CriterionId {
    /// Criterion id of the institution-total sentinel row.
    pub fn sentinel() -> Self {
        Self("00".to_string())
    }

    pub fn is_sentinel(&self) -> bool {
        self.0 == "00"
    }

    /// Numeric ordinal (`"07"` -> 7).
    pub fn ordinal(&self) -> u32 {
        self.0.parse().unwrap_or(0)
    }
}

impl SubCriterionId {
    pub fn sentinel() -> Self {
        Self("0000".to_string())
    }

    pub fn criterion(&self) -> CriterionId {
        CriterionId(self.0[..2].to_string())
    }
}

impl SubSubCriterionId {
    pub fn sentinel() -> Self {
        Self("000000".to_string())
    }

    pub fn sub_criterion(&self) -> SubCriterionId {
        SubCriterionId(self.0[..4].to_string())
    }

    pub fn criterion(&self) -> CriterionId {
        CriterionId(self.0[..2].to_string())
    }
}

/// Composite code identifying a catalog row (`"020601030103"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CriteriaCode(String);

impl CriteriaCode {
    pub const WIDTH: usize = 12;
    const MAX_LEN: usize = 20;

    pub fn new(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("criteria_code"));
        }
        if trimmed.len() > Self::MAX_LEN || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::invalid_format(
                "criteria_code",
                format!("expected up to {} digits, got '{}'", Self::MAX_LEN, trimmed),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Default composite code for a metric: its id right-padded with zeros.
    pub fn for_metric(id: &SubSubCriterionId) -> Self {
        Self(format!("{:0<width$}", id.as_str(), width = Self::WIDTH))
    }

    pub fn sentinel() -> Self {
        Self("0".repeat(Self::WIDTH))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CriteriaCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CriteriaCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CriteriaCode> for String {
    fn from(code: CriteriaCode) -> Self {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_session_follows_the_utc_year() {
        let before = Utc::now().year();
        let year = Session::current().year();
        let after = Utc::now().year();
        assert!(year == before || year == after);
    }

    #[test]
    fn sub_criterion_parses_dotted_form() {
        let id = SubCriterionId::parse("2.1").unwrap();
        assert_eq!(id.as_str(), "0201");
        assert_eq!(id.dotted(), "2.1");
    }

    #[test]
    fn two_digit_segments_pad_per_segment() {
        let id = SubSubCriterionId::parse("7.1.10").unwrap();
        assert_eq!(id.as_str(), "070110");
        assert_eq!(id.dotted(), "7.1.10");
    }

    #[test]
    fn fixed_width_input_is_accepted_verbatim() {
        let id = SubSubCriterionId::parse("020403").unwrap();
        assert_eq!(id.as_str(), "020403");
        assert_eq!(id.sub_criterion().as_str(), "0204");
        assert_eq!(id.criterion().as_str(), "02");
    }

    #[test]
    fn bare_criterion_number_is_padded() {
        assert_eq!(CriterionId::parse("7").unwrap().as_str(), "07");
        assert_eq!(CriterionId::parse("07").unwrap().ordinal(), 7);
    }

    #[test]
    fn wrong_level_count_is_rejected() {
        assert!(SubCriterionId::parse("2.1.1").is_err());
        assert!(SubSubCriterionId::parse("0201").is_err());
        assert!(CriterionId::parse("").is_err());
        assert!(SubCriterionId::parse("2.x").is_err());
        assert!(SubCriterionId::parse("2.100").is_err());
    }

    #[test]
    fn sentinel_ids_are_all_zero() {
        assert!(CriterionId::sentinel().is_sentinel());
        assert_eq!(SubCriterionId::sentinel().as_str(), "0000");
        assert_eq!(SubSubCriterionId::sentinel().as_str(), "000000");
        assert_eq!(CriteriaCode::sentinel().as_str(), "000000000000");
    }

    #[test]
    fn criteria_code_defaults_from_metric() {
        let id = SubSubCriterionId::parse("2.1.1").unwrap();
        assert_eq!(CriteriaCode::for_metric(&id).as_str(), "020101000000");
    }

    #[test]
    fn criteria_code_rejects_non_digits() {
        assert!(CriteriaCode::new("02A1").is_err());
        assert!(CriteriaCode::new("   ").is_err());
    }

    #[test]
    fn session_range_is_enforced() {
        assert_eq!("2025".parse::<Session>().unwrap().year(), 2025);
        assert!("25x".parse::<Session>().is_err());
        assert!(Session::new(12).is_err());
    }

    #[test]
    fn ids_deserialize_from_dotted_yaml() {
        let id: SubCriterionId = serde_yaml::from_str("\"2.4\"").unwrap();
        assert_eq!(id.as_str(), "0204");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"0204\"");
    }
}
