//! Letter grade value object.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Accreditation letter grade, ordered from lowest (`D`) to highest (`A++`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Grade {
    D,
    C,
    B,
    BPlus,
    BPlusPlus,
    A,
    APlus,
    APlusPlus,
}

impl Grade {
    /// All grades, highest first.
    pub const ALL: [Grade; 8] = [
        Grade::APlusPlus,
        Grade::APlus,
        Grade::A,
        Grade::BPlusPlus,
        Grade::BPlus,
        Grade::B,
        Grade::C,
        Grade::D,
    ];

    /// Returns the display label.
    pub fn label(&self) -> &'static str {
        match self {
            Grade::APlusPlus => "A++",
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlusPlus => "B++",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Grade {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        Grade::ALL
            .iter()
            .copied()
            .find(|grade| grade.label() == normalized)
            .ok_or_else(|| {
                ValidationError::invalid_format("grade", format!("unknown grade '{}'", s.trim()))
            })
    }
}

impl TryFrom<String> for Grade {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Grade> for String {
    fn from(grade: Grade) -> Self {
        grade.label().to_string()
    }
}
