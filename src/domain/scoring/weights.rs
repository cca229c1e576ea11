//! Weight table - declarative aggregation parameters.
//!
//! One row per sub-criterion (contributing metrics and weight multiplier) and
//! one row per criterion (fixed denominator and weight fraction), plus the
//! per-grade targets the reports compare against and the grade ladder.

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::domain::foundation::{CriterionId, Grade, SubCriterionId, SubSubCriterionId};

use super::catalog::CriteriaCatalog;
use super::errors::ReferenceDataError;
use super::grade_classifier::GradeBands;

/// Target applied to a sub-criterion with no configured target for the grade.
pub const DEFAULT_SUB_CRITERION_TARGET: f64 = 100.0;

const FRACTION_TOLERANCE: f64 = 1e-9;

static STANDARD_WEIGHTS: Lazy<WeightTable> = Lazy::new(|| {
    WeightTable::from_yaml_str(include_str!("data/weights.yaml"))
        .expect("embedded weight table must be valid")
});

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubCriterionWeight {
    pub id: SubCriterionId,
    pub weight: f64,
    /// Metrics whose grades contribute; an explicit subset of the children.
    pub includes: Vec<SubSubCriterionId>,
    #[serde(default)]
    pub targets: BTreeMap<Grade, f64>,
}

impl SubCriterionWeight {
    pub fn includes(&self, metric: &SubSubCriterionId) -> bool {
        self.includes.contains(metric)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CriterionWeight {
    pub id: CriterionId,
    pub denominator: f64,
    pub weight_fraction: f64,
    #[serde(default)]
    pub weighted_targets: BTreeMap<Grade, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GradeTarget {
    pub gpa: f64,
    pub score: f64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WeightDocument {
    criteria: Vec<CriterionWeight>,
    sub_criteria: Vec<SubCriterionWeight>,
    #[serde(default)]
    institution_targets: BTreeMap<Grade, GradeTarget>,
    #[serde(default)]
    grade_bands: GradeBands,
}

/// Validated weight configuration.
#[derive(Debug, Clone)]
pub struct WeightTable {
    criteria: BTreeMap<CriterionId, CriterionWeight>,
    sub_criteria: BTreeMap<SubCriterionId, SubCriterionWeight>,
    institution_targets: BTreeMap<Grade, GradeTarget>,
    grade_bands: GradeBands,
}

impl WeightTable {
    /// The weight table shipped with the crate.
    pub fn standard() -> &'static WeightTable {
        &STANDARD_WEIGHTS
    }

    /// Parses and validates a weight document.
    ///
    /// # Errors
    ///
    /// - `Parse` for malformed YAML or invalid ids / grades
    /// - `Invalid` when fractions do not sum to 1, a weight or denominator is
    ///   not positive, an included metric belongs to another sub-criterion, or
    ///   the grade ladder is not strictly descending
    pub fn from_yaml_str(source: &str) -> Result<Self, ReferenceDataError> {
        let document: WeightDocument = serde_yaml::from_str(source)?;
        Self::from_document(document)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ReferenceDataError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ReferenceDataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&source)
    }

    fn from_document(document: WeightDocument) -> Result<Self, ReferenceDataError> {
        let mut criteria = BTreeMap::new();
        for row in document.criteria {
            let id = row.id.clone();
            if criteria.insert(id.clone(), row).is_some() {
                return Err(ReferenceDataError::invalid(format!(
                    "criterion {} is configured twice",
                    id.dotted()
                )));
            }
        }

        let mut sub_criteria = BTreeMap::new();
        for row in document.sub_criteria {
            let id = row.id.clone();
            if sub_criteria.insert(id.clone(), row).is_some() {
                return Err(ReferenceDataError::invalid(format!(
                    "sub-criterion {} is configured twice",
                    id.dotted()
                )));
            }
        }

        let table = Self {
            criteria,
            sub_criteria,
            institution_targets: document.institution_targets,
            grade_bands: document.grade_bands,
        };
        table.validate()?;
        Ok(table)
    }

    /// Checks the table's internal consistency.
    pub fn validate(&self) -> Result<(), ReferenceDataError> {
        for row in self.criteria.values() {
            if row.id.is_sentinel() {
                return Err(ReferenceDataError::invalid(
                    "criterion 00 is reserved for the institution total",
                ));
            }
            if !(row.denominator.is_finite() && row.denominator > 0.0) {
                return Err(ReferenceDataError::invalid(format!(
                    "criterion {} denominator must be positive",
                    row.id.dotted()
                )));
            }
            if !(row.weight_fraction.is_finite() && row.weight_fraction > 0.0) {
                return Err(ReferenceDataError::invalid(format!(
                    "criterion {} weight fraction must be positive",
                    row.id.dotted()
                )));
            }
        }

        if !self.criteria.is_empty() {
            let sum: f64 = self.criteria.values().map(|row| row.weight_fraction).sum();
            if (sum - 1.0).abs() > FRACTION_TOLERANCE {
                return Err(ReferenceDataError::invalid(format!(
                    "criterion weight fractions sum to {}, expected 1",
                    sum
                )));
            }
        }

        for row in self.sub_criteria.values() {
            if !(row.weight.is_finite() && row.weight > 0.0) {
                return Err(ReferenceDataError::invalid(format!(
                    "sub-criterion {} weight must be positive",
                    row.id.dotted()
                )));
            }
            if row.includes.is_empty() {
                return Err(ReferenceDataError::invalid(format!(
                    "sub-criterion {} includes no metrics",
                    row.id.dotted()
                )));
            }
            let mut seen = HashSet::new();
            for metric in &row.includes {
                if metric.sub_criterion() != row.id {
                    return Err(ReferenceDataError::invalid(format!(
                        "metric {} included by {} belongs to {}",
                        metric.dotted(),
                        row.id.dotted(),
                        metric.sub_criterion().dotted()
                    )));
                }
                if !seen.insert(metric) {
                    return Err(ReferenceDataError::invalid(format!(
                        "metric {} is included twice by {}",
                        metric.dotted(),
                        row.id.dotted()
                    )));
                }
            }
        }

        self.grade_bands.validate()
    }

    /// Checks every configured id against the catalog.
    pub fn validate_against(&self, catalog: &CriteriaCatalog) -> Result<(), ReferenceDataError> {
        for id in self.criteria.keys() {
            if catalog.criterion(id).is_none() {
                return Err(ReferenceDataError::invalid(format!(
                    "criterion {} is weighted but not catalogued",
                    id.dotted()
                )));
            }
        }
        for row in self.sub_criteria.values() {
            if catalog.sub_criterion(&row.id).is_none() {
                return Err(ReferenceDataError::invalid(format!(
                    "sub-criterion {} is weighted but not catalogued",
                    row.id.dotted()
                )));
            }
            for metric in &row.includes {
                if catalog.parent_of(metric) != Some(&row.id) {
                    return Err(ReferenceDataError::invalid(format!(
                        "metric {} included by {} is not a catalogued child",
                        metric.dotted(),
                        row.id.dotted()
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn sub_criterion(&self, id: &SubCriterionId) -> Option<&SubCriterionWeight> {
        self.sub_criteria.get(id)
    }

    pub fn criterion(&self, id: &CriterionId) -> Option<&CriterionWeight> {
        self.criteria.get(id)
    }

    pub fn criteria(&self) -> impl Iterator<Item = &CriterionWeight> {
        self.criteria.values()
    }

    /// Score target for a sub-criterion at the desired grade.
    ///
    /// Grade D carries no sub-criterion targets; it resolves to C.
    pub fn sub_criterion_target(&self, id: &SubCriterionId, grade: Grade) -> Option<f64> {
        let grade = if grade == Grade::D { Grade::C } else { grade };
        self.sub_criteria
            .get(id)
            .and_then(|row| row.targets.get(&grade))
            .copied()
    }

    pub fn criterion_target(&self, id: &CriterionId, grade: Grade) -> Option<f64> {
        self.criteria
            .get(id)
            .and_then(|row| row.weighted_targets.get(&grade))
            .copied()
    }

    pub fn institution_target(&self, grade: Grade) -> Option<GradeTarget> {
        self.institution_targets.get(&grade).copied()
    }

    pub fn grade_bands(&self) -> &GradeBands {
        &self.grade_bands
    }
}
