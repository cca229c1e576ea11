//! Criteria catalog - read-only hierarchy reference data.
//!
//! Maps criterion → sub-criterion → metric (sub-sub-criterion) identifiers to
//! their names and composite criteria codes. Loaded once at startup from the
//! embedded YAML document or an operator-supplied override file.

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::domain::foundation::{CriteriaCode, CriterionId, SubCriterionId, SubSubCriterionId};

use super::errors::ReferenceDataError;

static STANDARD_CATALOG: Lazy<CriteriaCatalog> = Lazy::new(|| {
    CriteriaCatalog::from_yaml_str(include_str!("data/catalog.yaml"))
        .expect("embedded criteria catalog must be valid")
});

// ─────────────────────────────────────────────────────────────────────────────
// Document shape
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogDocument {
    criteria: Vec<CriterionDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CriterionDocument {
    id: CriterionId,
    name: String,
    #[serde(default)]
    sub_criteria: Vec<SubCriterionDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SubCriterionDocument {
    id: SubCriterionId,
    name: String,
    #[serde(default)]
    metrics: Vec<MetricDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MetricDocument {
    id: SubSubCriterionId,
    name: String,
    #[serde(default)]
    code: Option<CriteriaCode>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Catalog
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct CriterionEntry {
    pub id: CriterionId,
    pub name: String,
    /// Children in catalog order.
    pub sub_criteria: Vec<SubCriterionId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubCriterionEntry {
    pub id: SubCriterionId,
    pub name: String,
    /// Children in catalog order.
    pub metrics: Vec<SubSubCriterionId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricEntry {
    pub id: SubSubCriterionId,
    pub name: String,
    pub criteria_code: CriteriaCode,
}

/// Immutable criteria hierarchy.
#[derive(Debug, Clone, Default)]
pub struct CriteriaCatalog {
    criteria: BTreeMap<CriterionId, CriterionEntry>,
    sub_criteria: BTreeMap<SubCriterionId, SubCriterionEntry>,
    metrics: BTreeMap<SubSubCriterionId, MetricEntry>,
}

impl CriteriaCatalog {
    /// The catalog shipped with the crate.
    pub fn standard() -> &'static CriteriaCatalog {
        &STANDARD_CATALOG
    }

    /// Parses and validates a catalog document.
    ///
    /// # Errors
    ///
    /// - `Parse` if the YAML is malformed or an id is not a valid code
    /// - `Invalid` if an id is duplicated, sits under the wrong parent, or two
    ///   metrics share a criteria code
    pub fn from_yaml_str(source: &str) -> Result<Self, ReferenceDataError> {
        let document: CatalogDocument = serde_yaml::from_str(source)?;
        Self::from_document(document)
    }

    /// Reads a catalog document from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ReferenceDataError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ReferenceDataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&source)
    }

    fn from_document(document: CatalogDocument) -> Result<Self, ReferenceDataError> {
        let mut catalog = CriteriaCatalog::default();
        let mut codes = HashSet::new();

        for criterion in document.criteria {
            if criterion.id.is_sentinel() {
                return Err(ReferenceDataError::invalid(
                    "criterion 00 is reserved for the institution total",
                ));
            }
            if catalog.criteria.contains_key(&criterion.id) {
                return Err(ReferenceDataError::invalid(format!(
                    "duplicate criterion {}",
                    criterion.id.dotted()
                )));
            }

            let mut sub_ids = Vec::with_capacity(criterion.sub_criteria.len());
            for sub in criterion.sub_criteria {
                if sub.id.criterion() != criterion.id {
                    return Err(ReferenceDataError::invalid(format!(
                        "sub-criterion {} is not under criterion {}",
                        sub.id.dotted(),
                        criterion.id.dotted()
                    )));
                }
                if catalog.sub_criteria.contains_key(&sub.id) {
                    return Err(ReferenceDataError::invalid(format!(
                        "duplicate sub-criterion {}",
                        sub.id.dotted()
                    )));
                }

                let mut metric_ids = Vec::with_capacity(sub.metrics.len());
                for metric in sub.metrics {
                    if metric.id.sub_criterion() != sub.id {
                        return Err(ReferenceDataError::invalid(format!(
                            "metric {} is not under sub-criterion {}",
                            metric.id.dotted(),
                            sub.id.dotted()
                        )));
                    }
                    if catalog.metrics.contains_key(&metric.id) {
                        return Err(ReferenceDataError::invalid(format!(
                            "duplicate metric {}",
                            metric.id.dotted()
                        )));
                    }
                    let criteria_code = metric
                        .code
                        .unwrap_or_else(|| CriteriaCode::for_metric(&metric.id));
                    if !codes.insert(criteria_code.clone()) {
                        return Err(ReferenceDataError::invalid(format!(
                            "criteria code {} is used by more than one metric",
                            criteria_code
                        )));
                    }
                    metric_ids.push(metric.id.clone());
                    catalog.metrics.insert(
                        metric.id.clone(),
                        MetricEntry {
                            id: metric.id,
                            name: metric.name,
                            criteria_code,
                        },
                    );
                }

                sub_ids.push(sub.id.clone());
                catalog.sub_criteria.insert(
                    sub.id.clone(),
                    SubCriterionEntry {
                        id: sub.id,
                        name: sub.name,
                        metrics: metric_ids,
                    },
                );
            }

            catalog.criteria.insert(
                criterion.id.clone(),
                CriterionEntry {
                    id: criterion.id,
                    name: criterion.name,
                    sub_criteria: sub_ids,
                },
            );
        }

        Ok(catalog)
    }

    pub fn criterion(&self, id: &CriterionId) -> Option<&CriterionEntry> {
        self.criteria.get(id)
    }

    pub fn sub_criterion(&self, id: &SubCriterionId) -> Option<&SubCriterionEntry> {
        self.sub_criteria.get(id)
    }

    pub fn metric(&self, id: &SubSubCriterionId) -> Option<&MetricEntry> {
        self.metrics.get(id)
    }

    /// All criteria ordered by id.
    pub fn criteria(&self) -> impl Iterator<Item = &CriterionEntry> {
        self.criteria.values()
    }

    /// Catalog parent of a metric; `None` when the metric is not catalogued.
    pub fn parent_of(&self, metric: &SubSubCriterionId) -> Option<&SubCriterionId> {
        self.metrics
            .get(metric)
            .and_then(|_| self.sub_criteria.get(&metric.sub_criterion()))
            .map(|entry| &entry.id)
    }

    pub fn sub_criteria_of(&self, criterion: &CriterionId) -> Vec<&SubCriterionEntry> {
        self.criteria
            .get(criterion)
            .map(|entry| {
                entry
                    .sub_criteria
                    .iter()
                    .filter_map(|id| self.sub_criteria.get(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn metrics_of(&self, sub_criterion: &SubCriterionId) -> Vec<&MetricEntry> {
        self.sub_criteria
            .get(sub_criterion)
            .map(|entry| {
                entry
                    .metrics
                    .iter()
                    .filter_map(|id| self.metrics.get(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// First catalogued metric of a criterion.
    ///
    /// The criterion rollup guarantees this row exists so the persisted
    /// criterion score has somewhere to live even before any metric is scored.
    pub fn anchor_metric(&self, criterion: &CriterionId) -> Option<&MetricEntry> {
        self.sub_criteria_of(criterion)
            .into_iter()
            .flat_map(|sub| sub.metrics.iter())
            .find_map(|id| self.metrics.get(id))
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}
