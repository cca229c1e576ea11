//! Scoring module - hierarchical weighted score aggregation.
//!
//! Raw metric grades roll up bottom-up:
//!
//! ```text
//! metric grades ──► sub-criterion score ──► criterion score ──► institution total
//!   (mean × weight)      (Σ max / denominator × fraction × 1000)     (Σ max per criterion)
//! ```
//!
//! Everything here is pure: the catalog and weight table are immutable
//! reference data, and the computations take rows in and hand results out.
//! Persistence and transactions live behind the `ScoreStore` port.

mod catalog;
mod criterion;
mod errors;
mod grade_classifier;
mod score_row;
mod sub_criterion;
mod weights;

pub use catalog::{CriteriaCatalog, CriterionEntry, MetricEntry, SubCriterionEntry};
pub use criterion::{CriterionScore, InstitutionTotal};
pub use errors::{ReferenceDataError, ScoringError};
pub use grade_classifier::{classify, GradeBand, GradeBands};
pub use score_row::{ScoreKey, ScoreRow, WEIGHTED_SCORE_SCALE};
pub use sub_criterion::{mean_grade, SubCriterionScore};
pub use weights::{
    CriterionWeight, GradeTarget, SubCriterionWeight, WeightTable, DEFAULT_SUB_CRITERION_TARGET,
};
