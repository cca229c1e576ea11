//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.
//!
//! - `scoring` - Recompute commands (sub-criterion, criterion, total)
//! - `reporting` - Summary and radar queries

pub mod reporting;
pub mod scoring;

pub use reporting::{
    DesiredGradePolicy, GetCollegeSummaryHandler, GetCollegeSummaryQuery, GetRadarReportHandler,
    GetRadarReportQuery,
};
pub use scoring::{
    RecomputeCriterionCommand, RecomputeCriterionHandler, RecomputeCriterionResult,
    RecomputeSubCriterionCommand, RecomputeSubCriterionHandler, RecomputeSubCriterionResult,
    RecomputeTotalCommand, RecomputeTotalHandler, RecomputeTotalResult,
};
