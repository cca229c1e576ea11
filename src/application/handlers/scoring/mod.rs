//! Scoring command handlers - the read-modify-write recomputes.

mod recompute_criterion;
mod recompute_sub_criterion;
mod recompute_total;

pub use recompute_criterion::{
    RecomputeCriterionCommand, RecomputeCriterionHandler, RecomputeCriterionResult,
};
pub use recompute_sub_criterion::{
    RecomputeSubCriterionCommand, RecomputeSubCriterionHandler, RecomputeSubCriterionResult,
};
pub use recompute_total::{RecomputeTotalCommand, RecomputeTotalHandler, RecomputeTotalResult};
