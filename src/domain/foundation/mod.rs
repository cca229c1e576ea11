//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, the letter grade, and validation error types
//! that form the vocabulary of the scoring domain.

mod errors;
mod grade;
mod ids;

pub use errors::{ErrorCode, ValidationError};
pub use grade::Grade;
pub use ids::{CriteriaCode, CriterionId, Session, SubCriterionId, SubSubCriterionId};
