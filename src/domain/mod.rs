//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (ids, grade, validation errors)
//! - `scoring` - Catalog, weight table, and the pure aggregation rules
//! - `reporting` - Summary and radar views derived from persisted scores

pub mod foundation;
pub mod reporting;
pub mod scoring;
