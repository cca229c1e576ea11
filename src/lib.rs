//! Accreditation Scoring - hierarchical weighted scoring for institutional
//! accreditation.
//!
//! Raw metric grades roll up into sub-criterion scores, normalized and
//! weighted criterion scores, an institution-wide total and a letter grade.
//! Summary and radar reports compare the stored scores with the targets for
//! a desired grade.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
