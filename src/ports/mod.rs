//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `ScoreStore` / `ScoreTransaction` - Score row persistence, one
//!   transaction per session
//! - `DesiredGradeReader` - The institution's declared target grade

mod desired_grade_reader;
mod score_store;

pub use desired_grade_reader::DesiredGradeReader;
pub use score_store::{ScoreFilter, ScoreStore, ScoreTransaction, StoreError};
