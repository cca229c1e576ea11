//! In-memory adapters for tests and database-less deployments.

mod in_memory_score_store;
mod static_desired_grade;

pub use in_memory_score_store::InMemoryScoreStore;
pub use static_desired_grade::StaticDesiredGrade;
