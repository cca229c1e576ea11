//! PostgreSQL adapters - Database implementations for the scoring ports.
//!
//! - `PostgresScoreStore` - Score rows with per-session advisory-locked transactions
//! - `PostgresDesiredGradeReader` - Desired grade from the latest IIQA form

mod desired_grade_reader;
mod score_store;

pub use desired_grade_reader::PostgresDesiredGradeReader;
pub use score_store::PostgresScoreStore;

use sqlx::migrate::MigrateError;
use sqlx::PgPool;

/// Applies the embedded schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
