//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `http` - Axum REST surface
//! - `memory` - In-memory score store for tests and database-less runs
//! - `postgres` - PostgreSQL score store and desired grade reader

pub mod http;
pub mod memory;
pub mod postgres;

pub use memory::{InMemoryScoreStore, StaticDesiredGrade};
pub use postgres::{run_migrations, PostgresDesiredGradeReader, PostgresScoreStore};
