//! Scoring HTTP adapter - recompute and report endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{ApiResponse, ErrorResponse, HealthResponse, ReportParams, SessionParams};
pub use handlers::{ScoringApiError, ScoringAppState};
pub use routes::scoring_routes;
