//! HTTP routes for scoring endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{
    get_college_summary, get_radar_report, health, recompute_criterion, recompute_sub_criterion,
    recompute_total, ScoringAppState,
};

/// Creates the scoring router with all routes.
pub fn scoring_routes(state: ScoringAppState) -> Router {
    Router::new()
        // POST /api/scores/sub-criteria/:code/recompute
        .route(
            "/api/scores/sub-criteria/:code/recompute",
            post(recompute_sub_criterion),
        )
        // POST /api/scores/criteria/:code/recompute
        .route("/api/scores/criteria/:code/recompute", post(recompute_criterion))
        // POST /api/scores/total/recompute
        .route("/api/scores/total/recompute", post(recompute_total))
        .route("/api/scores/summary", get(get_college_summary))
        .route("/api/scores/radar", get(get_radar_report))
        .route("/health", get(health))
        .with_state(state)
}
