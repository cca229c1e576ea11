//! HTTP handlers for scoring endpoints.
//!
//! These handlers connect Axum routes to the recompute commands and the
//! report queries.

use std::sync::Arc;

use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::error;

use crate::application::handlers::{
    DesiredGradePolicy, GetCollegeSummaryHandler, GetCollegeSummaryQuery, GetRadarReportHandler,
    GetRadarReportQuery, RecomputeCriterionCommand, RecomputeCriterionHandler,
    RecomputeCriterionResult, RecomputeSubCriterionCommand, RecomputeSubCriterionHandler,
    RecomputeSubCriterionResult, RecomputeTotalCommand, RecomputeTotalHandler,
    RecomputeTotalResult,
};
use crate::domain::foundation::{
    CriterionId, ErrorCode, Grade, Session, SubCriterionId, ValidationError,
};
use crate::domain::reporting::{RadarReport, SummaryReport};
use crate::domain::scoring::{CriteriaCatalog, ScoringError, WeightTable};
use crate::ports::{DesiredGradeReader, ScoreStore};

use super::dto::{ApiResponse, ErrorResponse, HealthResponse, ReportParams, SessionParams};

// ════════════════════════════════════════════════════════════════════════════════
// Error Type
// ════════════════════════════════════════════════════════════════════════════════

/// Scoring API error that implements IntoResponse.
#[derive(Debug)]
pub enum ScoringApiError {
    BadRequest(String),
    NotFound(String),
    Internal { code: ErrorCode, message: String },
}

impl IntoResponse for ScoringApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ScoringApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(ErrorCode::ValidationFailed, msg),
            ),
            ScoringApiError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new(ErrorCode::CatalogNotFound, msg),
            ),
            ScoringApiError::Internal { code, message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new(code, message),
            ),
        };
        (status, Json(error)).into_response()
    }
}

impl From<ValidationError> for ScoringApiError {
    fn from(error: ValidationError) -> Self {
        ScoringApiError::BadRequest(error.to_string())
    }
}

impl From<ScoringError> for ScoringApiError {
    fn from(error: ScoringError) -> Self {
        match &error {
            ScoringError::CatalogNotFound(_) => ScoringApiError::NotFound(error.to_string()),
            ScoringError::Validation(err) => ScoringApiError::BadRequest(err.to_string()),
            ScoringError::ConfigMissing { .. } | ScoringError::Store(_) => {
                error!(error = %error, "Scoring request failed");
                ScoringApiError::Internal {
                    code: error.code(),
                    message: error.to_string(),
                }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing scoring dependencies.
#[derive(Clone)]
pub struct ScoringAppState {
    pub store: Arc<dyn ScoreStore>,
    pub desired_grade_reader: Arc<dyn DesiredGradeReader>,
    pub catalog: Arc<CriteriaCatalog>,
    pub weights: Arc<WeightTable>,
    pub default_grade: Grade,
    pub institution_id: i64,
}

impl ScoringAppState {
    pub fn recompute_sub_criterion_handler(&self) -> RecomputeSubCriterionHandler {
        RecomputeSubCriterionHandler::new(
            self.store.clone(),
            self.catalog.clone(),
            self.weights.clone(),
        )
    }

    pub fn recompute_criterion_handler(&self) -> RecomputeCriterionHandler {
        RecomputeCriterionHandler::new(
            self.store.clone(),
            self.catalog.clone(),
            self.weights.clone(),
        )
    }

    pub fn recompute_total_handler(&self) -> RecomputeTotalHandler {
        RecomputeTotalHandler::new(self.store.clone(), self.weights.clone())
    }

    pub fn college_summary_handler(&self) -> GetCollegeSummaryHandler {
        GetCollegeSummaryHandler::new(
            self.store.clone(),
            self.desired_grade_policy(),
            self.catalog.clone(),
            self.weights.clone(),
            self.institution_id,
        )
    }

    pub fn radar_report_handler(&self) -> GetRadarReportHandler {
        GetRadarReportHandler::new(
            self.store.clone(),
            self.desired_grade_policy(),
            self.catalog.clone(),
            self.weights.clone(),
        )
    }

    fn desired_grade_policy(&self) -> DesiredGradePolicy {
        DesiredGradePolicy::new(self.desired_grade_reader.clone(), self.default_grade)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Parameter Parsing
// ════════════════════════════════════════════════════════════════════════════════

fn parse_session(raw: Option<&str>) -> Result<Session, ValidationError> {
    match raw {
        Some(value) => value.parse(),
        None => Ok(Session::current()),
    }
}

/// An unencoded `+` in a query string arrives as a space, so `A++` shows up
/// as `A  `.
fn parse_grade(raw: Option<&str>) -> Result<Option<Grade>, ValidationError> {
    raw.map(|value| value.trim_start().replace(' ', "+").parse())
        .transpose()
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/scores/sub-criteria/:code/recompute
pub async fn recompute_sub_criterion(
    State(state): State<ScoringAppState>,
    Path(code): Path<String>,
    Query(params): Query<SessionParams>,
) -> Result<Json<ApiResponse<RecomputeSubCriterionResult>>, ScoringApiError> {
    let cmd = RecomputeSubCriterionCommand {
        session: parse_session(params.session.as_deref())?,
        sub_criterion: SubCriterionId::parse(&code)?,
    };

    let result = state.recompute_sub_criterion_handler().handle(cmd).await?;
    let message = result.message.clone();
    Ok(Json(ApiResponse::ok(result, message)))
}

/// POST /api/scores/criteria/:code/recompute
pub async fn recompute_criterion(
    State(state): State<ScoringAppState>,
    Path(code): Path<String>,
    Query(params): Query<SessionParams>,
) -> Result<Json<ApiResponse<RecomputeCriterionResult>>, ScoringApiError> {
    let cmd = RecomputeCriterionCommand {
        session: parse_session(params.session.as_deref())?,
        criterion: CriterionId::parse(&code)?,
    };

    let result = state.recompute_criterion_handler().handle(cmd).await?;
    let message = result.message.clone();
    Ok(Json(ApiResponse::ok(result, message)))
}

/// POST /api/scores/total/recompute
pub async fn recompute_total(
    State(state): State<ScoringAppState>,
    Query(params): Query<SessionParams>,
) -> Result<Json<ApiResponse<RecomputeTotalResult>>, ScoringApiError> {
    let cmd = RecomputeTotalCommand {
        session: parse_session(params.session.as_deref())?,
    };

    let result = state.recompute_total_handler().handle(cmd).await?;
    let message = result.message.clone();
    Ok(Json(ApiResponse::ok(result, message)))
}

/// GET /api/scores/summary
pub async fn get_college_summary(
    State(state): State<ScoringAppState>,
    Query(params): Query<ReportParams>,
) -> Result<Json<ApiResponse<SummaryReport>>, ScoringApiError> {
    let query = GetCollegeSummaryQuery {
        session: parse_session(params.session.as_deref())?,
        desired_grade: parse_grade(params.desired_grade.as_deref())?,
    };

    let report = state.college_summary_handler().handle(query).await?;
    Ok(Json(ApiResponse::ok(report, "College summary retrieved")))
}

/// GET /api/scores/radar
pub async fn get_radar_report(
    State(state): State<ScoringAppState>,
    Query(params): Query<ReportParams>,
) -> Result<Json<ApiResponse<RadarReport>>, ScoringApiError> {
    let query = GetRadarReportQuery {
        session: parse_session(params.session.as_deref())?,
        desired_grade: parse_grade(params.desired_grade.as_deref())?,
    };

    let report = state.radar_report_handler().handle(query).await?;
    Ok(Json(ApiResponse::ok(report, "Radar data retrieved")))
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
