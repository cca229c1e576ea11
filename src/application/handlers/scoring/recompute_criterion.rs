//! RecomputeCriterionHandler - Command handler for rolling up one criterion.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::foundation::{CriterionId, Session};
use crate::domain::scoring::{
    CriteriaCatalog, CriterionScore, ScoreRow, ScoringError, WeightTable,
};
use crate::ports::{ScoreFilter, ScoreStore};

/// Command to recompute a criterion's normalized and weighted score.
#[derive(Debug, Clone)]
pub struct RecomputeCriterionCommand {
    pub session: Session,
    pub criterion: CriterionId,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecomputeCriterionResult {
    #[serde(flatten)]
    pub score: CriterionScore,
    pub updated_rows: u64,
    #[serde(skip)]
    pub message: String,
}

/// Handler for the criterion rollup.
pub struct RecomputeCriterionHandler {
    store: Arc<dyn ScoreStore>,
    catalog: Arc<CriteriaCatalog>,
    weights: Arc<WeightTable>,
}

impl RecomputeCriterionHandler {
    pub fn new(
        store: Arc<dyn ScoreStore>,
        catalog: Arc<CriteriaCatalog>,
        weights: Arc<WeightTable>,
    ) -> Self {
        Self {
            store,
            catalog,
            weights,
        }
    }

    /// Rolls the criterion up and writes `score_criteria` and the ×1000
    /// `weighted_cr_score` onto every row of the criterion.
    ///
    /// # Errors
    ///
    /// - `CatalogNotFound` if the criterion is not catalogued
    /// - `ConfigMissing` if it has no denominator or weight fraction
    /// - `Store` on persistence failure; nothing is committed
    pub async fn handle(
        &self,
        cmd: RecomputeCriterionCommand,
    ) -> Result<RecomputeCriterionResult, ScoringError> {
        if self.catalog.criterion(&cmd.criterion).is_none() {
            return Err(ScoringError::catalog_not_found(cmd.criterion.dotted()));
        }
        let weight =
            self.weights
                .criterion(&cmd.criterion)
                .ok_or_else(|| ScoringError::ConfigMissing {
                    id: cmd.criterion.dotted(),
                    item: "denominator and weight fraction",
                })?;

        let mut tx = self.store.begin(cmd.session).await?;

        let rows = tx
            .scan(&ScoreFilter::all().criterion(cmd.criterion.clone()).scored_only())
            .await?;
        let score =
            CriterionScore::compute(weight, &self.catalog, self.weights.grade_bands(), &rows);
        if score.ignored_rows > 0 {
            warn!(
                criterion = %cmd.criterion,
                ignored = score.ignored_rows,
                "Skipped scored rows with no sub-criterion"
            );
        }

        let now = Utc::now();
        if let Some(anchor) = self.catalog.anchor_metric(&cmd.criterion) {
            tx.insert_if_absent(ScoreRow::zeroed(cmd.session, anchor, now))
                .await?;
        }
        let updated_rows = tx
            .update_criterion_scores(
                &cmd.criterion,
                score.normalized_score,
                score.stored_weighted_score,
                now,
            )
            .await?;
        tx.commit().await?;

        info!(
            session = %cmd.session,
            criterion = %cmd.criterion,
            total = score.total_score,
            normalized = score.normalized_score,
            weighted = score.stored_weighted_score,
            grade = %score.grade,
            "Recomputed criterion score"
        );

        Ok(RecomputeCriterionResult {
            message: format!("Criterion {} score updated", cmd.criterion.dotted()),
            score,
            updated_rows,
        })
    }
}
