//! RecomputeSubCriterionHandler - Command handler for scoring one sub-criterion.
//!
//! Averages the raw grades of the sub-criterion's included metrics, applies
//! the configured weight, and writes the result onto every included row.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::foundation::{Session, SubCriterionId};
use crate::domain::scoring::{
    CriteriaCatalog, MetricEntry, ScoreRow, ScoringError, SubCriterionScore, WeightTable,
};
use crate::ports::{ScoreFilter, ScoreStore};

/// Command to recompute a sub-criterion score.
#[derive(Debug, Clone)]
pub struct RecomputeSubCriterionCommand {
    pub session: Session,
    pub sub_criterion: SubCriterionId,
}

/// Result of a sub-criterion recompute.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecomputeSubCriterionResult {
    #[serde(flatten)]
    pub score: SubCriterionScore,
    pub inserted_rows: usize,
    pub updated_rows: u64,
    /// Included rows after the update.
    pub rows: Vec<ScoreRow>,
    #[serde(skip)]
    pub message: String,
}

/// Handler for recomputing a sub-criterion score.
pub struct RecomputeSubCriterionHandler {
    store: Arc<dyn ScoreStore>,
    catalog: Arc<CriteriaCatalog>,
    weights: Arc<WeightTable>,
}

impl RecomputeSubCriterionHandler {
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

    /// Recomputes and persists the sub-criterion score in one transaction.
    ///
    /// # Errors
    ///
    /// - `CatalogNotFound` if the sub-criterion is not weighted, not
    ///   catalogued, or none of its included metrics are catalogued
    /// - `Store` on persistence failure; nothing is committed
    pub async fn handle(
        &self,
        cmd: RecomputeSubCriterionCommand,
    ) -> Result<RecomputeSubCriterionResult, ScoringError> {
        let weight = self
            .weights
            .sub_criterion(&cmd.sub_criterion)
            .ok_or_else(|| ScoringError::catalog_not_found(cmd.sub_criterion.dotted()))?;
        if self.catalog.sub_criterion(&cmd.sub_criterion).is_none() {
            return Err(ScoringError::catalog_not_found(cmd.sub_criterion.dotted()));
        }

        let metrics: Vec<&MetricEntry> = weight
            .includes
            .iter()
            .filter(|id| self.catalog.parent_of(id) == Some(&cmd.sub_criterion))
            .filter_map(|id| self.catalog.metric(id))
            .collect();
        if metrics.is_empty() {
            return Err(ScoringError::catalog_not_found(cmd.sub_criterion.dotted()));
        }

        let included: Vec<_> = metrics.iter().map(|m| m.id.clone()).collect();
        let filter = ScoreFilter::all()
            .metrics(included.clone())
            .codes(metrics.iter().map(|m| m.criteria_code.clone()).collect());

        let mut tx = self.store.begin(cmd.session).await?;

        let existing = tx.scan(&filter).await?;
        let score = SubCriterionScore::compute(weight, included.clone(), &existing);
        debug!(
            sub_criterion = %cmd.sub_criterion,
            rows = existing.len(),
            average = score.average,
            "Averaged sub-criterion grades"
        );

        let now = Utc::now();
        let mut inserted_rows = 0;
        for metric in &metrics {
            if tx
                .insert_if_absent(ScoreRow::zeroed(cmd.session, metric, now))
                .await?
            {
                inserted_rows += 1;
            }
        }

        let updated_rows = tx
            .update_sub_criterion_score(&cmd.sub_criterion, &included, score.score, now)
            .await?;
        let rows = tx.scan(&ScoreFilter::all().metrics(included)).await?;
        tx.commit().await?;

        info!(
            session = %cmd.session,
            sub_criterion = %cmd.sub_criterion,
            score = score.score,
            inserted_rows,
            updated_rows,
            "Recomputed sub-criterion score"
        );

        Ok(RecomputeSubCriterionResult {
            message: format!("Score sub_criteria updated for {}", cmd.sub_criterion.dotted()),
            score,
            inserted_rows,
            updated_rows,
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryScoreStore;
    use crate::domain::foundation::SubSubCriterionId;
    use crate::domain::scoring::ReferenceDataError;

    // ─────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────

    fn session() -> Session {
        Session::new(2025).unwrap()
    }

    fn sub(id: &str) -> SubCriterionId {
        SubCriterionId::parse(id).unwrap()
    }

    fn graded(metric: &str, grade: f64) -> ScoreRow {
        let entry = CriteriaCatalog::standard()
            .metric(&SubSubCriterionId::parse(metric).unwrap())
            .unwrap();
        let mut row = ScoreRow::zeroed(session(), entry, Utc::now());
        row.sub_sub_cr_grade = Some(grade);
        row
    }

    fn handler(store: &InMemoryScoreStore) -> RecomputeSubCriterionHandler {
        RecomputeSubCriterionHandler::new(
            Arc::new(store.clone()),
            Arc::new(CriteriaCatalog::standard().clone()),
            Arc::new(WeightTable::standard().clone()),
        )
    }

    fn command(id: &str) -> RecomputeSubCriterionCommand {
        RecomputeSubCriterionCommand {
            session: session(),
            sub_criterion: sub(id),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Tests
    // ─────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn averages_grades_and_applies_weight() {
        let store = InMemoryScoreStore::new();
        store.put(graded("2.1.1", 4.0)).await;
        store.put(graded("2.1.2", 3.0)).await;

        let result = handler(&store).handle(command("2.1")).await.unwrap();

        assert_eq!(result.score.average, 3.5);
        assert_eq!(result.score.score, 140.0);
        assert_eq!(result.inserted_rows, 0);
        assert_eq!(result.updated_rows, 2);
        assert!(result.rows.iter().all(|r| r.score_sub_criteria == 140.0));
        assert_eq!(result.message, "Score sub_criteria updated for 2.1");
    }

    #[tokio::test]
    async fn missing_rows_are_created_zeroed() {
        let store = InMemoryScoreStore::new();

        let result = handler(&store).handle(command("2.4")).await.unwrap();

        assert_eq!(result.score.average, 0.0);
        assert_eq!(result.score.score, 0.0);
        assert_eq!(result.inserted_rows, 3);
        assert_eq!(store.rows(session()).await.len(), 3);
    }

    #[tokio::test]
    async fn recompute_is_idempotent() {
        let store = InMemoryScoreStore::new();
        store.put(graded("2.1.1", 2.0)).await;

        let first = handler(&store).handle(command("2.1")).await.unwrap();
        let second = handler(&store).handle(command("2.1")).await.unwrap();

        assert_eq!(first.score.score, second.score.score);
        assert_eq!(second.inserted_rows, 0);
    }

    #[tokio::test]
    async fn seven_one_ten_contributes_to_seven_one() {
        let store = InMemoryScoreStore::new();
        store.put(graded("7.1.10", 4.0)).await;

        let result = handler(&store).handle(command("7.1")).await.unwrap();

        assert_eq!(result.score.average, 4.0);
        assert_eq!(result.score.score, 108.0);
    }

    #[tokio::test]
    async fn unweighted_sub_criterion_is_not_found() {
        let store = InMemoryScoreStore::new();
        let err = handler(&store).handle(command("2.5")).await.unwrap_err();
        assert!(matches!(err, ScoringError::CatalogNotFound(_)));
        assert!(store.rows(session()).await.is_empty());
    }

    #[tokio::test]
    async fn uncatalogued_includes_are_not_found() -> Result<(), ReferenceDataError> {
        let weights = WeightTable::from_yaml_str(
            r#"
criteria:
  - id: "1"
    denominator: 75
    weight_fraction: 1.0
sub_criteria:
  - id: "1.1"
    weight: 5
    includes: ["1.1.9"]
"#,
        )?;
        let store = InMemoryScoreStore::new();
        let handler = RecomputeSubCriterionHandler::new(
            Arc::new(store.clone()),
            Arc::new(CriteriaCatalog::standard().clone()),
            Arc::new(weights),
        );
        let err = handler.handle(command("1.1")).await.unwrap_err();
        assert!(matches!(err, ScoringError::CatalogNotFound(_)));
        Ok(())
    }
}
