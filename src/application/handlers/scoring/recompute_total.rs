//! RecomputeTotalHandler - Command handler for the institution-wide total.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::domain::foundation::Session;
use crate::domain::scoring::{InstitutionTotal, ScoreRow, ScoringError, WeightTable};
use crate::ports::{ScoreFilter, ScoreStore};

#[derive(Debug, Clone)]
pub struct RecomputeTotalCommand {
    pub session: Session,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecomputeTotalResult {
    #[serde(flatten)]
    pub total: InstitutionTotal,
    /// Whether the sentinel row was created by this call.
    pub created: bool,
    #[serde(skip)]
    pub message: String,
}

/// Handler for the institution total.
///
/// The grade is derived on every call and never persisted.
pub struct RecomputeTotalHandler {
    store: Arc<dyn ScoreStore>,
    weights: Arc<WeightTable>,
}

impl RecomputeTotalHandler {
    pub fn new(store: Arc<dyn ScoreStore>, weights: Arc<WeightTable>) -> Self {
        Self { store, weights }
    }

    pub async fn handle(
        &self,
        cmd: RecomputeTotalCommand,
    ) -> Result<RecomputeTotalResult, ScoringError> {
        let mut tx = self.store.begin(cmd.session).await?;

        let rows = tx
            .scan(&ScoreFilter::all().weighted_only().exclude_sentinel())
            .await?;
        let total = InstitutionTotal::compute(&rows, self.weights.grade_bands());

        let now = Utc::now();
        let created = tx
            .insert_if_absent(ScoreRow::sentinel(cmd.session, now))
            .await?;
        tx.update_total(total.total, now).await?;
        tx.commit().await?;

        info!(
            session = %cmd.session,
            total = total.total,
            grade = %total.grade,
            criteria = total.per_criterion_max.len(),
            "Recomputed institution total"
        );

        let message = if created {
            "Total weighted score created"
        } else {
            "Total weighted score updated"
        };

        Ok(RecomputeTotalResult {
            total,
            created,
            message: message.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryScoreStore;
    use crate::domain::foundation::{Grade, SubSubCriterionId};
    use crate::domain::scoring::CriteriaCatalog;

    fn session() -> Session {
        Session::new(2025).unwrap()
    }

    fn weighted(metric: &str, value: f64) -> ScoreRow {
        let entry = CriteriaCatalog::standard()
            .metric(&SubSubCriterionId::parse(metric).unwrap())
            .unwrap();
        let mut row = ScoreRow::zeroed(session(), entry, Utc::now());
        row.weighted_cr_score = value;
        row
    }

    fn handler(store: &InMemoryScoreStore) -> RecomputeTotalHandler {
        RecomputeTotalHandler::new(
            Arc::new(store.clone()),
            Arc::new(WeightTable::standard().clone()),
        )
    }

    async fn seed_scenario(store: &InMemoryScoreStore) {
        for (metric, value) in [
            ("1.1.3", 100.0),
            ("2.1.1", 474.0),
            ("3.1.1", 200.0),
            ("4.1.3", 100.0),
            ("5.1.1", 100.0),
            ("6.2.3", 100.0),
            ("7.1.2", 100.0),
        ] {
            store.put(weighted(metric, value)).await;
        }
    }

    #[tokio::test]
    async fn total_is_persisted_on_the_sentinel_row() {
        let store = InMemoryScoreStore::new();
        seed_scenario(&store).await;

        let result = handler(&store)
            .handle(RecomputeTotalCommand { session: session() })
            .await
            .unwrap();

        assert_eq!(result.total.total, 1174.0);
        assert_eq!(result.total.grade, Grade::C);
        assert!(result.created);
        assert_eq!(result.message, "Total weighted score created");

        let sentinel = store
            .rows(session())
            .await
            .into_iter()
            .find(|row| row.is_sentinel())
            .unwrap();
        assert_eq!(sentinel.weighted_cr_score, 1174.0);
    }

    #[tokio::test]
    async fn repeated_totals_are_idempotent() {
        let store = InMemoryScoreStore::new();
        seed_scenario(&store).await;

        let first = handler(&store)
            .handle(RecomputeTotalCommand { session: session() })
            .await
            .unwrap();
        let second = handler(&store)
            .handle(RecomputeTotalCommand { session: session() })
            .await
            .unwrap();

        assert_eq!(first.total.total, second.total.total);
        assert!(!second.created);
        assert_eq!(second.message, "Total weighted score updated");
    }

    #[tokio::test]
    async fn empty_session_totals_zero() {
        let store = InMemoryScoreStore::new();
        let result = handler(&store)
            .handle(RecomputeTotalCommand { session: session() })
            .await
            .unwrap();
        assert_eq!(result.total.total, 0.0);
        assert_eq!(result.total.grade, Grade::D);
    }
}
