//! GetCollegeSummaryHandler - Query handler for the college summary report.

use std::sync::Arc;

use crate::domain::foundation::{Grade, Session};
use crate::domain::reporting::{SummaryReport, SummaryReportBuilder};
use crate::domain::scoring::{CriteriaCatalog, ScoringError, WeightTable};
use crate::ports::{ScoreFilter, ScoreStore};

use super::DesiredGradePolicy;

#[derive(Debug, Clone)]
pub struct GetCollegeSummaryQuery {
    pub session: Session,
    /// Overrides the declared desired grade when set.
    pub desired_grade: Option<Grade>,
}

pub struct GetCollegeSummaryHandler {
    store: Arc<dyn ScoreStore>,
    desired_grade: DesiredGradePolicy,
    catalog: Arc<CriteriaCatalog>,
    weights: Arc<WeightTable>,
    institution_id: i64,
}

impl GetCollegeSummaryHandler {
    pub fn new(
        store: Arc<dyn ScoreStore>,
        desired_grade: DesiredGradePolicy,
        catalog: Arc<CriteriaCatalog>,
        weights: Arc<WeightTable>,
        institution_id: i64,
    ) -> Self {
        Self {
            store,
            desired_grade,
            catalog,
            weights,
            institution_id,
        }
    }

    pub async fn handle(&self, query: GetCollegeSummaryQuery) -> Result<SummaryReport, ScoringError> {
        let grade = self.desired_grade.resolve(query.desired_grade).await?;
        let rows = self.store.scan(query.session, &ScoreFilter::all()).await?;

        Ok(SummaryReportBuilder::new(&self.catalog, &self.weights).build(
            self.institution_id,
            query.session,
            grade,
            &rows,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryScoreStore, StaticDesiredGrade};
    use crate::domain::foundation::SubSubCriterionId;
    use crate::domain::scoring::ScoreRow;
    use crate::ports::{DesiredGradeReader, StoreError};
    use async_trait::async_trait;
    use chrono::Utc;

    // ─────────────────────────────────────────────────────────────────────
    // Mock Implementation
    // ─────────────────────────────────────────────────────────────────────

    struct FailingReader;

    #[async_trait]
    impl DesiredGradeReader for FailingReader {
        async fn desired_grade(&self) -> Result<Option<Grade>, StoreError> {
            Err(StoreError::Database("Simulated failure".to_string()))
        }
    }

    fn session() -> Session {
        Session::new(2025).unwrap()
    }

    fn handler(
        store: &InMemoryScoreStore,
        reader: Arc<dyn DesiredGradeReader>,
    ) -> GetCollegeSummaryHandler {
        GetCollegeSummaryHandler::new(
            Arc::new(store.clone()),
            DesiredGradePolicy::new(reader, Grade::A),
            Arc::new(CriteriaCatalog::standard().clone()),
            Arc::new(WeightTable::standard().clone()),
            1,
        )
    }

    #[tokio::test]
    async fn report_uses_declared_grade_when_not_overridden() {
        let store = InMemoryScoreStore::new();
        let entry = CriteriaCatalog::standard()
            .metric(&SubSubCriterionId::parse("2.1.1").unwrap())
            .unwrap();
        store.put(ScoreRow::zeroed(session(), entry, Utc::now())).await;

        let report = handler(&store, Arc::new(StaticDesiredGrade::new(Some(Grade::B))))
            .handle(GetCollegeSummaryQuery {
                session: session(),
                desired_grade: None,
            })
            .await
            .unwrap();

        assert_eq!(report.desired_grade, Grade::B);
        assert_eq!(report.target_gpa, 1.47);
        assert_eq!(report.criteria.len(), 1);
    }

    #[tokio::test]
    async fn override_skips_the_reader() {
        let store = InMemoryScoreStore::new();
        let report = handler(&store, Arc::new(FailingReader))
            .handle(GetCollegeSummaryQuery {
                session: session(),
                desired_grade: Some(Grade::APlusPlus),
            })
            .await
            .unwrap();
        assert_eq!(report.desired_grade, Grade::APlusPlus);
    }

    #[tokio::test]
    async fn reader_failure_surfaces_as_store_error() {
        let store = InMemoryScoreStore::new();
        let err = handler(&store, Arc::new(FailingReader))
            .handle(GetCollegeSummaryQuery {
                session: session(),
                desired_grade: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ScoringError::Store(_)));
    }
}
