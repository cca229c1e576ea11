//! GetRadarReportHandler - Query handler for the radar chart.

use std::sync::Arc;

use crate::domain::foundation::{Grade, Session};
use crate::domain::reporting::{RadarReport, RadarReportBuilder};
use crate::domain::scoring::{CriteriaCatalog, ScoringError, WeightTable};
use crate::ports::{ScoreFilter, ScoreStore};

use super::DesiredGradePolicy;

#[derive(Debug, Clone)]
pub struct GetRadarReportQuery {
    pub session: Session,
    pub desired_grade: Option<Grade>,
}

pub struct GetRadarReportHandler {
    store: Arc<dyn ScoreStore>,
    desired_grade: DesiredGradePolicy,
    catalog: Arc<CriteriaCatalog>,
    weights: Arc<WeightTable>,
}

impl GetRadarReportHandler {
    pub fn new(
        store: Arc<dyn ScoreStore>,
        desired_grade: DesiredGradePolicy,
        catalog: Arc<CriteriaCatalog>,
        weights: Arc<WeightTable>,
    ) -> Self {
        Self {
            store,
            desired_grade,
            catalog,
            weights,
        }
    }

    pub async fn handle(&self, query: GetRadarReportQuery) -> Result<RadarReport, ScoringError> {
        let grade = self.desired_grade.resolve(query.desired_grade).await?;
        let rows = self
            .store
            .scan(query.session, &ScoreFilter::all().exclude_sentinel())
            .await?;

        Ok(RadarReportBuilder::new(&self.catalog, &self.weights).build(grade, &rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryScoreStore, StaticDesiredGrade};
    use crate::domain::foundation::SubSubCriterionId;
    use crate::domain::scoring::ScoreRow;
    use chrono::Utc;

    #[tokio::test]
    async fn plots_stored_weighted_scores_against_targets() {
        let session = Session::new(2025).unwrap();
        let store = InMemoryScoreStore::new();
        let entry = CriteriaCatalog::standard()
            .metric(&SubSubCriterionId::parse("1.1.3").unwrap())
            .unwrap();
        let mut row = ScoreRow::zeroed(session, entry, Utc::now());
        row.weighted_cr_score = 100.0;
        store.put(row).await;

        let handler = GetRadarReportHandler::new(
            Arc::new(store.clone()),
            DesiredGradePolicy::new(Arc::new(StaticDesiredGrade::default()), Grade::A),
            Arc::new(CriteriaCatalog::standard().clone()),
            Arc::new(WeightTable::standard().clone()),
        );
        let report = handler
            .handle(GetRadarReportQuery {
                session,
                desired_grade: None,
            })
            .await
            .unwrap();

        assert_eq!(report.criteria.len(), 7);
        assert_eq!(report.scores[0].values[0], 0.1);
        assert_eq!(report.scores[1].values[0], 0.204);
    }
}
