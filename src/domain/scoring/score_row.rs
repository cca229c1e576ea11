//! Score row - the unit of persisted scoring state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    CriteriaCode, CriterionId, Session, SubCriterionId, SubSubCriterionId,
};

use super::catalog::MetricEntry;

/// Fixed-point scale applied to `weighted_cr_score` on persistence.
pub const WEIGHTED_SCORE_SCALE: f64 = 1000.0;

/// Uniqueness key: at most one row per (criteria code, session, metric).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScoreKey {
    pub criteria_code: CriteriaCode,
    pub session: Session,
    pub sub_sub_criteria_id: Option<SubSubCriterionId>,
}

/// One persisted score row.
///
/// `sub_sub_cr_grade` is owned by data entry; every `score_*` field except
/// `score_sub_sub_criteria` is derived by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRow {
    pub session: Session,
    pub criteria_code: CriteriaCode,
    pub criteria_id: CriterionId,
    pub sub_criteria_id: Option<SubCriterionId>,
    pub sub_sub_criteria_id: Option<SubSubCriterionId>,
    pub sub_sub_cr_grade: Option<f64>,
    pub score_sub_sub_criteria: f64,
    pub score_sub_criteria: f64,
    pub score_criteria: f64,
    pub weighted_cr_score: f64,
    pub computed_at: DateTime<Utc>,
}

impl ScoreRow {
    /// A fresh row for a catalogued metric with every derived field zeroed.
    pub fn zeroed(session: Session, metric: &MetricEntry, now: DateTime<Utc>) -> Self {
        Self {
            session,
            criteria_code: metric.criteria_code.clone(),
            criteria_id: metric.id.criterion(),
            sub_criteria_id: Some(metric.id.sub_criterion()),
            sub_sub_criteria_id: Some(metric.id.clone()),
            sub_sub_cr_grade: None,
            score_sub_sub_criteria: 0.0,
            score_sub_criteria: 0.0,
            score_criteria: 0.0,
            weighted_cr_score: 0.0,
            computed_at: now,
        }
    }

    /// The institution-total row for a session.
    pub fn sentinel(session: Session, now: DateTime<Utc>) -> Self {
        Self {
            session,
            criteria_code: CriteriaCode::sentinel(),
            criteria_id: CriterionId::sentinel(),
            sub_criteria_id: Some(SubCriterionId::sentinel()),
            sub_sub_criteria_id: Some(SubSubCriterionId::sentinel()),
            sub_sub_cr_grade: None,
            score_sub_sub_criteria: 0.0,
            score_sub_criteria: 0.0,
            score_criteria: 0.0,
            weighted_cr_score: 0.0,
            computed_at: now,
        }
    }

    pub fn sentinel_key(session: Session) -> ScoreKey {
        ScoreKey {
            criteria_code: CriteriaCode::sentinel(),
            session,
            sub_sub_criteria_id: Some(SubSubCriterionId::sentinel()),
        }
    }

    pub fn key(&self) -> ScoreKey {
        ScoreKey {
            criteria_code: self.criteria_code.clone(),
            session: self.session,
            sub_sub_criteria_id: self.sub_sub_criteria_id.clone(),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.criteria_id.is_sentinel()
    }

    /// Raw grade, or 0 when absent or not a finite number.
    pub fn grade_value(&self) -> f64 {
        self.sub_sub_cr_grade
            .filter(|grade| grade.is_finite())
            .unwrap_or(0.0)
    }

    /// What this row contributes to its sub-criterion in a rollup.
    pub fn rollup_contribution(&self) -> f64 {
        finite_or_zero(self.score_sub_criteria).max(finite_or_zero(self.score_sub_sub_criteria))
    }
}

pub(crate) fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::scoring::CriteriaCatalog;

    fn session() -> Session {
        Session::new(2025).unwrap()
    }

    #[test]
    fn zeroed_row_takes_ids_from_catalog_entry() {
        let catalog = CriteriaCatalog::standard();
        let metric = catalog
            .metric(&SubSubCriterionId::parse("2.6.3").unwrap())
            .unwrap();
        let row = ScoreRow::zeroed(session(), metric, Utc::now());
        assert_eq!(row.criteria_code.as_str(), "020601030103");
        assert_eq!(row.criteria_id.as_str(), "02");
        assert_eq!(row.sub_criteria_id.unwrap().as_str(), "0206");
        assert_eq!(row.weighted_cr_score, 0.0);
        assert!(row.sub_sub_cr_grade.is_none());
    }

    #[test]
    fn sentinel_row_uses_reserved_ids() {
        let row = ScoreRow::sentinel(session(), Utc::now());
        assert!(row.is_sentinel());
        assert_eq!(row.key(), ScoreRow::sentinel_key(session()));
    }

    #[test]
    fn missing_or_non_finite_grades_count_as_zero() {
        let mut row = ScoreRow::sentinel(session(), Utc::now());
        assert_eq!(row.grade_value(), 0.0);
        row.sub_sub_cr_grade = Some(f64::NAN);
        assert_eq!(row.grade_value(), 0.0);
        row.sub_sub_cr_grade = Some(3.5);
        assert_eq!(row.grade_value(), 3.5);
    }

    #[test]
    fn rollup_contribution_takes_the_larger_score() {
        let mut row = ScoreRow::sentinel(session(), Utc::now());
        row.score_sub_criteria = 30.0;
        row.score_sub_sub_criteria = 12.0;
        assert_eq!(row.rollup_contribution(), 30.0);
        row.score_sub_sub_criteria = 45.0;
        assert_eq!(row.rollup_contribution(), 45.0);
    }
}
