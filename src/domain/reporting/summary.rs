//! College summary report - per-criterion progress against the desired grade.

use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

use crate::domain::foundation::{CriterionId, Grade, Session};
use crate::domain::scoring::{
    CriteriaCatalog, ScoreRow, WeightTable, DEFAULT_SUB_CRITERION_TARGET, WEIGHTED_SCORE_SCALE,
};

use super::{finite, round_to};

pub const NEAR_TARGET: &str = "Near Target";
pub const BELOW_TARGET: &str = "Below Target";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryReport {
    pub institution_id: i64,
    pub session: Session,
    pub desired_grade: Grade,
    /// Institution total on the 0–4 scale.
    #[serde(rename = "currentGPA")]
    pub current_gpa: f64,
    #[serde(rename = "targetGPA")]
    pub target_gpa: f64,
    pub grade: Grade,
    pub criteria: Vec<CriterionSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionSummary {
    pub id: u32,
    pub title: String,
    /// Weighted criterion score.
    pub score: f64,
    pub target: f64,
    pub status: &'static str,
    pub gpa: f64,
    pub grade: Grade,
    pub average_grade: f64,
    pub subcriteria: Vec<SubCriterionSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubCriterionSummary {
    pub code: String,
    pub title: String,
    pub score: f64,
    pub target: f64,
    pub target_percentage: f64,
    pub sub_sub_criteria: Vec<MetricSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSummary {
    pub code: String,
    pub title: String,
    pub score: f64,
}

/// Builds [`SummaryReport`]s from a session's rows.
pub struct SummaryReportBuilder<'a> {
    catalog: &'a CriteriaCatalog,
    weights: &'a WeightTable,
}

impl<'a> SummaryReportBuilder<'a> {
    pub fn new(catalog: &'a CriteriaCatalog, weights: &'a WeightTable) -> Self {
        Self { catalog, weights }
    }

    /// Builds the report.
    ///
    /// # Edge Cases
    ///
    /// - Criteria present in the rows but not in the catalog are skipped
    /// - A sub-criterion with no configured target uses
    ///   [`DEFAULT_SUB_CRITERION_TARGET`]
    /// - A missing sentinel row yields a current GPA of 0
    pub fn build(
        &self,
        institution_id: i64,
        session: Session,
        desired_grade: Grade,
        rows: &[ScoreRow],
    ) -> SummaryReport {
        let present: BTreeSet<&CriterionId> = rows
            .iter()
            .filter(|row| !row.is_sentinel())
            .map(|row| &row.criteria_id)
            .collect();

        let criteria = present
            .into_iter()
            .filter_map(|id| self.criterion_summary(id, desired_grade, rows))
            .collect();

        let total = rows
            .iter()
            .filter(|row| row.is_sentinel())
            .map(|row| finite(row.weighted_cr_score))
            .fold(0.0, f64::max);
        let current_gpa = round_to(total / WEIGHTED_SCORE_SCALE, 3);

        let target_gpa = self
            .weights
            .institution_target(desired_grade)
            .or_else(|| self.weights.institution_target(Grade::A))
            .map(|target| target.gpa)
            .unwrap_or(0.0);

        SummaryReport {
            institution_id,
            session,
            desired_grade,
            current_gpa,
            target_gpa,
            grade: self.weights.grade_bands().classify(current_gpa),
            criteria,
        }
    }

    fn criterion_summary(
        &self,
        id: &CriterionId,
        desired_grade: Grade,
        rows: &[ScoreRow],
    ) -> Option<CriterionSummary> {
        let entry = self.catalog.criterion(id)?;
        let criterion_rows: Vec<&ScoreRow> =
            rows.iter().filter(|row| &row.criteria_id == id).collect();

        let subcriteria = self
            .catalog
            .sub_criteria_of(id)
            .into_iter()
            .map(|sub| {
                let metrics: Vec<MetricSummary> = self
                    .catalog
                    .metrics_of(&sub.id)
                    .into_iter()
                    .map(|metric| {
                        let score = criterion_rows
                            .iter()
                            .find(|row| row.sub_sub_criteria_id.as_ref() == Some(&metric.id))
                            .map(|row| finite(row.score_sub_sub_criteria))
                            .unwrap_or(0.0);
                        MetricSummary {
                            code: metric.id.dotted(),
                            title: metric.name.clone(),
                            score,
                        }
                    })
                    .collect();
                let score: f64 = metrics.iter().map(|m| m.score).sum();
                let target = self
                    .weights
                    .sub_criterion_target(&sub.id, desired_grade)
                    .unwrap_or_else(|| {
                        debug!(
                            sub_criterion = %sub.id,
                            grade = %desired_grade,
                            "No configured target, using default"
                        );
                        DEFAULT_SUB_CRITERION_TARGET
                    });
                let target_percentage = if score == 0.0 {
                    0.0
                } else {
                    round_to(score / target * 100.0, 2)
                };
                SubCriterionSummary {
                    code: sub.id.dotted(),
                    title: sub.name.clone(),
                    score: round_to(score, 2),
                    target,
                    target_percentage,
                    sub_sub_criteria: metrics,
                }
            })
            .collect();

        let weighted = criterion_rows
            .iter()
            .map(|row| finite(row.weighted_cr_score))
            .fold(0.0, f64::max);
        let score = round_to(weighted / WEIGHTED_SCORE_SCALE, 3);
        let gpa = criterion_rows
            .iter()
            .map(|row| finite(row.score_criteria))
            .fold(0.0, f64::max);

        // Every row counts here, ungraded ones as 0.
        let average_grade = if criterion_rows.is_empty() {
            0.0
        } else {
            criterion_rows.iter().map(|row| row.grade_value()).sum::<f64>()
                / criterion_rows.len() as f64
        };

        let target = self
            .weights
            .institution_target(desired_grade)
            .or_else(|| self.weights.institution_target(Grade::A))
            .map(|target| target.score)
            .unwrap_or(0.0);

        Some(CriterionSummary {
            id: id.ordinal(),
            title: entry.name.clone(),
            score,
            target,
            status: if score >= target { NEAR_TARGET } else { BELOW_TARGET },
            gpa,
            grade: self.weights.grade_bands().classify(gpa),
            average_grade: round_to(average_grade, 2),
            subcriteria,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::SubSubCriterionId;
    use chrono::Utc;

    fn session() -> Session {
        Session::new(2025).unwrap()
    }

    fn row(metric: &str) -> ScoreRow {
        let entry = CriteriaCatalog::standard()
            .metric(&SubSubCriterionId::parse(metric).unwrap())
            .unwrap();
        ScoreRow::zeroed(session(), entry, Utc::now())
    }

    fn builder() -> SummaryReportBuilder<'static> {
        SummaryReportBuilder::new(CriteriaCatalog::standard(), WeightTable::standard())
    }

    fn sample_rows() -> Vec<ScoreRow> {
        let mut a = row("2.1.1");
        a.sub_sub_cr_grade = Some(4.0);
        a.score_sub_sub_criteria = 50.0;
        a.score_criteria = 2.1;
        a.weighted_cr_score = 630.0;
        let mut b = row("2.1.2");
        b.sub_sub_cr_grade = Some(3.0);
        b.score_sub_sub_criteria = 31.6;
        b.score_criteria = 2.1;
        b.weighted_cr_score = 630.0;
        let mut total = ScoreRow::sentinel(session(), Utc::now());
        total.weighted_cr_score = 1174.0;
        vec![a, b, total]
    }

    #[test]
    fn criterion_scores_come_from_weighted_rows() {
        let report = builder().build(1, session(), Grade::A, &sample_rows());
        assert_eq!(report.criteria.len(), 1);
        let c2 = &report.criteria[0];
        assert_eq!(c2.id, 2);
        assert_eq!(c2.score, 0.63);
        assert_eq!(c2.target, 0.612);
        assert_eq!(c2.status, NEAR_TARGET);
        assert_eq!(c2.gpa, 2.1);
        assert_eq!(c2.grade, Grade::A);
        assert_eq!(c2.average_grade, 3.5);
    }

    #[test]
    fn sub_criterion_progress_uses_grade_targets() {
        let report = builder().build(1, session(), Grade::A, &sample_rows());
        let s21 = &report.criteria[0].subcriteria[0];
        assert_eq!(s21.code, "2.1");
        assert_eq!(s21.score, 81.6);
        assert_eq!(s21.target, 81.6);
        assert_eq!(s21.target_percentage, 100.0);
        assert_eq!(s21.sub_sub_criteria.len(), 2);
    }

    #[test]
    fn unlisted_sub_criterion_target_defaults_to_one_hundred() {
        let mut rows = sample_rows();
        let mut one = row("1.1.3");
        one.score_sub_sub_criteria = 2.0;
        rows.push(one);
        let report = builder().build(1, session(), Grade::A, &rows);
        let s11 = &report.criteria[0].subcriteria[0];
        assert_eq!(s11.target, DEFAULT_SUB_CRITERION_TARGET);
        assert_eq!(s11.target_percentage, 2.0);
    }

    #[test]
    fn zero_score_has_zero_target_percentage() {
        let report = builder().build(1, session(), Grade::A, &sample_rows());
        let s27 = report.criteria[0]
            .subcriteria
            .iter()
            .find(|s| s.code == "2.7")
            .unwrap();
        assert_eq!(s27.score, 0.0);
        assert_eq!(s27.target_percentage, 0.0);
    }

    #[test]
    fn criterion_target_is_the_institution_score_for_the_grade() {
        let mut one = row("1.1.3");
        one.weighted_cr_score = 300.0;
        let report = builder().build(1, session(), Grade::A, &[one]);
        let c1 = report.criteria.iter().find(|c| c.id == 1).unwrap();
        assert_eq!(c1.score, 0.3);
        assert_eq!(c1.target, 0.612);
        assert_eq!(c1.status, BELOW_TARGET);
    }

    #[test]
    fn desired_grade_d_uses_c_sub_targets_and_d_institution_target() {
        let report = builder().build(1, session(), Grade::D, &sample_rows());
        let c2 = &report.criteria[0];
        assert_eq!(c2.subcriteria[0].target, 45.8);
        assert_eq!(c2.target, 0.24);
        assert_eq!(report.target_gpa, 0.49);
    }

    #[test]
    fn report_level_gpa_comes_from_sentinel() {
        let report = builder().build(7, session(), Grade::A, &sample_rows());
        assert_eq!(report.institution_id, 7);
        assert_eq!(report.current_gpa, 1.174);
        assert_eq!(report.target_gpa, 2.04);
        assert_eq!(report.grade, Grade::C);
    }

    #[test]
    fn empty_session_yields_empty_report() {
        let report = builder().build(1, session(), Grade::A, &[]);
        assert!(report.criteria.is_empty());
        assert_eq!(report.current_gpa, 0.0);
        assert_eq!(report.grade, Grade::D);
    }

    #[test]
    fn serializes_with_original_field_names() {
        let report = builder().build(1, session(), Grade::A, &sample_rows());
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("currentGPA").is_some());
        assert!(json.get("targetGPA").is_some());
        assert!(json["criteria"][0].get("averageGrade").is_some());
        assert!(json["criteria"][0]["subcriteria"][0]
            .get("targetPercentage")
            .is_some());
    }
}
