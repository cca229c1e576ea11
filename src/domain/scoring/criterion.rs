//! Criterion rollup and institution total.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::foundation::{CriterionId, Grade, SubCriterionId};

use super::catalog::CriteriaCatalog;
use super::grade_classifier::GradeBands;
use super::score_row::{finite_or_zero, ScoreRow, WEIGHTED_SCORE_SCALE};
use super::weights::CriterionWeight;

/// Result of rolling a criterion up from its sub-criteria.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionScore {
    pub criterion: CriterionId,
    /// Max contribution per sub-criterion.
    pub per_sub_criterion: BTreeMap<SubCriterionId, f64>,
    pub total_score: f64,
    pub normalized_score: f64,
    pub weighted_score: f64,
    /// `weighted_score` scaled to the persisted fixed-point form.
    pub stored_weighted_score: f64,
    pub grade: Grade,
    /// Rows that carried no sub-criterion and no catalogued metric.
    #[serde(skip)]
    pub ignored_rows: usize,
}

impl CriterionScore {
    /// Rolls the criterion's scored rows up into its normalized score.
    ///
    /// Only rows of this criterion with a positive contribution participate.
    /// A missing `sub_criteria_id` is back-filled from the catalog parent of
    /// the row's metric.
    pub fn compute(
        weight: &CriterionWeight,
        catalog: &CriteriaCatalog,
        bands: &GradeBands,
        rows: &[ScoreRow],
    ) -> Self {
        let mut per_sub_criterion: BTreeMap<SubCriterionId, f64> = BTreeMap::new();
        let mut ignored_rows = 0;

        for row in rows {
            if row.criteria_id != weight.id {
                continue;
            }
            let contribution = row.rollup_contribution();
            if contribution <= 0.0 {
                continue;
            }
            let sub = row.sub_criteria_id.clone().or_else(|| {
                row.sub_sub_criteria_id
                    .as_ref()
                    .and_then(|metric| catalog.parent_of(metric).cloned())
            });
            let Some(sub) = sub else {
                ignored_rows += 1;
                continue;
            };
            let entry = per_sub_criterion.entry(sub).or_insert(0.0);
            if contribution > *entry {
                *entry = contribution;
            }
        }

        let total_score: f64 = per_sub_criterion.values().sum();
        let normalized_score = total_score / weight.denominator;
        let weighted_score = normalized_score * weight.weight_fraction;

        Self {
            criterion: weight.id.clone(),
            per_sub_criterion,
            total_score,
            normalized_score,
            weighted_score,
            stored_weighted_score: weighted_score * WEIGHTED_SCORE_SCALE,
            grade: bands.classify(normalized_score),
            ignored_rows,
        }
    }
}

/// Institution-wide total across all criteria.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionTotal {
    /// Sum of per-criterion maxima, in the ×1000 fixed-point form.
    pub total: f64,
    pub grade: Grade,
    pub per_criterion_max: BTreeMap<CriterionId, f64>,
}

impl InstitutionTotal {
    /// Sums the maximum stored weighted score of every criterion.
    ///
    /// The sentinel row is excluded so recomputing is idempotent. Rows
    /// without sub-criterion or metric ids do not count.
    pub fn compute(rows: &[ScoreRow], bands: &GradeBands) -> Self {
        let mut per_criterion_max: BTreeMap<CriterionId, f64> = BTreeMap::new();

        for row in rows {
            if row.is_sentinel()
                || row.sub_criteria_id.is_none()
                || row.sub_sub_criteria_id.is_none()
            {
                continue;
            }
            let weighted = finite_or_zero(row.weighted_cr_score);
            if weighted <= 0.0 {
                continue;
            }
            let entry = per_criterion_max
                .entry(row.criteria_id.clone())
                .or_insert(0.0);
            if weighted > *entry {
                *entry = weighted;
            }
        }

        let total: f64 = per_criterion_max.values().sum();
        Self {
            total,
            grade: bands.classify(total / WEIGHTED_SCORE_SCALE),
            per_criterion_max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Session, SubSubCriterionId};
    use crate::domain::scoring::WeightTable;
    use chrono::Utc;
    use proptest::prelude::*;

    fn catalog() -> &'static CriteriaCatalog {
        CriteriaCatalog::standard()
    }

    fn row_for(metric: &str) -> ScoreRow {
        let entry = catalog()
            .metric(&SubSubCriterionId::parse(metric).unwrap())
            .unwrap();
        ScoreRow::zeroed(Session::new(2025).unwrap(), entry, Utc::now())
    }

    fn with_sub_score(metric: &str, score: f64) -> ScoreRow {
        let mut row = row_for(metric);
        row.score_sub_criteria = score;
        row
    }

    fn with_weighted(metric: &str, weighted: f64) -> ScoreRow {
        let mut row = row_for(metric);
        row.weighted_cr_score = weighted;
        row
    }

    fn criterion_weight(id: &str) -> CriterionWeight {
        WeightTable::standard()
            .criterion(&CriterionId::parse(id).unwrap())
            .unwrap()
            .clone()
    }

    #[test]
    fn criterion_one_full_marks_store_one_hundred() {
        let rows = vec![
            with_sub_score("1.1.3", 5.0),
            with_sub_score("1.2.1", 30.0),
            with_sub_score("1.2.2", 30.0),
            with_sub_score("1.3.2", 20.0),
            with_sub_score("1.4.1", 20.0),
        ];
        let score = CriterionScore::compute(
            &criterion_weight("1"),
            catalog(),
            &GradeBands::standard(),
            &rows,
        );
        assert_eq!(score.total_score, 75.0);
        assert!((score.normalized_score - 1.0).abs() < 1e-9);
        assert!((score.weighted_score - 0.1).abs() < 1e-9);
        assert!((score.stored_weighted_score - 100.0).abs() < 1e-9);
        assert_eq!(score.grade, Grade::C);
        assert_eq!(score.per_sub_criterion.len(), 4);
    }

    #[test]
    fn sub_sub_score_wins_when_larger() {
        let mut row = with_sub_score("2.1.1", 40.0);
        row.score_sub_sub_criteria = 90.0;
        let score = CriterionScore::compute(
            &criterion_weight("2"),
            catalog(),
            &GradeBands::standard(),
            &[row],
        );
        assert_eq!(score.total_score, 90.0);
    }

    #[test]
    fn missing_sub_criterion_is_back_filled_from_catalog() {
        let mut row = with_sub_score("2.4.2", 60.0);
        row.sub_criteria_id = None;
        let score = CriterionScore::compute(
            &criterion_weight("2"),
            catalog(),
            &GradeBands::standard(),
            &[row],
        );
        let sub = SubCriterionId::parse("2.4").unwrap();
        assert_eq!(score.per_sub_criterion.get(&sub), Some(&60.0));
        assert_eq!(score.ignored_rows, 0);
    }

    #[test]
    fn rows_without_any_hierarchy_id_are_ignored() {
        let mut row = with_sub_score("2.4.2", 60.0);
        row.sub_criteria_id = None;
        row.sub_sub_criteria_id = None;
        let score = CriterionScore::compute(
            &criterion_weight("2"),
            catalog(),
            &GradeBands::standard(),
            &[row],
        );
        assert_eq!(score.total_score, 0.0);
        assert_eq!(score.ignored_rows, 1);
    }

    #[test]
    fn rows_of_other_criteria_do_not_count() {
        let rows = vec![with_sub_score("1.1.3", 5.0), with_sub_score("2.1.1", 40.0)];
        let score = CriterionScore::compute(
            &criterion_weight("1"),
            catalog(),
            &GradeBands::standard(),
            &rows,
        );
        assert_eq!(score.total_score, 5.0);
    }

    #[test]
    fn institution_total_sums_per_criterion_maxima() {
        let rows = vec![
            with_weighted("1.1.3", 100.0),
            with_weighted("1.2.1", 100.0),
            with_weighted("2.1.1", 474.0),
            with_weighted("3.1.1", 200.0),
            with_weighted("4.1.3", 100.0),
            with_weighted("5.1.1", 100.0),
            with_weighted("6.2.3", 100.0),
            with_weighted("7.1.2", 100.0),
        ];
        let total = InstitutionTotal::compute(&rows, &GradeBands::standard());
        assert_eq!(total.total, 1174.0);
        assert_eq!(total.grade, Grade::C);
        assert_eq!(total.per_criterion_max.len(), 7);
    }

    #[test]
    fn sentinel_row_is_excluded_from_the_total() {
        let mut sentinel = ScoreRow::sentinel(Session::new(2025).unwrap(), Utc::now());
        sentinel.weighted_cr_score = 1174.0;
        let rows = vec![sentinel, with_weighted("1.1.3", 100.0)];
        let total = InstitutionTotal::compute(&rows, &GradeBands::standard());
        assert_eq!(total.total, 100.0);
    }

    #[test]
    fn rows_missing_ids_are_excluded_from_the_total() {
        let mut row = with_weighted("1.1.3", 100.0);
        row.sub_sub_criteria_id = None;
        let total = InstitutionTotal::compute(&[row], &GradeBands::standard());
        assert_eq!(total.total, 0.0);
        assert_eq!(total.grade, Grade::D);
    }

    proptest! {
        #[test]
        fn normalized_score_matches_sum_of_maxima(
            scores in proptest::collection::vec((0usize..4, 0.0f64..200.0), 0..20)
        ) {
            let metrics = ["1.1.3", "1.2.1", "1.3.2", "1.4.1"];
            let rows: Vec<ScoreRow> = scores
                .iter()
                .map(|(i, s)| with_sub_score(metrics[*i], *s))
                .collect();
            let mut expected = [0.0f64; 4];
            for (i, s) in &scores {
                if *s > expected[*i] {
                    expected[*i] = *s;
                }
            }
            let expected_total: f64 = expected.iter().sum();
            let score = CriterionScore::compute(
                &criterion_weight("1"),
                catalog(),
                &GradeBands::standard(),
                &rows,
            );
            prop_assert!((score.normalized_score - expected_total / 75.0).abs() < 1e-6);
        }
    }
}
