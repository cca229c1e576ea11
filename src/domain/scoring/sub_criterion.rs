//! Sub-criterion score computation.

use serde::Serialize;

use crate::domain::foundation::{SubCriterionId, SubSubCriterionId};

use super::score_row::ScoreRow;
use super::weights::SubCriterionWeight;

/// Mean of the recorded raw grades, 0 when none are recorded.
///
/// Rows without a recorded grade (such as placeholder rows the engine
/// inserts) do not count; a recorded non-finite grade counts as 0.
pub fn mean_grade<'a>(rows: impl IntoIterator<Item = &'a ScoreRow>) -> f64 {
    let (sum, count) = rows
        .into_iter()
        .filter(|row| row.sub_sub_cr_grade.is_some())
        .fold((0.0, 0usize), |(sum, count), row| {
            (sum + row.grade_value(), count + 1)
        });
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Result of scoring one sub-criterion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubCriterionScore {
    pub sub_criterion: SubCriterionId,
    pub included: Vec<SubSubCriterionId>,
    pub average: f64,
    pub weight: f64,
    pub score: f64,
}

impl SubCriterionScore {
    /// Applies the weight to the mean grade of the included metrics' rows.
    ///
    /// `included` is the already-resolved set (configured and catalogued);
    /// rows for any other metric are ignored.
    pub fn compute(
        weight: &SubCriterionWeight,
        included: Vec<SubSubCriterionId>,
        rows: &[ScoreRow],
    ) -> Self {
        let average = mean_grade(rows.iter().filter(|row| {
            row.sub_sub_criteria_id
                .as_ref()
                .map(|id| included.contains(id))
                .unwrap_or(false)
        }));
        Self {
            sub_criterion: weight.id.clone(),
            included,
            average,
            weight: weight.weight,
            score: average * weight.weight,
        }
    }
}
