//! Radar chart report - current vs. target weighted score per criterion.

use serde::Serialize;

use crate::domain::foundation::Grade;
use crate::domain::scoring::{CriteriaCatalog, ScoreRow, WeightTable, WEIGHTED_SCORE_SCALE};

use super::finite;

pub const CURRENT_SERIES: &str = "Current Score";
pub const TARGET_SERIES: &str = "Target Score";

/// Criteria ordinals plotted on the chart.
const PLOTTED: std::ops::RangeInclusive<u32> = 1..=7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarAxis {
    pub id: u32,
    pub name: String,
    pub max: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarSeries {
    pub name: &'static str,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarReport {
    pub criteria: Vec<RadarAxis>,
    pub scores: Vec<RadarSeries>,
}

pub struct RadarReportBuilder<'a> {
    catalog: &'a CriteriaCatalog,
    weights: &'a WeightTable,
}

impl<'a> RadarReportBuilder<'a> {
    pub fn new(catalog: &'a CriteriaCatalog, weights: &'a WeightTable) -> Self {
        Self { catalog, weights }
    }

    /// One axis per catalogued criterion 1–7; values line up with `criteria`.
    pub fn build(&self, desired_grade: Grade, rows: &[ScoreRow]) -> RadarReport {
        let mut criteria = Vec::new();
        let mut current = Vec::new();
        let mut target = Vec::new();

        for entry in self
            .catalog
            .criteria()
            .filter(|entry| PLOTTED.contains(&entry.id.ordinal()))
        {
            criteria.push(RadarAxis {
                id: entry.id.ordinal(),
                name: entry.name.clone(),
                max: 1,
            });

            let weighted = rows
                .iter()
                .filter(|row| row.criteria_id == entry.id)
                .map(|row| finite(row.weighted_cr_score))
                .fold(0.0, f64::max);
            current.push((weighted / WEIGHTED_SCORE_SCALE).clamp(0.0, 100.0));

            target.push(
                self.weights
                    .criterion_target(&entry.id, desired_grade)
                    .unwrap_or(0.0),
            );
        }

        RadarReport {
            criteria,
            scores: vec![
                RadarSeries {
                    name: CURRENT_SERIES,
                    values: current,
                },
                RadarSeries {
                    name: TARGET_SERIES,
                    values: target,
                },
            ],
        }
    }
}
