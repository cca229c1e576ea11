//! Reporting module - read-only views over persisted scores.
//!
//! - `summary` - per-criterion progress against the desired grade
//! - `radar` - current vs. target weighted score per criterion

mod radar;
mod summary;

pub use radar::{RadarAxis, RadarReport, RadarReportBuilder, RadarSeries};
pub use summary::{
    CriterionSummary, MetricSummary, SubCriterionSummary, SummaryReport, SummaryReportBuilder,
    BELOW_TARGET, NEAR_TARGET,
};

/// Rounds half away from zero to `places` decimals.
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn finite(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_to_keeps_requested_places() {
        assert_eq!(round_to(1.17449, 3), 1.174);
        assert_eq!(round_to(99.999, 2), 100.0);
        assert_eq!(round_to(0.0, 2), 0.0);
    }
}
