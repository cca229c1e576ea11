//! Reporting query handlers - read-only views over persisted scores.

mod desired_grade;
mod get_college_summary;
mod get_radar_report;

pub use desired_grade::DesiredGradePolicy;
pub use get_college_summary::{GetCollegeSummaryHandler, GetCollegeSummaryQuery};
pub use get_radar_report::{GetRadarReportHandler, GetRadarReportQuery};
