//! Scoring configuration: reference data overrides and report defaults.

use serde::Deserialize;
use std::path::PathBuf;
use tracing::info;

use super::error::ValidationError;
use crate::domain::foundation::Grade;
use crate::domain::scoring::{CriteriaCatalog, ReferenceDataError, WeightTable};

/// Where the reports find the institution's desired grade.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DesiredGradeSource {
    /// No declared grade; reports fall back to `default_desired_grade`.
    #[default]
    Static,
    /// Latest `iiqa_form` row for `institution_id`.
    Database,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    /// YAML catalog replacing the built-in one
    pub catalog_path: Option<PathBuf>,

    /// YAML weight table replacing the built-in one
    pub weights_path: Option<PathBuf>,

    #[serde(default = "default_desired_grade")]
    pub default_desired_grade: Grade,

    #[serde(default = "default_institution_id")]
    pub institution_id: i64,

    #[serde(default)]
    pub desired_grade_source: DesiredGradeSource,
}

impl ScoringConfig {
    pub fn load_catalog(&self) -> Result<CriteriaCatalog, ReferenceDataError> {
        match &self.catalog_path {
            Some(path) => {
                info!(path = %path.display(), "Loading criteria catalog");
                CriteriaCatalog::from_path(path)
            }
            None => Ok(CriteriaCatalog::standard().clone()),
        }
    }

    /// Loads the weight table and checks it against `catalog`.
    pub fn load_weights(&self, catalog: &CriteriaCatalog) -> Result<WeightTable, ReferenceDataError> {
        let weights = match &self.weights_path {
            Some(path) => {
                info!(path = %path.display(), "Loading weight table");
                WeightTable::from_path(path)?
            }
            None => WeightTable::standard().clone(),
        };
        weights.validate_against(catalog)?;
        Ok(weights)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.institution_id <= 0 {
            return Err(ValidationError::InvalidInstitutionId(self.institution_id));
        }
        Ok(())
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            weights_path: None,
            default_desired_grade: default_desired_grade(),
            institution_id: default_institution_id(),
            desired_grade_source: DesiredGradeSource::default(),
        }
    }
}

fn default_desired_grade() -> Grade {
    Grade::A
}

fn default_institution_id() -> i64 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_use_built_in_reference_data() {
        let config = ScoringConfig::default();
        assert_eq!(config.default_desired_grade, Grade::A);
        assert_eq!(config.desired_grade_source, DesiredGradeSource::Static);

        let catalog = config.load_catalog().unwrap();
        assert!(config.load_weights(&catalog).is_ok());
    }

    #[test]
    fn non_positive_institution_is_rejected() {
        let config = ScoringConfig {
            institution_id: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidInstitutionId(0))
        ));
    }

    #[test]
    fn weights_file_is_validated_against_the_catalog() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(
            file,
            r#"
criteria:
  - id: "1"
    denominator: 75
    weight_fraction: 1.0
sub_criteria:
  - id: "1.1"
    weight: 5
    includes: ["1.2.1"]
"#
        )
        .unwrap();

        let config = ScoringConfig {
            weights_path: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let catalog = config.load_catalog().unwrap();
        assert!(config.load_weights(&catalog).is_err());
    }

    #[test]
    fn missing_catalog_file_is_an_io_error() {
        let config = ScoringConfig {
            catalog_path: Some(PathBuf::from("/nonexistent/catalog.yaml")),
            ..Default::default()
        };
        assert!(matches!(
            config.load_catalog(),
            Err(ReferenceDataError::Io { .. })
        ));
    }
}
