//! Grade classification - maps a normalized score onto the grade ladder.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Grade;

use super::errors::ReferenceDataError;

/// Lower bound (inclusive) of one grade band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradeBand {
    pub grade: Grade,
    pub min: f64,
}

/// Ordered, non-overlapping threshold ladder.
///
/// Bands are evaluated highest first and the first band whose `min` the value
/// reaches wins; anything below every band (including NaN) is `floor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeBands {
    floor: Grade,
    bands: Vec<GradeBand>,
}

impl GradeBands {
    /// Builds a ladder, rejecting unordered or overlapping bands.
    pub fn new(floor: Grade, bands: Vec<GradeBand>) -> Result<Self, ReferenceDataError> {
        let ladder = Self { floor, bands };
        ladder.validate()?;
        Ok(ladder)
    }

    /// The institutional grade ladder (A++ ≥ 2.29 … C ≥ 0.98, else D).
    pub fn standard() -> Self {
        Self {
            floor: Grade::D,
            bands: vec![
                GradeBand { grade: Grade::APlusPlus, min: 2.29 },
                GradeBand { grade: Grade::APlus, min: 2.12 },
                GradeBand { grade: Grade::A, min: 1.96 },
                GradeBand { grade: Grade::BPlusPlus, min: 1.80 },
                GradeBand { grade: Grade::BPlus, min: 1.63 },
                GradeBand { grade: Grade::B, min: 1.31 },
                GradeBand { grade: Grade::C, min: 0.98 },
            ],
        }
    }

    pub fn classify(&self, value: f64) -> Grade {
        if value.is_nan() {
            return self.floor;
        }
        self.bands
            .iter()
            .find(|band| value >= band.min)
            .map(|band| band.grade)
            .unwrap_or(self.floor)
    }

    pub fn bands(&self) -> &[GradeBand] {
        &self.bands
    }

    pub fn floor(&self) -> Grade {
        self.floor
    }

    pub(crate) fn validate(&self) -> Result<(), ReferenceDataError> {
        let mut previous: Option<&GradeBand> = None;
        for band in &self.bands {
            if !band.min.is_finite() {
                return Err(ReferenceDataError::invalid(format!(
                    "grade band {} has a non-finite threshold",
                    band.grade
                )));
            }
            if let Some(prev) = previous {
                if band.min >= prev.min || band.grade >= prev.grade {
                    return Err(ReferenceDataError::invalid(format!(
                        "grade band {} must sit strictly below {}",
                        band.grade, prev.grade
                    )));
                }
            }
            previous = Some(band);
        }
        if let Some(lowest) = self.bands.last() {
            if self.floor >= lowest.grade {
                return Err(ReferenceDataError::invalid(format!(
                    "floor grade {} must be below {}",
                    self.floor, lowest.grade
                )));
            }
        }
        Ok(())
    }
}

impl Default for GradeBands {
    fn default() -> Self {
        Self::standard()
    }
}

/// Classifies with the standard ladder.
pub fn classify(value: f64) -> Grade {
    GradeBands::standard().classify(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn thresholds_are_inclusive() {
        let bands = GradeBands::standard();
        assert_eq!(bands.classify(2.29), Grade::APlusPlus);
        assert_eq!(bands.classify(2.2899), Grade::APlus);
        assert_eq!(bands.classify(1.96), Grade::A);
        assert_eq!(bands.classify(1.80), Grade::BPlusPlus);
        assert_eq!(bands.classify(1.63), Grade::BPlus);
        assert_eq!(bands.classify(1.31), Grade::B);
        assert_eq!(bands.classify(0.98), Grade::C);
        assert_eq!(bands.classify(0.979), Grade::D);
    }

    #[test]
    fn institution_total_of_1174_is_c() {
        assert_eq!(classify(1174.0 / 1000.0), Grade::C);
    }

    #[test]
    fn non_finite_values_still_classify() {
        let bands = GradeBands::standard();
        assert_eq!(bands.classify(f64::NAN), Grade::D);
        assert_eq!(bands.classify(f64::NEG_INFINITY), Grade::D);
        assert_eq!(bands.classify(f64::INFINITY), Grade::APlusPlus);
        assert_eq!(bands.classify(-3.0), Grade::D);
    }

    #[test]
    fn standard_ladder_is_valid() {
        assert!(GradeBands::standard().validate().is_ok());
    }

    #[test]
    fn unordered_bands_are_rejected() {
        let result = GradeBands::new(
            Grade::D,
            vec![
                GradeBand { grade: Grade::B, min: 1.0 },
                GradeBand { grade: Grade::A, min: 2.0 },
            ],
        );
        assert!(result.is_err());
    }

    #[test]
    fn floor_above_lowest_band_is_rejected() {
        let result = GradeBands::new(Grade::B, vec![GradeBand { grade: Grade::C, min: 1.0 }]);
        assert!(result.is_err());
    }

    proptest! {
        #[test]
        fn every_value_in_range_maps_to_a_known_grade(value in 0.0f64..=3.0) {
            let grade = classify(value);
            prop_assert!(Grade::ALL.contains(&grade));
        }

        #[test]
        fn classification_is_monotonic(a in 0.0f64..=3.0, b in 0.0f64..=3.0) {
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(classify(low) <= classify(high));
        }
    }
}
