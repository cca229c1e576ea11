//! Desired grade resolution shared by the report handlers.

use std::sync::Arc;
use tracing::debug;

use crate::domain::foundation::Grade;
use crate::ports::{DesiredGradeReader, StoreError};

/// Picks the grade a report compares against: the request override, then the
/// institution's declared grade, then the configured default.
#[derive(Clone)]
pub struct DesiredGradePolicy {
    reader: Arc<dyn DesiredGradeReader>,
    default_grade: Grade,
}

impl DesiredGradePolicy {
    pub fn new(reader: Arc<dyn DesiredGradeReader>, default_grade: Grade) -> Self {
        Self {
            reader,
            default_grade,
        }
    }

    pub async fn resolve(&self, requested: Option<Grade>) -> Result<Grade, StoreError> {
        if let Some(grade) = requested {
            return Ok(grade);
        }
        match self.reader.desired_grade().await? {
            Some(grade) => Ok(grade),
            None => {
                debug!(default = %self.default_grade, "No declared desired grade, using default");
                Ok(self.default_grade)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::StaticDesiredGrade;

    fn policy(declared: Option<Grade>) -> DesiredGradePolicy {
        DesiredGradePolicy::new(Arc::new(StaticDesiredGrade::new(declared)), Grade::A)
    }

    #[tokio::test]
    async fn request_override_wins() {
        let grade = policy(Some(Grade::B)).resolve(Some(Grade::APlus)).await.unwrap();
        assert_eq!(grade, Grade::APlus);
    }

    #[tokio::test]
    async fn declared_grade_beats_default() {
        assert_eq!(policy(Some(Grade::B)).resolve(None).await.unwrap(), Grade::B);
    }

    #[tokio::test]
    async fn falls_back_to_default() {
        assert_eq!(policy(None).resolve(None).await.unwrap(), Grade::A);
    }
}
