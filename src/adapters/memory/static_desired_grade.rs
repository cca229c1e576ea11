//! Static Desired Grade Adapter
//!
//! Serves a grade fixed at startup, typically from configuration.

use async_trait::async_trait;

use crate::domain::foundation::Grade;
use crate::ports::{DesiredGradeReader, StoreError};

#[derive(Debug, Clone, Copy, Default)]
pub struct StaticDesiredGrade {
    grade: Option<Grade>,
}

impl StaticDesiredGrade {
    pub fn new(grade: Option<Grade>) -> Self {
        Self { grade }
    }
}

#[async_trait]
impl DesiredGradeReader for StaticDesiredGrade {
    async fn desired_grade(&self) -> Result<Option<Grade>, StoreError> {
        Ok(self.grade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_configured_grade() {
        let reader = StaticDesiredGrade::new(Some(Grade::BPlusPlus));
        assert_eq!(reader.desired_grade().await.unwrap(), Some(Grade::BPlusPlus));
        assert_eq!(StaticDesiredGrade::default().desired_grade().await.unwrap(), None);
    }
}
