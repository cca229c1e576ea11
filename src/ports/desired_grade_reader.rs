//! Desired Grade Reader Port - the institution's declared aspiration grade.

use async_trait::async_trait;

use crate::domain::foundation::Grade;

use super::StoreError;

/// Read-only port for the grade an institution is aiming for.
#[async_trait]
pub trait DesiredGradeReader: Send + Sync {
    /// Returns the most recently declared grade.
    ///
    /// # Returns
    ///
    /// `None` when the institution has not declared one.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backing source cannot be read.
    async fn desired_grade(&self) -> Result<Option<Grade>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Option<Grade>);

    #[async_trait]
    impl DesiredGradeReader for Fixed {
        async fn desired_grade(&self) -> Result<Option<Grade>, StoreError> {
            Ok(self.0)
        }
    }

    #[tokio::test]
    async fn trait_is_usable_as_object() {
        let reader: Box<dyn DesiredGradeReader> = Box::new(Fixed(Some(Grade::BPlus)));
        assert_eq!(reader.desired_grade().await.unwrap(), Some(Grade::BPlus));
    }
}
