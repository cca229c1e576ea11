//! PostgreSQL implementation of DesiredGradeReader.
//!
//! Reads the grade declared on the institution's most recent IIQA form.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::Grade;
use crate::ports::{DesiredGradeReader, StoreError};

#[derive(Clone)]
pub struct PostgresDesiredGradeReader {
    pool: PgPool,
    institution_id: i64,
}

impl PostgresDesiredGradeReader {
    pub fn new(pool: PgPool, institution_id: i64) -> Self {
        Self {
            pool,
            institution_id,
        }
    }
}

#[async_trait]
impl DesiredGradeReader for PostgresDesiredGradeReader {
    async fn desired_grade(&self) -> Result<Option<Grade>, StoreError> {
        let declared: Option<(Option<String>,)> = sqlx::query_as(
            r#"
            SELECT desired_grade
            FROM iiqa_form
            WHERE institution_id = $1
            ORDER BY year_filled DESC
            LIMIT 1
            "#,
        )
        .bind(self.institution_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to read desired grade: {}", e)))?;

        let Some(raw) = declared.and_then(|(grade,)| grade) else {
            return Ok(None);
        };

        match raw.parse::<Grade>() {
            Ok(grade) => Ok(Some(grade)),
            Err(e) => {
                tracing::warn!(
                    institution_id = self.institution_id,
                    value = %raw,
                    error = %e,
                    "Ignoring unrecognised desired grade"
                );
                Ok(None)
            }
        }
    }
}
