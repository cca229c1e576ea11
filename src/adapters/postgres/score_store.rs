//! PostgreSQL implementation of ScoreStore.
//!
//! Each transaction takes a transaction-scoped advisory lock keyed by the
//! session, so recomputes on the same session queue behind each other while
//! different sessions run concurrently. An uncommitted transaction rolls back
//! when dropped.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row, Transaction};

use crate::domain::foundation::{
    CriteriaCode, CriterionId, Session, SubCriterionId, SubSubCriterionId,
};
use crate::domain::scoring::ScoreRow;
use crate::ports::{ScoreFilter, ScoreStore, ScoreTransaction, StoreError};

/// First key of the two-key advisory lock; the second is the session year.
const SCORE_LOCK_NAMESPACE: i32 = 0x5343_4f52;

const SELECT_COLUMNS: &str = r#"
    SELECT session, criteria_code, criteria_id, sub_criteria_id, sub_sub_criteria_id,
           sub_sub_cr_grade, score_sub_sub_criteria, score_sub_criteria,
           score_criteria, weighted_cr_score, computed_at
    FROM scores
"#;

/// PostgreSQL implementation of ScoreStore.
#[derive(Clone)]
pub struct PostgresScoreStore {
    pool: PgPool,
}

impl PostgresScoreStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScoreStore for PostgresScoreStore {
    async fn begin(&self, session: Session) -> Result<Box<dyn ScoreTransaction>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            StoreError::Database(format!("Failed to begin transaction: {}", e))
        })?;

        sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
            .bind(SCORE_LOCK_NAMESPACE)
            .bind(session.year())
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to lock session: {}", e)))?;

        Ok(Box::new(PostgresScoreTransaction { session, tx }))
    }

    async fn scan(
        &self,
        session: Session,
        filter: &ScoreFilter,
    ) -> Result<Vec<ScoreRow>, StoreError> {
        let rows = select_query(session, filter)
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to scan scores: {}", e)))?;

        rows.iter().map(row_to_score).collect()
    }
}

struct PostgresScoreTransaction {
    session: Session,
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl ScoreTransaction for PostgresScoreTransaction {
    fn session(&self) -> Session {
        self.session
    }

    async fn scan(&mut self, filter: &ScoreFilter) -> Result<Vec<ScoreRow>, StoreError> {
        let rows = select_query(self.session, filter)
            .build()
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to scan scores: {}", e)))?;

        rows.iter().map(row_to_score).collect()
    }

    async fn insert_if_absent(&mut self, row: ScoreRow) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO scores (
                session, criteria_code, criteria_id, sub_criteria_id, sub_sub_criteria_id,
                sub_sub_cr_grade, score_sub_sub_criteria, score_sub_criteria,
                score_criteria, weighted_cr_score, computed_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (criteria_code, session, sub_sub_criteria_id) DO NOTHING
            "#,
        )
        .bind(row.session.year())
        .bind(row.criteria_code.as_str())
        .bind(row.criteria_id.as_str())
        .bind(row.sub_criteria_id.as_ref().map(|id| id.as_str()))
        .bind(row.sub_sub_criteria_id.as_ref().map(|id| id.as_str()))
        .bind(row.sub_sub_cr_grade)
        .bind(row.score_sub_sub_criteria)
        .bind(row.score_sub_criteria)
        .bind(row.score_criteria)
        .bind(row.weighted_cr_score)
        .bind(row.computed_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to insert score row: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_sub_criterion_score(
        &mut self,
        sub_criterion: &SubCriterionId,
        included: &[SubSubCriterionId],
        score: f64,
        computed_at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let included: Vec<String> = included.iter().map(|id| id.as_str().to_string()).collect();
        let result = sqlx::query(
            r#"
            UPDATE scores SET
                score_sub_criteria = $1,
                computed_at = $2
            WHERE session = $3
              AND sub_criteria_id = $4
              AND sub_sub_criteria_id = ANY($5)
            "#,
        )
        .bind(score)
        .bind(computed_at)
        .bind(self.session.year())
        .bind(sub_criterion.as_str())
        .bind(included)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            StoreError::Database(format!("Failed to update sub-criterion score: {}", e))
        })?;

        Ok(result.rows_affected())
    }

    async fn update_criterion_scores(
        &mut self,
        criterion: &CriterionId,
        score_criteria: f64,
        weighted_cr_score: f64,
        computed_at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE scores SET
                score_criteria = $1,
                weighted_cr_score = $2,
                computed_at = $3
            WHERE session = $4 AND criteria_id = $5
            "#,
        )
        .bind(score_criteria)
        .bind(weighted_cr_score)
        .bind(computed_at)
        .bind(self.session.year())
        .bind(criterion.as_str())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to update criterion scores: {}", e)))?;

        Ok(result.rows_affected())
    }

    async fn update_total(
        &mut self,
        total: f64,
        computed_at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE scores SET
                weighted_cr_score = $1,
                computed_at = $2
            WHERE session = $3
              AND criteria_code = $4
              AND sub_sub_criteria_id = $5
            "#,
        )
        .bind(total)
        .bind(computed_at)
        .bind(self.session.year())
        .bind(CriteriaCode::sentinel().to_string())
        .bind(SubSubCriterionId::sentinel().to_string())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to update total: {}", e)))?;

        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx
            .commit()
            .await
            .map_err(|e| StoreError::Database(format!("Failed to commit transaction: {}", e)))
    }
}

/// Translates a [`ScoreFilter`] into a SELECT over one session.
fn select_query(session: Session, filter: &ScoreFilter) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(SELECT_COLUMNS);
    builder.push(" WHERE session = ").push_bind(session.year());

    if let Some(criterion) = &filter.criterion {
        builder
            .push(" AND criteria_id = ")
            .push_bind(criterion.as_str().to_string());
    }
    if let Some(ids) = &filter.sub_sub_criteria {
        let ids: Vec<String> = ids.iter().map(|id| id.as_str().to_string()).collect();
        builder
            .push(" AND sub_sub_criteria_id = ANY(")
            .push_bind(ids)
            .push(")");
    }
    if let Some(codes) = &filter.criteria_codes {
        let codes: Vec<String> = codes.iter().map(|code| code.as_str().to_string()).collect();
        builder
            .push(" AND criteria_code = ANY(")
            .push_bind(codes)
            .push(")");
    }
    if filter.scored_only {
        builder.push(" AND (score_sub_criteria > 0 OR score_sub_sub_criteria > 0)");
    }
    if filter.weighted_only {
        builder.push(
            " AND weighted_cr_score > 0 \
             AND sub_criteria_id IS NOT NULL \
             AND sub_sub_criteria_id IS NOT NULL",
        );
    }
    if filter.exclude_sentinel {
        builder
            .push(" AND criteria_id <> ")
            .push_bind(CriterionId::sentinel().as_str().to_string());
    }
    builder.push(" ORDER BY criteria_code, sub_sub_criteria_id NULLS FIRST");
    builder
}

fn row_to_score(row: &PgRow) -> Result<ScoreRow, StoreError> {
    let corrupt = |e: &dyn std::fmt::Display| StoreError::Corrupt(e.to_string());

    let year: i32 = row.try_get("session")?;
    let criteria_code: String = row.try_get("criteria_code")?;
    let criteria_id: String = row.try_get("criteria_id")?;
    let sub_criteria_id: Option<String> = row.try_get("sub_criteria_id")?;
    let sub_sub_criteria_id: Option<String> = row.try_get("sub_sub_criteria_id")?;

    Ok(ScoreRow {
        session: Session::new(year).map_err(|e| corrupt(&e))?,
        criteria_code: CriteriaCode::new(criteria_code).map_err(|e| corrupt(&e))?,
        criteria_id: CriterionId::parse(&criteria_id).map_err(|e| corrupt(&e))?,
        sub_criteria_id: sub_criteria_id
            .as_deref()
            .map(SubCriterionId::parse)
            .transpose()
            .map_err(|e| corrupt(&e))?,
        sub_sub_criteria_id: sub_sub_criteria_id
            .as_deref()
            .map(SubSubCriterionId::parse)
            .transpose()
            .map_err(|e| corrupt(&e))?,
        sub_sub_cr_grade: row.try_get("sub_sub_cr_grade")?,
        score_sub_sub_criteria: row.try_get("score_sub_sub_criteria")?,
        score_sub_criteria: row.try_get("score_sub_criteria")?,
        score_criteria: row.try_get("score_criteria")?,
        weighted_cr_score: row.try_get("weighted_cr_score")?,
        computed_at: row.try_get("computed_at")?,
    })
}
