//! Score Store Port - persistence of score rows.
//!
//! Every read-modify-write recompute runs inside one [`ScoreTransaction`]
//! scoped to a session. Implementations serialize transactions for the same
//! session; distinct sessions may proceed in parallel. Dropping a transaction
//! without committing discards its writes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::foundation::{
    CriteriaCode, CriterionId, Session, SubCriterionId, SubSubCriterionId,
};
use crate::domain::scoring::ScoreRow;

/// Errors that can occur during score persistence.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    /// A persisted row could not be mapped back into domain types.
    #[error("Corrupt score row: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

/// Row predicate for scans. Every set condition must hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreFilter {
    pub criterion: Option<CriterionId>,
    pub sub_sub_criteria: Option<Vec<SubSubCriterionId>>,
    pub criteria_codes: Option<Vec<CriteriaCode>>,
    /// `score_sub_criteria > 0 OR score_sub_sub_criteria > 0`
    pub scored_only: bool,
    /// `weighted_cr_score > 0` with non-null sub and sub-sub ids
    pub weighted_only: bool,
    pub exclude_sentinel: bool,
}

impl ScoreFilter {
    /// Matches every row of the session.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn criterion(mut self, criterion: CriterionId) -> Self {
        self.criterion = Some(criterion);
        self
    }

    pub fn metrics(mut self, ids: Vec<SubSubCriterionId>) -> Self {
        self.sub_sub_criteria = Some(ids);
        self
    }

    pub fn codes(mut self, codes: Vec<CriteriaCode>) -> Self {
        self.criteria_codes = Some(codes);
        self
    }

    pub fn scored_only(mut self) -> Self {
        self.scored_only = true;
        self
    }

    pub fn weighted_only(mut self) -> Self {
        self.weighted_only = true;
        self
    }

    pub fn exclude_sentinel(mut self) -> Self {
        self.exclude_sentinel = true;
        self
    }

    /// In-process evaluation; SQL adapters translate the same predicate.
    pub fn matches(&self, row: &ScoreRow) -> bool {
        if let Some(criterion) = &self.criterion {
            if &row.criteria_id != criterion {
                return false;
            }
        }
        if let Some(ids) = &self.sub_sub_criteria {
            match &row.sub_sub_criteria_id {
                Some(id) if ids.contains(id) => {}
                _ => return false,
            }
        }
        if let Some(codes) = &self.criteria_codes {
            if !codes.contains(&row.criteria_code) {
                return false;
            }
        }
        if self.scored_only && !(row.score_sub_criteria > 0.0 || row.score_sub_sub_criteria > 0.0) {
            return false;
        }
        if self.weighted_only
            && !(row.weighted_cr_score > 0.0
                && row.sub_criteria_id.is_some()
                && row.sub_sub_criteria_id.is_some())
        {
            return false;
        }
        if self.exclude_sentinel && row.is_sentinel() {
            return false;
        }
        true
    }
}

/// A per-session unit of work.
#[async_trait]
pub trait ScoreTransaction: Send {
    fn session(&self) -> Session;

    /// Rows of the transaction's session matching `filter`, ordered by
    /// criteria code then metric id.
    async fn scan(&mut self, filter: &ScoreFilter) -> Result<Vec<ScoreRow>, StoreError>;

    /// Inserts `row` unless a row with the same key exists.
    ///
    /// # Returns
    ///
    /// `true` if the row was inserted.
    async fn insert_if_absent(&mut self, row: ScoreRow) -> Result<bool, StoreError>;

    /// Sets `score_sub_criteria` on rows of `sub_criterion` whose metric is in
    /// `included`. Returns the number of rows updated.
    async fn update_sub_criterion_score(
        &mut self,
        sub_criterion: &SubCriterionId,
        included: &[SubSubCriterionId],
        score: f64,
        computed_at: DateTime<Utc>,
    ) -> Result<u64, StoreError>;

    /// Sets `score_criteria` and `weighted_cr_score` on every row of
    /// `criterion`. Returns the number of rows updated.
    async fn update_criterion_scores(
        &mut self,
        criterion: &CriterionId,
        score_criteria: f64,
        weighted_cr_score: f64,
        computed_at: DateTime<Utc>,
    ) -> Result<u64, StoreError>;

    /// Sets `weighted_cr_score` on the session's sentinel row.
    async fn update_total(
        &mut self,
        total: f64,
        computed_at: DateTime<Utc>,
    ) -> Result<u64, StoreError>;

    /// Publishes every write made in this transaction.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the commit fails; nothing is
    /// published in that case.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

/// Port for reading and transactionally updating score rows.
#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// Opens a transaction for `session`, waiting for any other open
    /// transaction on the same session to finish.
    async fn begin(&self, session: Session) -> Result<Box<dyn ScoreTransaction>, StoreError>;

    /// Read-only scan outside any transaction.
    async fn scan(&self, session: Session, filter: &ScoreFilter)
        -> Result<Vec<ScoreRow>, StoreError>;
}
