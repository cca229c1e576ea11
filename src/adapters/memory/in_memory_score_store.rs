//! In-Memory Score Store Adapter
//!
//! Keeps score rows per session in memory. Each session has its own async
//! gate so transactions on one session serialize while other sessions
//! proceed. A transaction reads and writes a staged copy of the committed
//! rows and logs its writes; commit replays the log onto the committed rows,
//! so direct writes made while it was open are kept.
//!
//! Useful for tests and for running the service without a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::domain::foundation::{CriterionId, Session, SubCriterionId, SubSubCriterionId};
use crate::domain::scoring::{ScoreKey, ScoreRow};
use crate::ports::{ScoreFilter, ScoreStore, ScoreTransaction, StoreError};

type Rows = BTreeMap<ScoreKey, ScoreRow>;

#[derive(Debug, Default)]
struct SessionSlot {
    gate: Arc<Mutex<()>>,
    committed: RwLock<Rows>,
}

/// In-memory storage for score rows
#[derive(Debug, Clone, Default)]
pub struct InMemoryScoreStore {
    sessions: Arc<RwLock<HashMap<Session, Arc<SessionSlot>>>>,
}

impl InMemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a row directly, replacing any row with the same key.
    ///
    /// Stands in for the data-entry side that records raw grades.
    pub async fn put(&self, row: ScoreRow) {
        let slot = self.slot(row.session).await;
        let mut committed = slot.committed.write().await;
        committed.insert(row.key(), row);
    }

    /// Every committed row of a session in key order.
    pub async fn rows(&self, session: Session) -> Vec<ScoreRow> {
        let slot = self.slot(session).await;
        let committed = slot.committed.read().await;
        committed.values().cloned().collect()
    }

    async fn slot(&self, session: Session) -> Arc<SessionSlot> {
        if let Some(slot) = self.sessions.read().await.get(&session) {
            return slot.clone();
        }
        let mut sessions = self.sessions.write().await;
        sessions.entry(session).or_default().clone()
    }
}

#[async_trait]
impl ScoreStore for InMemoryScoreStore {
    async fn begin(&self, session: Session) -> Result<Box<dyn ScoreTransaction>, StoreError> {
        let slot = self.slot(session).await;
        let guard = slot.gate.clone().lock_owned().await;
        let staged = slot.committed.read().await.clone();
        Ok(Box::new(InMemoryScoreTransaction {
            session,
            slot,
            staged,
            changes: Vec::new(),
            _guard: guard,
        }))
    }

    async fn scan(
        &self,
        session: Session,
        filter: &ScoreFilter,
    ) -> Result<Vec<ScoreRow>, StoreError> {
        let slot = self.slot(session).await;
        let committed = slot.committed.read().await;
        Ok(committed
            .values()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect())
    }
}

/// A write recorded by a transaction, replayed onto the committed rows at
/// commit so rows written outside the transaction meanwhile survive.
#[derive(Debug, Clone)]
enum Change {
    Insert(ScoreRow),
    SubCriterionScore {
        sub_criterion: SubCriterionId,
        included: Vec<SubSubCriterionId>,
        score: f64,
        computed_at: DateTime<Utc>,
    },
    CriterionScores {
        criterion: CriterionId,
        score_criteria: f64,
        weighted_cr_score: f64,
        computed_at: DateTime<Utc>,
    },
    Total {
        key: ScoreKey,
        total: f64,
        computed_at: DateTime<Utc>,
    },
}

impl Change {
    /// Applies the change and returns the number of rows it touched.
    fn apply(&self, rows: &mut Rows) -> u64 {
        match self {
            Change::Insert(row) => {
                let key = row.key();
                if rows.contains_key(&key) {
                    return 0;
                }
                rows.insert(key, row.clone());
                1
            }
            Change::SubCriterionScore {
                sub_criterion,
                included,
                score,
                computed_at,
            } => {
                let mut updated = 0;
                for row in rows.values_mut() {
                    let in_set = row
                        .sub_sub_criteria_id
                        .as_ref()
                        .map(|id| included.contains(id))
                        .unwrap_or(false);
                    if row.sub_criteria_id.as_ref() == Some(sub_criterion) && in_set {
                        row.score_sub_criteria = *score;
                        row.computed_at = *computed_at;
                        updated += 1;
                    }
                }
                updated
            }
            Change::CriterionScores {
                criterion,
                score_criteria,
                weighted_cr_score,
                computed_at,
            } => {
                let mut updated = 0;
                for row in rows.values_mut().filter(|row| &row.criteria_id == criterion) {
                    row.score_criteria = *score_criteria;
                    row.weighted_cr_score = *weighted_cr_score;
                    row.computed_at = *computed_at;
                    updated += 1;
                }
                updated
            }
            Change::Total {
                key,
                total,
                computed_at,
            } => match rows.get_mut(key) {
                Some(row) => {
                    row.weighted_cr_score = *total;
                    row.computed_at = *computed_at;
                    1
                }
                None => 0,
            },
        }
    }
}

/// Staged view plus the change log for one session; dropped without
/// commit, both vanish.
struct InMemoryScoreTransaction {
    session: Session,
    slot: Arc<SessionSlot>,
    staged: Rows,
    changes: Vec<Change>,
    _guard: OwnedMutexGuard<()>,
}

impl InMemoryScoreTransaction {
    fn record(&mut self, change: Change) -> u64 {
        let touched = change.apply(&mut self.staged);
        self.changes.push(change);
        touched
    }
}

#[async_trait]
impl ScoreTransaction for InMemoryScoreTransaction {
    fn session(&self) -> Session {
        self.session
    }

    async fn scan(&mut self, filter: &ScoreFilter) -> Result<Vec<ScoreRow>, StoreError> {
        Ok(self
            .staged
            .values()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect())
    }

    async fn insert_if_absent(&mut self, row: ScoreRow) -> Result<bool, StoreError> {
        if row.session != self.session {
            return Err(StoreError::Database(format!(
                "row for session {} written in transaction for {}",
                row.session, self.session
            )));
        }
        Ok(self.record(Change::Insert(row)) > 0)
    }

    async fn update_sub_criterion_score(
        &mut self,
        sub_criterion: &SubCriterionId,
        included: &[SubSubCriterionId],
        score: f64,
        computed_at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        Ok(self.record(Change::SubCriterionScore {
            sub_criterion: sub_criterion.clone(),
            included: included.to_vec(),
            score,
            computed_at,
        }))
    }

    async fn update_criterion_scores(
        &mut self,
        criterion: &CriterionId,
        score_criteria: f64,
        weighted_cr_score: f64,
        computed_at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        Ok(self.record(Change::CriterionScores {
            criterion: criterion.clone(),
            score_criteria,
            weighted_cr_score,
            computed_at,
        }))
    }

    async fn update_total(
        &mut self,
        total: f64,
        computed_at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        Ok(self.record(Change::Total {
            key: ScoreRow::sentinel_key(self.session),
            total,
            computed_at,
        }))
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let mut committed = self.slot.committed.write().await;
        for change in &self.changes {
            change.apply(&mut committed);
        }
        Ok(())
    }
}
