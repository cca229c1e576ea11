//! Scoring error taxonomy.

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::foundation::{ErrorCode, ValidationError};
use crate::ports::StoreError;

/// Errors raised by aggregation and reporting operations.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// Requested criterion / sub-criterion / metric is not in the catalog
    /// or weight table. Nothing is committed.
    #[error("Criteria not found: {0}")]
    CatalogNotFound(String),

    /// A known id has no configured value and no documented default exists.
    #[error("Configuration missing for {id}: {item}")]
    ConfigMissing { id: String, item: &'static str },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl ScoringError {
    pub fn catalog_not_found(id: impl Into<String>) -> Self {
        ScoringError::CatalogNotFound(id.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ScoringError::CatalogNotFound(_) => ErrorCode::CatalogNotFound,
            ScoringError::ConfigMissing { .. } => ErrorCode::ConfigMissing,
            ScoringError::Validation(_) => ErrorCode::ValidationFailed,
            ScoringError::Store(_) => ErrorCode::DatabaseError,
        }
    }
}

/// Errors raised while loading the catalog or weight table.
#[derive(Debug, Error)]
pub enum ReferenceDataError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed reference data: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid reference data: {0}")]
    Invalid(String),
}

impl ReferenceDataError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ReferenceDataError::Invalid(message.into())
    }
}

impl From<ValidationError> for ReferenceDataError {
    fn from(err: ValidationError) -> Self {
        ReferenceDataError::Invalid(err.to_string())
    }
}
