use chrono::{DateTime, Utc};

use super::domain::{EvaluationId, EvaluationRecord};

/// Storage abstraction over the evaluations table. Every operation is a
/// single-row atomic operation from the caller's point of view.
pub trait EvaluationRepository: Send + Sync {
    fn insert(&self, record: EvaluationRecord) -> Result<EvaluationRecord, RepositoryError>;
    fn update(&self, record: EvaluationRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &EvaluationId) -> Result<Option<EvaluationRecord>, RepositoryError>;

    /// Started evaluations whose recovery count is below `max_notifications`.
    fn abandoned(&self, max_notifications: u8) -> Result<Vec<EvaluationRecord>, RepositoryError>;

    /// Conditional advance: bumps `abandoned_email_count` to `expected_count + 1`
    /// and stamps `last_abandoned_email_at`, but only while the stored count still
    /// equals `expected_count` and the record is still started. Otherwise returns
    /// [`RepositoryError::Conflict`] and leaves the row untouched.
    fn advance_recovery(
        &self,
        id: &EvaluationId,
        expected_count: u8,
        sent_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists or was changed concurrently")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
