use chrono::{DateTime, Utc};

use super::domain::{AuditEntry, PenaltyEntry, PhotoRecord, ScoreRecord, TicketRecord};
use crate::rules::TicketId;

/// Storage abstraction so the service can be exercised in isolation.
///
/// `apply_transition` is a compare-and-swap on `version`: implementations must
/// reject the write with [`RepositoryError::Conflict`] when the stored version
/// differs from `expected_version`, and bump the version on success. The status
/// write, its audit entry and any penalty commit together or not at all. Audit,
/// penalty and score entries are append-only.
pub trait TicketRepository: Send + Sync {
    fn insert(&self, record: TicketRecord) -> Result<TicketRecord, RepositoryError>;
    fn apply_transition(
        &self,
        record: TicketRecord,
        expected_version: u64,
        audit: AuditEntry,
        penalty: Option<PenaltyEntry>,
    ) -> Result<TicketRecord, RepositoryError>;
    fn fetch(&self, id: &TicketId) -> Result<Option<TicketRecord>, RepositoryError>;
    fn list(&self) -> Result<Vec<TicketRecord>, RepositoryError>;
    fn closed_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TicketRecord>, RepositoryError>;

    fn audit_trail(&self, id: &TicketId) -> Result<Vec<AuditEntry>, RepositoryError>;

    fn add_photo(&self, id: &TicketId, photo: PhotoRecord) -> Result<(), RepositoryError>;
    fn photos(&self, id: &TicketId) -> Result<Vec<PhotoRecord>, RepositoryError>;

    fn record_penalty(&self, entry: PenaltyEntry) -> Result<(), RepositoryError>;
    fn penalties(&self, id: &TicketId) -> Result<Vec<PenaltyEntry>, RepositoryError>;

    fn record_score(&self, record: ScoreRecord) -> Result<(), RepositoryError>;
    fn scores(&self, assignee: &str) -> Result<Vec<ScoreRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Duplicate,
    #[error("record not found")]
    NotFound,
    #[error("ticket was modified concurrently (expected version {expected}, found {found})")]
    Conflict { expected: u64, found: u64 },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
