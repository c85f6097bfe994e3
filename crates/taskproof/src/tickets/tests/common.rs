use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::rules::{ActorRole, Severity, TicketId, TicketStatus};
use crate::tickets::domain::{
    Actor, AuditEntry, NewTicket, PenaltyEntry, PhotoRecord, PhotoTag, ScoreRecord, TicketRecord,
    TransitionRequest,
};
use crate::tickets::repository::{RepositoryError, TicketRepository};
use crate::tickets::service::TicketService;

pub(super) fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 13, 8, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn worker() -> Actor {
    Actor::new("jordan", ActorRole::Worker)
}

pub(super) fn manager() -> Actor {
    Actor::new("priya", ActorRole::Manager)
}

pub(super) fn new_ticket(area: &str, category: &str) -> NewTicket {
    NewTicket {
        title: format!("{category} in {area}"),
        area: area.to_string(),
        category: category.to_string(),
        severity: Severity::Elevated,
        recurring: false,
        inspection: false,
        assignee: "jordan".to_string(),
        template_key: None,
    }
}

pub(super) fn request(actor: Actor, to: TicketStatus) -> TransitionRequest {
    TransitionRequest {
        actor,
        to,
        note: None,
    }
}

pub(super) fn photo(tag: PhotoTag, at: DateTime<Utc>) -> PhotoRecord {
    PhotoRecord {
        tag,
        storage_key: format!("photos/{}-{}.jpg", tag.label(), at.timestamp()),
        uploaded_at: at,
    }
}

pub(super) fn service() -> (TicketService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    (TicketService::new(repository.clone()), repository)
}

/// Drive a fresh ticket to `needs_review`, attaching a proof photo on the way.
pub(super) fn submit_for_review(
    service: &TicketService<MemoryRepository>,
    id: &TicketId,
    at: DateTime<Utc>,
) {
    service
        .attach_photo(id, photo(PhotoTag::Proof, at))
        .expect("photo attaches");
    service
        .transition(id, request(worker(), TicketStatus::InProgress), at)
        .expect("work starts");
    service
        .transition(id, request(worker(), TicketStatus::NeedsReview), at)
        .expect("work submitted");
}

pub(super) fn close_ticket(
    service: &TicketService<MemoryRepository>,
    id: &TicketId,
    at: DateTime<Utc>,
) {
    submit_for_review(service, id, at);
    service
        .transition(id, request(manager(), TicketStatus::Closed), at)
        .expect("ticket closes");
}

#[derive(Default)]
struct MemoryState {
    tickets: HashMap<TicketId, TicketRecord>,
    audit: Vec<AuditEntry>,
    photos: HashMap<TicketId, Vec<PhotoRecord>>,
    penalties: Vec<PenaltyEntry>,
    scores: Vec<ScoreRecord>,
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    state: Arc<Mutex<MemoryState>>,
    penalty_store_down: Arc<AtomicBool>,
}

impl MemoryRepository {
    pub(super) fn penalty_count(&self) -> usize {
        self.state.lock().expect("repository mutex poisoned").penalties.len()
    }

    /// Make every write that carries a penalty fail as if its table were offline.
    pub(super) fn set_penalty_store_down(&self, down: bool) {
        self.penalty_store_down.store(down, Ordering::SeqCst);
    }

    fn penalty_write_allowed(&self) -> Result<(), RepositoryError> {
        if self.penalty_store_down.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "penalty table offline".to_string(),
            ));
        }
        Ok(())
    }
}

impl TicketRepository for MemoryRepository {
    fn insert(&self, record: TicketRecord) -> Result<TicketRecord, RepositoryError> {
        let mut state = self.state.lock().expect("repository mutex poisoned");
        if state.tickets.contains_key(&record.id) {
            return Err(RepositoryError::Duplicate);
        }
        state.tickets.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn apply_transition(
        &self,
        mut record: TicketRecord,
        expected_version: u64,
        audit: AuditEntry,
        penalty: Option<PenaltyEntry>,
    ) -> Result<TicketRecord, RepositoryError> {
        let mut state = self.state.lock().expect("repository mutex poisoned");
        let found = state
            .tickets
            .get(&record.id)
            .ok_or(RepositoryError::NotFound)?
            .version;
        if found != expected_version {
            return Err(RepositoryError::Conflict {
                expected: expected_version,
                found,
            });
        }
        if penalty.is_some() {
            self.penalty_write_allowed()?;
        }

        record.version = expected_version + 1;
        state.tickets.insert(record.id.clone(), record.clone());
        state.audit.push(audit);
        state.penalties.extend(penalty);
        Ok(record)
    }

    fn fetch(&self, id: &TicketId) -> Result<Option<TicketRecord>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        Ok(state.tickets.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<TicketRecord>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        Ok(state.tickets.values().cloned().collect())
    }

    fn closed_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TicketRecord>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        Ok(state
            .tickets
            .values()
            .filter(|ticket| {
                ticket
                    .closed_at
                    .is_some_and(|closed_at| closed_at >= start && closed_at <= end)
            })
            .cloned()
            .collect())
    }

    fn audit_trail(&self, id: &TicketId) -> Result<Vec<AuditEntry>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        Ok(state
            .audit
            .iter()
            .filter(|entry| &entry.ticket_id == id)
            .cloned()
            .collect())
    }

    fn add_photo(&self, id: &TicketId, photo: PhotoRecord) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("repository mutex poisoned");
        state.photos.entry(id.clone()).or_default().push(photo);
        Ok(())
    }

    fn photos(&self, id: &TicketId) -> Result<Vec<PhotoRecord>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        Ok(state.photos.get(id).cloned().unwrap_or_default())
    }

    fn record_penalty(&self, entry: PenaltyEntry) -> Result<(), RepositoryError> {
        self.penalty_write_allowed()?;
        let mut state = self.state.lock().expect("repository mutex poisoned");
        state.penalties.push(entry);
        Ok(())
    }

    fn penalties(&self, id: &TicketId) -> Result<Vec<PenaltyEntry>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        Ok(state
            .penalties
            .iter()
            .filter(|entry| &entry.ticket_id == id)
            .cloned()
            .collect())
    }

    fn record_score(&self, record: ScoreRecord) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("repository mutex poisoned");
        state.scores.push(record);
        Ok(())
    }

    fn scores(&self, assignee: &str) -> Result<Vec<ScoreRecord>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        Ok(state
            .scores
            .iter()
            .filter(|record| record.assignee == assignee)
            .cloned()
            .collect())
    }
}

/// Repository whose backing store is offline.
pub(super) struct UnavailableRepository;

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

impl TicketRepository for UnavailableRepository {
    fn insert(&self, _record: TicketRecord) -> Result<TicketRecord, RepositoryError> {
        offline()
    }

    fn apply_transition(
        &self,
        _record: TicketRecord,
        _expected_version: u64,
        _audit: AuditEntry,
        _penalty: Option<PenaltyEntry>,
    ) -> Result<TicketRecord, RepositoryError> {
        offline()
    }

    fn fetch(&self, _id: &TicketId) -> Result<Option<TicketRecord>, RepositoryError> {
        offline()
    }

    fn list(&self) -> Result<Vec<TicketRecord>, RepositoryError> {
        offline()
    }

    fn closed_between(
        &self,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<TicketRecord>, RepositoryError> {
        offline()
    }

    fn audit_trail(&self, _id: &TicketId) -> Result<Vec<AuditEntry>, RepositoryError> {
        offline()
    }

    fn add_photo(&self, _id: &TicketId, _photo: PhotoRecord) -> Result<(), RepositoryError> {
        offline()
    }

    fn photos(&self, _id: &TicketId) -> Result<Vec<PhotoRecord>, RepositoryError> {
        offline()
    }

    fn record_penalty(&self, _entry: PenaltyEntry) -> Result<(), RepositoryError> {
        offline()
    }

    fn penalties(&self, _id: &TicketId) -> Result<Vec<PenaltyEntry>, RepositoryError> {
        offline()
    }

    fn record_score(&self, _record: ScoreRecord) -> Result<(), RepositoryError> {
        offline()
    }

    fn scores(&self, _assignee: &str) -> Result<Vec<ScoreRecord>, RepositoryError> {
        offline()
    }
}

pub(super) async fn response_json(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body collects");
    let value = serde_json::from_slice(&bytes).expect("json body");
    (status, value)
}
