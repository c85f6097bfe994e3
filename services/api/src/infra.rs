use chrono::{DateTime, NaiveDate, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use taskproof::rules::TicketId;
use taskproof::tickets::{
    AuditEntry, PenaltyEntry, PhotoRecord, RepositoryError, ScoreRecord, TicketRecord,
    TicketRepository,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
struct TicketStore {
    tickets: HashMap<TicketId, TicketRecord>,
    audit: Vec<AuditEntry>,
    photos: HashMap<TicketId, Vec<PhotoRecord>>,
    penalties: Vec<PenaltyEntry>,
    scores: Vec<ScoreRecord>,
}

/// Process-local store. A single mutex guards every table, so the version
/// check, the status write and its audit and penalty rows land together.
#[derive(Default, Clone)]
pub(crate) struct InMemoryTicketRepository {
    store: Arc<Mutex<TicketStore>>,
}

impl InMemoryTicketRepository {
    fn lock(&self) -> Result<MutexGuard<'_, TicketStore>, RepositoryError> {
        self.store
            .lock()
            .map_err(|_| RepositoryError::Unavailable("ticket store mutex poisoned".to_string()))
    }
}

impl TicketRepository for InMemoryTicketRepository {
    fn insert(&self, record: TicketRecord) -> Result<TicketRecord, RepositoryError> {
        let mut store = self.lock()?;
        if store.tickets.contains_key(&record.id) {
            return Err(RepositoryError::Duplicate);
        }
        store.tickets.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn apply_transition(
        &self,
        mut record: TicketRecord,
        expected_version: u64,
        audit: AuditEntry,
        penalty: Option<PenaltyEntry>,
    ) -> Result<TicketRecord, RepositoryError> {
        let mut store = self.lock()?;
        let stored = store
            .tickets
            .get_mut(&record.id)
            .ok_or(RepositoryError::NotFound)?;
        if stored.version != expected_version {
            return Err(RepositoryError::Conflict {
                expected: expected_version,
                found: stored.version,
            });
        }
        record.version = expected_version + 1;
        *stored = record.clone();
        store.audit.push(audit);
        store.penalties.extend(penalty);
        Ok(record)
    }

    fn fetch(&self, id: &TicketId) -> Result<Option<TicketRecord>, RepositoryError> {
        Ok(self.lock()?.tickets.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<TicketRecord>, RepositoryError> {
        let store = self.lock()?;
        let mut tickets: Vec<TicketRecord> = store.tickets.values().cloned().collect();
        tickets.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(tickets)
    }

    fn closed_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TicketRecord>, RepositoryError> {
        let store = self.lock()?;
        Ok(store
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
        let store = self.lock()?;
        Ok(store
            .audit
            .iter()
            .filter(|entry| &entry.ticket_id == id)
            .cloned()
            .collect())
    }

    fn add_photo(&self, id: &TicketId, photo: PhotoRecord) -> Result<(), RepositoryError> {
        self.lock()?
            .photos
            .entry(id.clone())
            .or_default()
            .push(photo);
        Ok(())
    }

    fn photos(&self, id: &TicketId) -> Result<Vec<PhotoRecord>, RepositoryError> {
        Ok(self.lock()?.photos.get(id).cloned().unwrap_or_default())
    }

    fn record_penalty(&self, entry: PenaltyEntry) -> Result<(), RepositoryError> {
        self.lock()?.penalties.push(entry);
        Ok(())
    }

    fn penalties(&self, id: &TicketId) -> Result<Vec<PenaltyEntry>, RepositoryError> {
        let store = self.lock()?;
        Ok(store
            .penalties
            .iter()
            .filter(|entry| &entry.ticket_id == id)
            .cloned()
            .collect())
    }

    fn record_score(&self, record: ScoreRecord) -> Result<(), RepositoryError> {
        self.lock()?.scores.push(record);
        Ok(())
    }

    fn scores(&self, assignee: &str) -> Result<Vec<ScoreRecord>, RepositoryError> {
        let store = self.lock()?;
        Ok(store
            .scores
            .iter()
            .filter(|record| record.assignee == assignee)
            .cloned()
            .collect())
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

/// Accepts RFC 3339 timestamps or bare dates, which map to midnight UTC.
pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }
    parse_date(trimmed)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| format!("failed to parse '{raw}' as RFC 3339 timestamp or YYYY-MM-DD"))
}
