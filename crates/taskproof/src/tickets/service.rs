use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::{debug, info, warn};

use super::domain::{
    Actor, AuditEntry, NewTicket, PenaltyEntry, PenaltyKind, PhotoRecord, ScoreRecord,
    TicketRecord, TransitionRequest,
};
use super::evidence::{require_submission_evidence, EvidenceError};
use super::recurring::RecurringTemplate;
use super::repository::{RepositoryError, TicketRepository};
use crate::rules::{
    compute_score, detect_repeat_issue, validate_transition, ActorRole, ClosedTicketSummary,
    Period, TicketEvent, TicketHistoryRecord, TicketId, TicketStatus, TransitionError,
    TransitionResult, REPEAT_WINDOW_DAYS,
};

/// Service composing the repository with the rule engine.
///
/// The rule engine only decides; this layer fetches its inputs, applies the
/// results and writes the audit trail.
pub struct TicketService<R> {
    repository: Arc<R>,
}

static TICKET_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_ticket_id() -> TicketId {
    let id = TICKET_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    TicketId(format!("tkt-{id:06}"))
}

/// Applied transition together with the validator's verdict.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub ticket: TicketRecord,
    pub from: TicketStatus,
    pub result: TransitionResult,
}

impl<R> TicketService<R>
where
    R: TicketRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Create a ticket, flagging it when it repeats a ticket closed in the trailing window.
    pub fn create(
        &self,
        ticket: NewTicket,
        now: DateTime<Utc>,
    ) -> Result<TicketRecord, TicketServiceError> {
        let mut record = TicketRecord {
            id: next_ticket_id(),
            title: ticket.title,
            area: ticket.area,
            category: ticket.category,
            severity: ticket.severity,
            recurring: ticket.recurring,
            inspection: ticket.inspection,
            assignee: ticket.assignee,
            status: TicketStatus::Open,
            version: 0,
            created_at: now,
            submitted_at: None,
            closed_at: None,
            repeat_of: None,
            template_key: ticket.template_key,
        };

        let window_start = now - Duration::days(REPEAT_WINDOW_DAYS);
        let mut candidates: Vec<ClosedTicketSummary> = self
            .repository
            .closed_between(window_start, now)?
            .iter()
            .filter_map(TicketRecord::closed_summary)
            .collect();
        candidates.sort_by(|a, b| b.closed_at.cmp(&a.closed_at));

        let repeat = detect_repeat_issue(&record.repeat_probe(), &candidates);
        record.repeat_of = repeat.previous_ticket_id;

        let stored = self.repository.insert(record)?;
        match &stored.repeat_of {
            Some(previous) => warn!(
                ticket = %stored.id,
                previous = %previous,
                area = %stored.area,
                category = %stored.category,
                "ticket repeats a recently closed issue"
            ),
            None => info!(ticket = %stored.id, assignee = %stored.assignee, "ticket created"),
        }
        Ok(stored)
    }

    /// Validate and apply a status change.
    ///
    /// The status write is conditional on the version read here, so two
    /// concurrent requests for the same ticket cannot both succeed. The audit
    /// entry and any rejection penalty are committed with it.
    pub fn transition(
        &self,
        id: &TicketId,
        request: TransitionRequest,
        now: DateTime<Utc>,
    ) -> Result<TransitionOutcome, TicketServiceError> {
        let current = self.get(id)?;
        let from = current.status;
        let TransitionRequest { actor, to, note } = request;

        let result = validate_transition(from, to, actor.role, &current.snapshot())?;

        if to == TicketStatus::NeedsReview {
            let photos = self.repository.photos(id)?;
            require_submission_evidence(&current, &photos)?;
        }

        let mut next = current.clone();
        next.status = to;
        match to {
            TicketStatus::NeedsReview if next.submitted_at.is_none() => {
                next.submitted_at = Some(now)
            }
            TicketStatus::Closed => next.closed_at = Some(now),
            _ => {}
        }

        let audit = AuditEntry {
            ticket_id: id.clone(),
            actor: actor.clone(),
            from,
            to,
            at: now,
            note,
        };
        let penalty = result.is_rejection.then(|| PenaltyEntry {
            ticket_id: id.clone(),
            assignee: next.assignee.clone(),
            kind: PenaltyKind::Rejection,
            severity: next.severity,
            at: now,
        });

        let stored = self
            .repository
            .apply_transition(next, current.version, audit, penalty)?;

        if result.is_rejection {
            warn!(
                ticket = %id,
                assignee = %stored.assignee,
                reviewer = %actor.name,
                severity = %stored.severity,
                "work sent back for rework"
            );
        }

        info!(ticket = %id, %from, %to, actor = %actor.name, "ticket transitioned");

        Ok(TransitionOutcome {
            ticket: stored,
            from,
            result,
        })
    }

    /// Attach photo metadata to an unresolved ticket.
    pub fn attach_photo(
        &self,
        id: &TicketId,
        photo: PhotoRecord,
    ) -> Result<(), TicketServiceError> {
        let ticket = self.get(id)?;
        if ticket.status.is_terminal() {
            return Err(TicketServiceError::Resolved {
                id: id.clone(),
                status: ticket.status,
            });
        }
        debug!(ticket = %id, tag = photo.tag.label(), "photo attached");
        self.repository.add_photo(id, photo)?;
        Ok(())
    }

    /// Record a failed inspection against the assignee of an inspection ticket.
    pub fn record_failed_inspection(
        &self,
        id: &TicketId,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<PenaltyEntry, TicketServiceError> {
        if !actor.role.has_authority() {
            return Err(TicketServiceError::Forbidden {
                role: actor.role,
                action: "record a failed inspection",
            });
        }

        let ticket = self.get(id)?;
        if !ticket.inspection {
            return Err(TicketServiceError::NotInspection(id.clone()));
        }

        let entry = PenaltyEntry {
            ticket_id: id.clone(),
            assignee: ticket.assignee,
            kind: PenaltyKind::FailedInspection,
            severity: ticket.severity,
            at: now,
        };
        self.repository.record_penalty(entry.clone())?;
        warn!(ticket = %id, assignee = %entry.assignee, inspector = %actor.name, "inspection failed");
        Ok(entry)
    }

    /// Create one ticket per template due on `date`, skipping templates that
    /// already produced a ticket that day.
    pub fn generate_recurring(
        &self,
        templates: &[RecurringTemplate],
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<TicketRecord>, TicketServiceError> {
        let existing = self.repository.list()?;
        let mut created = Vec::new();

        for template in templates.iter().filter(|template| template.is_due(date)) {
            let already_generated = existing.iter().any(|ticket| {
                ticket.template_key.as_deref() == Some(template.key.as_str())
                    && ticket.created_at.date_naive() == date
            });
            if already_generated {
                debug!(template = %template.key, %date, "recurring ticket already generated");
                continue;
            }
            created.push(self.create(template.instantiate(), now)?);
        }

        info!(%date, generated = created.len(), "recurring tickets generated");
        Ok(created)
    }

    /// Rebuild the scoring input for `assignee` from stored tickets, audit entries and penalties.
    ///
    /// A ticket belongs to the period when it was opened, submitted, moved or
    /// penalized inside it, so work spanning the period start still counts.
    pub fn history_for(
        &self,
        assignee: &str,
        period: Period,
    ) -> Result<Vec<TicketHistoryRecord>, TicketServiceError> {
        let mut history = Vec::new();

        for ticket in self.repository.list()? {
            if ticket.assignee != assignee {
                continue;
            }

            let audit = self.repository.audit_trail(&ticket.id)?;
            let penalties = self.repository.penalties(&ticket.id)?;
            let active = period.contains(ticket.created_at)
                || ticket.submitted_at.is_some_and(|at| period.contains(at))
                || audit.iter().any(|entry| period.contains(entry.at))
                || penalties.iter().any(|penalty| period.contains(penalty.at));
            if !active {
                continue;
            }

            let mut timeline: Vec<(DateTime<Utc>, TicketEvent)> = Vec::new();
            for entry in audit {
                let event = match entry.to {
                    TicketStatus::Closed => TicketEvent::Completed,
                    TicketStatus::Skipped => TicketEvent::Skipped,
                    _ => continue,
                };
                timeline.push((entry.at, event));
            }
            for penalty in penalties {
                let event = match penalty.kind {
                    PenaltyKind::Rejection => TicketEvent::Rejection,
                    PenaltyKind::FailedInspection => TicketEvent::FailedInspection,
                };
                timeline.push((penalty.at, event));
            }
            timeline.retain(|(at, _)| period.contains(*at));
            timeline.sort_by_key(|(at, _)| *at);

            history.push(TicketHistoryRecord {
                id: ticket.id.clone(),
                severity: ticket.severity,
                recurring: ticket.recurring,
                inspection: ticket.inspection,
                opened_at: ticket.created_at,
                submitted_at: ticket.submitted_at,
                events: timeline.into_iter().map(|(_, event)| event).collect(),
                was_skipped: ticket.status == TicketStatus::Skipped,
            });
        }

        Ok(history)
    }

    /// Score `assignee` for `period` and append the result to score history.
    pub fn score(
        &self,
        assignee: &str,
        period: Period,
        now: DateTime<Utc>,
    ) -> Result<ScoreRecord, TicketServiceError> {
        let history = self.history_for(assignee, period)?;

        let mut completed: BTreeMap<String, u32> = BTreeMap::new();
        for ticket in self.repository.list()? {
            if ticket.closed_at.is_some_and(|at| period.contains(at)) {
                *completed.entry(ticket.assignee).or_default() += 1;
            }
        }
        let completed_count = completed.get(assignee).copied().unwrap_or(0);
        let max_completed = completed.values().copied().max().unwrap_or(0);

        let breakdown = compute_score(&history, period, completed_count, max_completed);
        let record = ScoreRecord {
            assignee: assignee.to_string(),
            breakdown,
            computed_at: now,
        };
        self.repository.record_score(record.clone())?;

        info!(
            assignee,
            total = record.breakdown.total,
            tickets = history.len(),
            "score recorded"
        );
        Ok(record)
    }

    pub fn get(&self, id: &TicketId) -> Result<TicketRecord, TicketServiceError> {
        self.repository
            .fetch(id)?
            .ok_or_else(|| TicketServiceError::NotFound(id.clone()))
    }

    pub fn audit_trail(&self, id: &TicketId) -> Result<Vec<AuditEntry>, TicketServiceError> {
        self.get(id)?;
        Ok(self.repository.audit_trail(id)?)
    }

    pub fn score_history(&self, assignee: &str) -> Result<Vec<ScoreRecord>, TicketServiceError> {
        Ok(self.repository.scores(assignee)?)
    }
}

/// Error raised by the ticket service.
#[derive(Debug, thiserror::Error)]
pub enum TicketServiceError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Evidence(#[from] EvidenceError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("ticket {0} not found")]
    NotFound(TicketId),
    #[error("ticket {id} is already {status}")]
    Resolved { id: TicketId, status: TicketStatus },
    #[error("ticket {0} is not flagged for inspection")]
    NotInspection(TicketId),
    #[error("{role} role cannot {action}")]
    Forbidden {
        role: ActorRole,
        action: &'static str,
    },
}
