//! Ticket service layer: persistence, evidence gating, penalties, recurring
//! generation and score history around the rule engine.

pub mod domain;
pub mod evidence;
pub mod recurring;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Actor, AuditEntry, NewTicket, PenaltyEntry, PenaltyKind, PhotoRecord, PhotoTag, ScoreRecord,
    TicketRecord, TransitionRequest, TransitionView,
};
pub use evidence::{require_submission_evidence, EvidenceError};
pub use recurring::{Cadence, RecurringTemplate};
pub use repository::{RepositoryError, TicketRepository};
pub use router::ticket_router;
pub use service::{TicketService, TicketServiceError, TransitionOutcome};
