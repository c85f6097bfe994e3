use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rules::{
    ActorRole, ClosedTicketSummary, NewTicketInfo, ScoreBreakdown, Severity, TicketId,
    TicketSnapshot, TicketStatus,
};

/// Person acting on a ticket, with the role asserted by the authenticating layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
    pub role: ActorRole,
}

impl Actor {
    pub fn new(name: impl Into<String>, role: ActorRole) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }
}

/// Intake payload for a ticket, whether reported by hand or generated from a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTicket {
    pub title: String,
    pub area: String,
    pub category: String,
    pub severity: Severity,
    #[serde(default)]
    pub recurring: bool,
    #[serde(default)]
    pub inspection: bool,
    pub assignee: String,
    #[serde(default)]
    pub template_key: Option<String>,
}

/// Stored ticket. `version` increments on every status write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketRecord {
    pub id: TicketId,
    pub title: String,
    pub area: String,
    pub category: String,
    pub severity: Severity,
    pub recurring: bool,
    pub inspection: bool,
    pub assignee: String,
    pub status: TicketStatus,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    /// Set once at creation when the ticket repeats a recently closed one.
    pub repeat_of: Option<TicketId>,
    pub template_key: Option<String>,
}

impl TicketRecord {
    pub fn snapshot(&self) -> TicketSnapshot {
        TicketSnapshot {
            id: self.id.clone(),
            status: self.status,
            recurring: self.recurring,
            severity: self.severity,
        }
    }

    pub fn repeat_probe(&self) -> NewTicketInfo {
        NewTicketInfo {
            area: self.area.clone(),
            category: self.category.clone(),
            created_at: self.created_at,
        }
    }

    pub fn closed_summary(&self) -> Option<ClosedTicketSummary> {
        match (self.status, self.closed_at) {
            (TicketStatus::Closed, Some(closed_at)) => Some(ClosedTicketSummary {
                id: self.id.clone(),
                area: self.area.clone(),
                category: self.category.clone(),
                closed_at,
            }),
            _ => None,
        }
    }
}

/// Append-only record of a successful transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub ticket_id: TicketId,
    pub actor: Actor,
    pub from: TicketStatus,
    pub to: TicketStatus,
    pub at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotoTag {
    Before,
    After,
    Proof,
}

impl PhotoTag {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
            Self::Proof => "proof",
        }
    }
}

/// Metadata for an uploaded photo; the image itself lives in external storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub tag: PhotoTag,
    pub storage_key: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyKind {
    Rejection,
    FailedInspection,
}

/// Quality penalty attributed to the assignee for a single event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyEntry {
    pub ticket_id: TicketId,
    pub assignee: String,
    pub kind: PenaltyKind,
    pub severity: Severity,
    pub at: DateTime<Utc>,
}

/// Historical score snapshot for an assignee and period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub assignee: String,
    pub breakdown: ScoreBreakdown,
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub actor: Actor,
    pub to: TicketStatus,
    #[serde(default)]
    pub note: Option<String>,
}

/// Sanitized response after a transition has been applied.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionView {
    pub ticket_id: TicketId,
    pub from: &'static str,
    pub status: &'static str,
    pub is_rejection: bool,
    pub version: u64,
}
