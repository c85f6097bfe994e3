use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for tickets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TicketId(pub String);

impl TicketId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    NeedsReview,
    Closed,
    Skipped,
}

impl TicketStatus {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Open,
            Self::InProgress,
            Self::NeedsReview,
            Self::Closed,
            Self::Skipped,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::NeedsReview => "needs_review",
            Self::Closed => "closed",
            Self::Skipped => "skipped",
        }
    }

    /// Closed and skipped tickets accept no further transitions.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Skipped)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Urgency class of a ticket. Drives quality penalties and speed deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    #[serde(alias = "medium")]
    Elevated,
    #[serde(alias = "high")]
    Critical,
}

impl Severity {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Elevated => "elevated",
            Self::Critical => "critical",
        }
    }

    /// Scalar applied to quality penalties.
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::Low => 1.0,
            Self::Elevated => 2.0,
            Self::Critical => 4.0,
        }
    }

    /// Hours allowed between a ticket being opened and its submission for review.
    pub const fn deadline_hours(self) -> f64 {
        match self {
            Self::Low => 48.0,
            Self::Elevated => 8.0,
            Self::Critical => 2.0,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Role asserted by the caller on behalf of the acting person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Owner,
    Manager,
    Worker,
}

impl ActorRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Manager => "manager",
            Self::Worker => "worker",
        }
    }

    /// Owners and managers may close, reject and skip work.
    pub const fn has_authority(self) -> bool {
        matches!(self, Self::Owner | Self::Manager)
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Immutable view of a ticket at the moment a transition is requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketSnapshot {
    pub id: TicketId,
    pub status: TicketStatus,
    pub recurring: bool,
    pub severity: Severity,
}

/// Outcome of a legal transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransitionResult {
    /// Set when reviewed work was sent back; the caller applies the penalty.
    pub is_rejection: bool,
}

/// Lifecycle event observed on a ticket during a scoring period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketEvent {
    Rejection,
    FailedInspection,
    Completed,
    Skipped,
}

/// Per-ticket input to the scoring engine, rebuilt from audit history for each run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketHistoryRecord {
    pub id: TicketId,
    pub severity: Severity,
    pub recurring: bool,
    #[serde(default)]
    pub inspection: bool,
    pub opened_at: DateTime<Utc>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub events: Vec<TicketEvent>,
    #[serde(default)]
    pub was_skipped: bool,
}

/// Scoring window. Carried through to the breakdown untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Period {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }
}

/// Four independently computed dimensions plus their weighted total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub period: Period,
    pub quality: f64,
    pub consistency: f64,
    pub speed: f64,
    pub volume: f64,
    pub total: f64,
}

/// Projection of a freshly created ticket used for repeat comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTicketInfo {
    pub area: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

/// Projection of a resolved ticket used for repeat comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosedTicketSummary {
    pub id: TicketId,
    pub area: String,
    pub category: String,
    pub closed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RepeatIssueResult {
    pub is_repeat: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_ticket_id: Option<TicketId>,
}

impl RepeatIssueResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn repeat_of(id: TicketId) -> Self {
        Self {
            is_repeat: true,
            previous_ticket_id: Some(id),
        }
    }
}
