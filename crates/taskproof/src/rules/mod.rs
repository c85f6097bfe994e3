//! Domain policy for tickets. Every unit in here is synchronous and free of
//! side effects; callers supply timestamps and candidate sets explicitly.

pub mod domain;
pub mod repeat;
pub mod scoring;
pub mod transitions;

pub use domain::{
    ActorRole, ClosedTicketSummary, NewTicketInfo, Period, RepeatIssueResult, ScoreBreakdown,
    Severity, TicketEvent, TicketHistoryRecord, TicketId, TicketSnapshot, TicketStatus,
    TransitionResult,
};
pub use repeat::{detect_repeat_issue, REPEAT_WINDOW_DAYS};
pub use scoring::compute_score;
pub use transitions::{validate_transition, TransitionError, TransitionViolation};
