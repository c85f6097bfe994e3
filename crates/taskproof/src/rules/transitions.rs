use super::domain::{ActorRole, TicketId, TicketSnapshot, TicketStatus, TransitionResult};

/// Transitions that only an owner or manager may perform.
pub const AUTHORITY_GATED: [(TicketStatus, TicketStatus); 4] = [
    (TicketStatus::NeedsReview, TicketStatus::Closed),
    (TicketStatus::NeedsReview, TicketStatus::InProgress),
    (TicketStatus::Open, TicketStatus::Skipped),
    (TicketStatus::InProgress, TicketStatus::Skipped),
];

/// The send-back transition: reviewed work found unsatisfactory.
pub const REJECTION: (TicketStatus, TicketStatus) =
    (TicketStatus::NeedsReview, TicketStatus::InProgress);

/// Legal successors of each status, ignoring role and recurrence.
pub const fn allowed_targets(from: TicketStatus) -> &'static [TicketStatus] {
    match from {
        TicketStatus::Open => &[TicketStatus::InProgress, TicketStatus::Skipped],
        TicketStatus::InProgress => &[TicketStatus::NeedsReview, TicketStatus::Skipped],
        TicketStatus::NeedsReview => &[TicketStatus::Closed, TicketStatus::InProgress],
        TicketStatus::Closed | TicketStatus::Skipped => &[],
    }
}

pub fn requires_authority(from: TicketStatus, to: TicketStatus) -> bool {
    AUTHORITY_GATED.contains(&(from, to))
}

/// Decide whether `from -> to` is legal for `actor` on `ticket`.
///
/// Rules are evaluated in a fixed order: terminal status, base graph, skip on
/// non-recurring tickets, then the authority gate. The first violated rule is
/// reported.
pub fn validate_transition(
    from: TicketStatus,
    to: TicketStatus,
    actor: ActorRole,
    ticket: &TicketSnapshot,
) -> Result<TransitionResult, TransitionError> {
    let fail = |violation| TransitionError {
        ticket_id: ticket.id.clone(),
        from,
        to,
        violation,
    };

    if from.is_terminal() {
        return Err(fail(TransitionViolation::TerminalState { from }));
    }

    let allowed = allowed_targets(from);
    if !allowed.contains(&to) {
        return Err(fail(TransitionViolation::InvalidTransition {
            from,
            to,
            allowed: allowed.to_vec(),
        }));
    }

    if to == TicketStatus::Skipped && !ticket.recurring {
        return Err(fail(TransitionViolation::NotRecurring));
    }

    if requires_authority(from, to) && !actor.has_authority() {
        return Err(fail(TransitionViolation::AuthorityRequired {
            from,
            to,
            actual: actor,
        }));
    }

    Ok(TransitionResult {
        is_rejection: (from, to) == REJECTION,
    })
}

/// Illegal transition request, carrying the ticket and the rule that refused it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("ticket {ticket_id}: {violation}")]
pub struct TransitionError {
    pub ticket_id: TicketId,
    pub from: TicketStatus,
    pub to: TicketStatus,
    pub violation: TransitionViolation,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionViolation {
    #[error("status '{from}' is terminal and cannot change")]
    TerminalState { from: TicketStatus },
    #[error(
        "invalid transition {from} -> {to}; allowed from {from}: {}",
        format_targets(.allowed)
    )]
    InvalidTransition {
        from: TicketStatus,
        to: TicketStatus,
        allowed: Vec<TicketStatus>,
    },
    #[error("only recurring tickets can be skipped")]
    NotRecurring,
    #[error("transition {from} -> {to} requires the owner or manager role, actor is {actual}")]
    AuthorityRequired {
        from: TicketStatus,
        to: TicketStatus,
        actual: ActorRole,
    },
}

fn format_targets(targets: &[TicketStatus]) -> String {
    if targets.is_empty() {
        return "none".to_string();
    }
    targets
        .iter()
        .map(|status| status.label())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::domain::Severity;

    fn snapshot(status: TicketStatus, recurring: bool) -> TicketSnapshot {
        TicketSnapshot {
            id: TicketId::new("tkt-000001"),
            status,
            recurring,
            severity: Severity::Low,
        }
    }

    #[test]
    fn base_graph_lists_two_targets_for_each_active_status() {
        for status in TicketStatus::ordered() {
            let expected = if status.is_terminal() { 0 } else { 2 };
            assert_eq!(allowed_targets(status).len(), expected, "{status}");
        }
    }

    #[test]
    fn authority_gated_pairs_are_all_in_the_base_graph() {
        for (from, to) in AUTHORITY_GATED {
            assert!(allowed_targets(from).contains(&to), "{from} -> {to}");
        }
    }

    #[test]
    fn invalid_transition_message_names_allowed_targets() {
        let ticket = snapshot(TicketStatus::Open, false);
        let err = validate_transition(
            TicketStatus::Open,
            TicketStatus::Closed,
            ActorRole::Owner,
            &ticket,
        )
        .expect_err("open -> closed is not in the graph");

        let message = err.to_string();
        assert!(message.contains("tkt-000001"));
        assert!(message.contains("open -> closed"));
        assert!(message.contains("in_progress, skipped"));
    }

    #[test]
    fn authority_message_names_required_and_actual_role() {
        let ticket = snapshot(TicketStatus::NeedsReview, false);
        let err = validate_transition(
            TicketStatus::NeedsReview,
            TicketStatus::Closed,
            ActorRole::Worker,
            &ticket,
        )
        .expect_err("workers cannot close");

        let message = err.to_string();
        assert!(message.contains("owner or manager"));
        assert!(message.contains("actor is worker"));
    }

    #[test]
    fn skip_on_non_recurring_is_reported_before_authority() {
        let ticket = snapshot(TicketStatus::Open, false);
        let err = validate_transition(
            TicketStatus::Open,
            TicketStatus::Skipped,
            ActorRole::Worker,
            &ticket,
        )
        .expect_err("non-recurring skip fails");

        assert_eq!(err.violation, TransitionViolation::NotRecurring);
    }
}
