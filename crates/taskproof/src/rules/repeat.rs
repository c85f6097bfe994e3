use chrono::Duration;

use super::domain::{ClosedTicketSummary, NewTicketInfo, RepeatIssueResult};

/// Trailing window, in days, within which a closed ticket counts as a prior occurrence.
pub const REPEAT_WINDOW_DAYS: i64 = 7;

/// Flag `new_ticket` as a recurrence of the first candidate with the same area and
/// category (case-insensitive) closed within the trailing window, endpoints included.
///
/// Candidates are checked in the order given. Callers wanting the most recent
/// match sort before calling.
pub fn detect_repeat_issue(
    new_ticket: &NewTicketInfo,
    recent_closed: &[ClosedTicketSummary],
) -> RepeatIssueResult {
    let window_start = new_ticket.created_at - Duration::days(REPEAT_WINDOW_DAYS);
    let area = new_ticket.area.to_lowercase();
    let category = new_ticket.category.to_lowercase();

    recent_closed
        .iter()
        .find(|candidate| {
            candidate.closed_at >= window_start
                && candidate.closed_at <= new_ticket.created_at
                && candidate.area.to_lowercase() == area
                && candidate.category.to_lowercase() == category
        })
        .map(|candidate| RepeatIssueResult::repeat_of(candidate.id.clone()))
        .unwrap_or_else(RepeatIssueResult::none)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::domain::TicketId;
    use chrono::{DateTime, TimeZone, Utc};

    fn created_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 14, 9, 30, 0)
            .single()
            .expect("valid timestamp")
    }

    fn candidate(id: &str, category: &str, closed_at: DateTime<Utc>) -> ClosedTicketSummary {
        ClosedTicketSummary {
            id: TicketId::new(id),
            area: "Kitchen".to_string(),
            category: category.to_string(),
            closed_at,
        }
    }

    #[test]
    fn first_match_in_supplied_order_wins() {
        let new_ticket = NewTicketInfo {
            area: "kitchen".to_string(),
            category: "cleaning".to_string(),
            created_at: created_at(),
        };
        let candidates = vec![
            candidate("tkt-000001", "plumbing", created_at() - Duration::days(1)),
            candidate("tkt-000002", "cleaning", created_at() - Duration::days(5)),
            candidate("tkt-000003", "Cleaning", created_at() - Duration::days(1)),
        ];

        let result = detect_repeat_issue(&new_ticket, &candidates);
        assert_eq!(result.previous_ticket_id, Some(TicketId::new("tkt-000002")));
    }

    #[test]
    fn candidates_closed_after_creation_are_ignored() {
        let new_ticket = NewTicketInfo {
            area: "kitchen".to_string(),
            category: "cleaning".to_string(),
            created_at: created_at(),
        };
        let candidates = vec![candidate(
            "tkt-000009",
            "cleaning",
            created_at() + Duration::minutes(1),
        )];

        assert_eq!(
            detect_repeat_issue(&new_ticket, &candidates),
            RepeatIssueResult::none()
        );
    }
}
