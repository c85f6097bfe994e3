use super::super::domain::{TicketEvent, TicketHistoryRecord};
use super::weights::{
    BASE_SCORE, FAILED_INSPECTION_PENALTY, PERFECT_STREAK_BONUS, REJECTION_PENALTY,
    SKIP_PENALTY_POOL, SPEED_FLOOR, SPEED_PENALTY_PER_HOUR,
};

/// Starts at 100 and only ever falls: rejections and failed inspections are
/// scaled by the ticket's severity multiplier.
pub(super) fn quality(tickets: &[TicketHistoryRecord]) -> f64 {
    let mut score = BASE_SCORE;
    for ticket in tickets {
        let multiplier = ticket.severity.multiplier();
        for event in &ticket.events {
            match event {
                TicketEvent::Rejection => score -= REJECTION_PENALTY * multiplier,
                TicketEvent::FailedInspection => score -= FAILED_INSPECTION_PENALTY * multiplier,
                TicketEvent::Completed | TicketEvent::Skipped => {}
            }
        }
    }
    score
}

/// Recurring tickets only. The skip penalty pool is shared across the recurring
/// set, and a period without skips earns the streak bonus instead.
pub(super) fn consistency(tickets: &[TicketHistoryRecord]) -> f64 {
    let recurring: Vec<&TicketHistoryRecord> =
        tickets.iter().filter(|ticket| ticket.recurring).collect();
    if recurring.is_empty() {
        return BASE_SCORE;
    }

    let skipped = recurring.iter().filter(|ticket| ticket.was_skipped).count();
    if skipped == 0 {
        return BASE_SCORE + PERFECT_STREAK_BONUS;
    }

    let per_skip = SKIP_PENALTY_POOL / recurring.len() as f64;
    BASE_SCORE - per_skip * skipped as f64
}

/// Mean per-ticket speed over submitted tickets; unsubmitted tickets are not assessed.
pub(super) fn speed(tickets: &[TicketHistoryRecord]) -> f64 {
    let scores: Vec<f64> = tickets.iter().filter_map(ticket_speed).collect();
    if scores.is_empty() {
        return BASE_SCORE;
    }
    scores.iter().sum::<f64>() / scores.len() as f64
}

fn ticket_speed(ticket: &TicketHistoryRecord) -> Option<f64> {
    let submitted_at = ticket.submitted_at?;
    let elapsed_hours = (submitted_at - ticket.opened_at).num_milliseconds() as f64 / 3_600_000.0;
    let hours_over = elapsed_hours - ticket.severity.deadline_hours();
    if hours_over <= 0.0 {
        return Some(BASE_SCORE);
    }
    Some((BASE_SCORE - hours_over * SPEED_PENALTY_PER_HOUR).max(SPEED_FLOOR))
}

pub(super) fn volume(completed_count: u32, max_completed_by_any_user: u32) -> f64 {
    if max_completed_by_any_user == 0 {
        return 0.0;
    }
    let ratio = f64::from(completed_count) / f64::from(max_completed_by_any_user);
    (ratio * BASE_SCORE).min(BASE_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::domain::{Severity, TicketId};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn opened() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 6, 8, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn record(severity: Severity) -> TicketHistoryRecord {
        TicketHistoryRecord {
            id: TicketId::new("tkt-000042"),
            severity,
            recurring: false,
            inspection: false,
            opened_at: opened(),
            submitted_at: None,
            events: Vec::new(),
            was_skipped: false,
        }
    }

    #[test]
    fn quality_scales_failed_inspection_by_severity() {
        let mut ticket = record(Severity::Elevated);
        ticket.events = vec![TicketEvent::FailedInspection, TicketEvent::Completed];

        assert_eq!(quality(&[ticket]), 80.0);
    }

    #[test]
    fn quality_can_fall_below_zero() {
        let mut ticket = record(Severity::Critical);
        ticket.events = vec![TicketEvent::Rejection; 2];

        assert_eq!(quality(&[ticket]), -20.0);
    }

    #[test]
    fn consistency_ignores_skips_on_one_off_tickets() {
        let mut one_off = record(Severity::Low);
        one_off.was_skipped = true;
        let mut recurring = record(Severity::Low);
        recurring.recurring = true;

        assert_eq!(consistency(&[one_off, recurring]), 110.0);
    }

    #[test]
    fn consistency_splits_penalty_across_recurring_tickets() {
        let mut tickets = vec![record(Severity::Low); 3];
        for ticket in &mut tickets {
            ticket.recurring = true;
        }
        tickets[0].was_skipped = true;

        let score = consistency(&tickets);
        assert!((score - (100.0 - 50.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn speed_penalizes_fractional_hours() {
        let mut ticket = record(Severity::Elevated);
        ticket.submitted_at = Some(opened() + Duration::minutes(9 * 60 + 30));

        assert!((speed(&[ticket]) - 92.5).abs() < 1e-9);
    }

    #[test]
    fn speed_averages_only_submitted_tickets() {
        let mut late = record(Severity::Critical);
        late.submitted_at = Some(opened() + Duration::hours(12));
        let pending = record(Severity::Critical);

        assert_eq!(speed(&[late, pending]), 50.0);
    }

    #[test]
    fn volume_is_relative_to_top_performer() {
        assert_eq!(volume(3, 12), 25.0);
        assert_eq!(volume(12, 12), 100.0);
    }
}
