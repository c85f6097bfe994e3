mod dimensions;
mod weights;

pub use weights::{DimensionWeights, WEIGHTS};

use super::domain::{Period, ScoreBreakdown, TicketHistoryRecord};

/// Aggregate a period of ticket history into a four-dimension score.
///
/// `completed_count` is the number of tickets this assignee completed in the
/// period and `max_completed_by_any_user` the highest such count across all
/// assignees. Arithmetic is real-valued; rounding is left to presentation.
pub fn compute_score(
    tickets: &[TicketHistoryRecord],
    period: Period,
    completed_count: u32,
    max_completed_by_any_user: u32,
) -> ScoreBreakdown {
    let quality = dimensions::quality(tickets);
    let consistency = dimensions::consistency(tickets);
    let speed = dimensions::speed(tickets);
    let volume = dimensions::volume(completed_count, max_completed_by_any_user);

    let total = quality * WEIGHTS.quality
        + consistency * WEIGHTS.consistency
        + speed * WEIGHTS.speed
        + volume * WEIGHTS.volume;

    ScoreBreakdown {
        period,
        quality,
        consistency,
        speed,
        volume,
        total,
    }
}
