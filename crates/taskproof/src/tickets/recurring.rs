use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::domain::NewTicket;
use crate::rules::Severity;

/// How often a recurring template produces a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "every", content = "on")]
pub enum Cadence {
    Daily,
    Weekly(Weekday),
    /// Day of month, clamped to the last day for shorter months.
    Monthly(u32),
}

impl Cadence {
    pub fn is_due(self, date: NaiveDate) -> bool {
        match self {
            Cadence::Daily => true,
            Cadence::Weekly(weekday) => date.weekday() == weekday,
            Cadence::Monthly(day) => date.day() == day.clamp(1, days_in_month(date)),
        }
    }
}

fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

/// Blueprint for chores that come back on a fixed cadence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringTemplate {
    pub key: String,
    pub title: String,
    pub area: String,
    pub category: String,
    pub severity: Severity,
    #[serde(default)]
    pub inspection: bool,
    pub assignee: String,
    pub cadence: Cadence,
}

impl RecurringTemplate {
    pub fn is_due(&self, date: NaiveDate) -> bool {
        self.cadence.is_due(date)
    }

    pub fn instantiate(&self) -> NewTicket {
        NewTicket {
            title: self.title.clone(),
            area: self.area.clone(),
            category: self.category.clone(),
            severity: self.severity,
            recurring: true,
            inspection: self.inspection,
            assignee: self.assignee.clone(),
            template_key: Some(self.key.clone()),
        }
    }
}
