/// Day counters since the couple's milestones.
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::config::Milestone;
use crate::zone::CalendarZone;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCounter {
    pub label: String,
    pub since: NaiveDate,
    pub days: i64,
}

/// Whole calendar days from `start` to `today`; negative when `start` is in the future.
pub fn days_since(start: NaiveDate, today: NaiveDate) -> i64 {
    (today - start).num_days()
}

pub fn milestone_counters(
    milestones: &[Milestone],
    now: DateTime<Utc>,
    zone: &CalendarZone,
) -> Vec<DayCounter> {
    let today = zone.clamped_local_date(now);
    milestones
        .iter()
        .map(|m| DayCounter {
            label: m.label.clone(),
            since: m.date,
            days: days_since(m.date, today),
        })
        .collect()
}
