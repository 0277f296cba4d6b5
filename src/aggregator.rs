/// Statistics aggregation module.
///
/// Turns an unordered collection of interaction events into rolling counters,
/// a peak day, and a 7-day series. Pure: no I/O, no clock access, no state
/// carried between calls.
use chrono::{DateTime, Days, NaiveDate, Utc};
use indexmap::IndexMap;

use crate::event::InteractionEvent;
use crate::stats::{PeakDay, SeriesPoint, StatsSnapshot, WeeklySeries};
use crate::timefmt::format_chart_label;
use crate::zone::{days_before, Boundaries, CalendarZone};

/// Number of days covered by the weekly series.
pub const SERIES_DAYS: usize = 7;

// ============================================================================
// Intermediate Aggregation Structs (private)
// ============================================================================

/// Counters for the four nested rolling windows (private).
struct RollingCounters {
    boundaries: Boundaries,
    today: u32,
    week: u32,
    month: u32,
    year: u32,
}

impl RollingCounters {
    fn new(boundaries: Boundaries) -> Self {
        Self {
            boundaries,
            today: 0,
            week: 0,
            month: 0,
            year: 0,
        }
    }

    fn record(&mut self, at: DateTime<Utc>) {
        if at > self.boundaries.today {
            self.today += 1;
        }
        if at > self.boundaries.week {
            self.week += 1;
        }
        if at > self.boundaries.month {
            self.month += 1;
        }
        if at > self.boundaries.year {
            self.year += 1;
        }
    }
}

/// Per-date tallies in first-seen order (private).
struct DailyCounts {
    by_day: IndexMap<NaiveDate, u32>,
}

impl DailyCounts {
    fn new() -> Self {
        Self {
            by_day: IndexMap::new(),
        }
    }

    fn record(&mut self, date: NaiveDate) {
        *self.by_day.entry(date).or_insert(0) += 1;
    }

    /// Strictly-greater scan, so the earliest inserted date wins a tie.
    fn peak(&self) -> PeakDay {
        let mut peak = PeakDay::none();
        for (&date, &count) in &self.by_day {
            if count > peak.count {
                peak = PeakDay {
                    date: Some(date),
                    count,
                };
            }
        }
        peak
    }
}

// ============================================================================
// Aggregator
// ============================================================================

/// Computes statistics for a fixed calendar zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsAggregator {
    zone: CalendarZone,
}

impl StatsAggregator {
    pub fn new(zone: CalendarZone) -> Self {
        Self { zone }
    }

    pub fn zone(&self) -> &CalendarZone {
        &self.zone
    }

    /// Computes rolling counters and the peak day.
    ///
    /// Only events strictly after `cutoff` are counted. Events without a
    /// usable timestamp are skipped. An event counts towards a window when it
    /// is strictly after that window's start, so the counters nest
    /// (`this_year >= this_month >= this_week >= today`).
    ///
    /// # Arguments
    ///
    /// * `events` - Interaction events in any order
    /// * `cutoff` - Events at or before this instant are ignored
    /// * `now` - Reference instant for the window boundaries
    pub fn compute_stats(
        &self,
        events: &[InteractionEvent],
        cutoff: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> StatsSnapshot {
        let mut counters = RollingCounters::new(Boundaries::at(now, &self.zone));
        let mut daily = DailyCounts::new();

        for at in events.iter().filter_map(|e| e.occurred_at) {
            if at <= cutoff {
                continue;
            }
            let Some(date) = self.zone.local_date(at) else {
                continue;
            };
            counters.record(at);
            daily.record(date);
        }

        StatsSnapshot {
            today: counters.today,
            this_week: counters.week,
            this_month: counters.month,
            this_year: counters.year,
            peak_day: daily.peak(),
        }
    }

    /// Builds the 7-day series ending on `now`'s local date, oldest first.
    ///
    /// No cutoff is applied here, unlike [`Self::compute_stats`].
    pub fn compute_weekly_series(
        &self,
        events: &[InteractionEvent],
        now: DateTime<Utc>,
        label_key: &str,
    ) -> WeeklySeries {
        let today = self.zone.clamped_local_date(now);
        // Near the start of the calendar the window begins at the first date instead
        let first = days_before(today, SERIES_DAYS as u32 - 1);

        let mut counts = [0u32; SERIES_DAYS];
        for date in events
            .iter()
            .filter_map(|e| e.occurred_at)
            .filter_map(|at| self.zone.local_date(at))
        {
            let offset = date.signed_duration_since(first).num_days();
            if (0..SERIES_DAYS as i64).contains(&offset) {
                counts[offset as usize] += 1;
            }
        }

        let points = counts
            .iter()
            .zip(0u64..)
            .filter_map(|(&count, i)| {
                let date = first.checked_add_days(Days::new(i))?;
                Some(SeriesPoint {
                    date,
                    label: format_chart_label(date),
                    count,
                })
            })
            .collect();

        WeeklySeries {
            label_key: label_key.to_string(),
            points,
        }
    }
}
