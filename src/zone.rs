/// Calendar zone handling for statistics bucketing
///
/// Pins the "local calendar date" policy to a fixed UTC offset so results do not
/// depend on the time zone of the machine running the binary.
use anyhow::{anyhow, Result};
use chrono::{DateTime, Datelike, Days, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};

/// A fixed-offset calendar used to turn instants into local dates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarZone {
    offset: FixedOffset,
}

impl Default for CalendarZone {
    fn default() -> Self {
        Self::utc()
    }
}

impl CalendarZone {
    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    /// Parse a zone string
    ///
    /// Supported formats:
    /// - "UTC" or "Z" → UTC
    /// - "+02:00" → two hours east of UTC
    /// - "-05:30" → five and a half hours west of UTC
    pub fn parse(zone: &str) -> Result<Self> {
        let zone = zone.trim();

        if zone.eq_ignore_ascii_case("utc") || zone == "Z" {
            return Ok(Self::utc());
        }

        let (sign, rest) = match zone.chars().next() {
            Some('+') => (1, &zone[1..]),
            Some('-') => (-1, &zone[1..]),
            _ => {
                return Err(anyhow!(
                    "Invalid UTC offset: '{}'. Expected: 'UTC', '+HH:MM' or '-HH:MM'",
                    zone
                ))
            }
        };

        let (hours_str, minutes_str) = rest
            .split_once(':')
            .ok_or_else(|| anyhow!("Invalid UTC offset: '{}'. Expected '+HH:MM'", zone))?;

        let hours: i32 = hours_str
            .parse()
            .map_err(|_| anyhow!("Invalid hours in UTC offset: '{}'", zone))?;
        let minutes: i32 = minutes_str
            .parse()
            .map_err(|_| anyhow!("Invalid minutes in UTC offset: '{}'", zone))?;

        if !(0..=14).contains(&hours) || !(0..60).contains(&minutes) {
            return Err(anyhow!("UTC offset out of range: '{}'", zone));
        }

        let offset = FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .ok_or_else(|| anyhow!("UTC offset out of range: '{}'", zone))?;

        Ok(Self { offset })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Calendar date of an instant in this zone
    ///
    /// `None` when the local date falls outside chrono's calendar, which only
    /// happens within a few hours of the representable range.
    pub fn local_date(&self, instant: DateTime<Utc>) -> Option<NaiveDate> {
        instant
            .naive_utc()
            .checked_add_offset(self.offset)
            .map(|local| local.date())
    }

    /// Like [`Self::local_date`], saturating at the first or last representable date
    pub fn clamped_local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        self.local_date(instant).unwrap_or(if self.offset.local_minus_utc() > 0 {
            NaiveDate::MAX
        } else {
            NaiveDate::MIN
        })
    }

    /// Instant of local midnight at the start of `date`, saturating at the
    /// representable range
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let local_midnight = date.and_time(NaiveTime::MIN).and_utc();
        local_midnight
            .checked_sub_signed(Duration::seconds(self.offset.local_minus_utc() as i64))
            .unwrap_or(if self.offset.local_minus_utc() > 0 {
                DateTime::<Utc>::MIN_UTC
            } else {
                DateTime::<Utc>::MAX_UTC
            })
    }
}

impl std::fmt::Display for CalendarZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.offset.local_minus_utc() == 0 {
            write!(f, "UTC")
        } else {
            write!(f, "{}", self.offset)
        }
    }
}

/// Start-of-period instants used to classify events into rolling counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundaries {
    pub today: DateTime<Utc>,
    /// Weeks begin on Sunday
    pub week: DateTime<Utc>,
    pub month: DateTime<Utc>,
    pub year: DateTime<Utc>,
}

impl Boundaries {
    pub fn at(now: DateTime<Utc>, zone: &CalendarZone) -> Self {
        let date = zone.clamped_local_date(now);
        let week_start = days_before(date, date.weekday().num_days_from_sunday());
        let month_start = days_before(date, date.day0());
        let year_start = days_before(date, date.ordinal0());

        Self {
            today: zone.start_of_day(date),
            week: zone.start_of_day(week_start),
            month: zone.start_of_day(month_start),
            year: zone.start_of_day(year_start),
        }
    }
}

/// `date` minus `days`, stopping at the first representable date
pub(crate) fn days_before(date: NaiveDate, days: u32) -> NaiveDate {
    date.checked_sub_days(Days::new(days as u64))
        .unwrap_or(NaiveDate::MIN)
}
