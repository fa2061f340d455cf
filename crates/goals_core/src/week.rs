//! crates/goals_core/src/week.rs
//!
//! Calendar-week arithmetic shared by the quota check and the weekly summary.
//!
//! The week start is pinned to Sunday rather than inherited from any ambient
//! locale, so the window is deterministic across environments. All arithmetic
//! is in UTC.

use chrono::{DateTime, Duration, NaiveTime, Utc, Weekday};

/// First day of the calendar week.
pub const WEEK_START: Weekday = Weekday::Sun;

/// The inclusive `[first, last]` range of one calendar week.
///
/// `first` is Sunday 00:00:00.000 and `last` is the following Saturday
/// 23:59:59.999; both bounds are part of the week everywhere they are used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekWindow {
    pub first: DateTime<Utc>,
    pub last: DateTime<Utc>,
}

impl WeekWindow {
    /// Returns the calendar week containing `instant`.
    pub fn containing(instant: DateTime<Utc>) -> Self {
        let week = instant.date_naive().week(WEEK_START);
        let first = week.first_day().and_time(NaiveTime::MIN).and_utc();
        let last = first + Duration::days(7) - Duration::milliseconds(1);
        Self { first, last }
    }

    /// Whether `instant` falls inside the window, bounds included.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.first && instant <= self.last
    }
}
