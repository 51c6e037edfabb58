//! Half-open time interval used for schedules and booking windows

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A `[start, end)` interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Returns `None` unless `start < end`
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    /// Two ranges overlap iff `start1 < end2 && start2 < end1`
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Length in hours as an exact decimal (minute precision)
    pub fn duration_hours(&self) -> Decimal {
        Decimal::from(self.duration().num_minutes()) / Decimal::from(60)
    }

    /// Whole minutes left until `end`, rounded up; zero once elapsed
    pub fn remaining_minutes(&self, now: DateTime<Utc>) -> i64 {
        let millis = (self.end - now).num_milliseconds();
        if millis <= 0 {
            0
        } else {
            (millis + 59_999) / 60_000
        }
    }

    /// Same interval shifted by whole weeks
    pub fn shifted_weeks(&self, weeks: i64) -> Self {
        let offset = Duration::weeks(weeks);
        Self {
            start: self.start + offset,
            end: self.end + offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, h, m, 0).unwrap()
    }

    fn range(a: (u32, u32), b: (u32, u32)) -> TimeRange {
        TimeRange::new(at(a.0, a.1), at(b.0, b.1)).unwrap()
    }

    #[test]
    fn test_rejects_empty_or_inverted() {
        assert!(TimeRange::new(at(10, 0), at(10, 0)).is_none());
        assert!(TimeRange::new(at(11, 0), at(10, 0)).is_none());
    }

    #[test]
    fn test_overlap_is_half_open() {
        let a = range((10, 0), (11, 0));
        assert!(a.overlaps(&range((10, 30), (11, 30))));
        assert!(a.overlaps(&range((9, 0), (12, 0))));
        // touching endpoints do not overlap
        assert!(!a.overlaps(&range((11, 0), (12, 0))));
        assert!(!a.overlaps(&range((9, 0), (10, 0))));
    }

    #[test]
    fn test_duration_hours() {
        assert_eq!(range((10, 0), (11, 30)).duration_hours(), Decimal::new(15, 1));
    }

    #[test]
    fn test_remaining_minutes_rounds_up() {
        let r = range((10, 0), (11, 0));
        let now = at(10, 15) + Duration::seconds(30);
        assert_eq!(r.remaining_minutes(now), 45);
        assert_eq!(r.remaining_minutes(at(11, 0)), 0);
        assert_eq!(r.remaining_minutes(at(12, 0)), 0);
    }

    #[test]
    fn test_shifted_weeks() {
        let r = range((10, 0), (11, 0)).shifted_weeks(2);
        assert_eq!(r.start, at(10, 0) + Duration::days(14));
    }
}
