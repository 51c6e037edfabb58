//! Schedule entity - a bookable slot on a partner's calendar

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::error::DomainError;
use crate::value_objects::{Snowflake, TimeRange};

/// Maximum number of weekly copies for a recurring schedule
pub const MAX_RECURRING_WEEKS: u32 = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub id: Snowflake,
    pub partner_id: Snowflake,
    pub date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}

impl Schedule {
    pub fn new(id: Snowflake, partner_id: Snowflake, slot: &ScheduleSlot) -> Self {
        Self {
            id,
            partner_id,
            date: slot.date,
            start_time: slot.window.start,
            end_time: slot.window.end,
            is_available: true,
            created_at: Utc::now(),
        }
    }

    pub fn window(&self) -> TimeRange {
        TimeRange {
            start: self.start_time,
            end: self.end_time,
        }
    }

    pub fn slot(&self) -> ScheduleSlot {
        ScheduleSlot {
            date: self.date,
            window: self.window(),
        }
    }
}

/// A validated `(date, start, end)` triple that has not been stored yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleSlot {
    pub date: NaiveDate,
    pub window: TimeRange,
}

impl ScheduleSlot {
    pub fn new(
        date: NaiveDate,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let window = TimeRange::new(start, end).ok_or(DomainError::InvalidTimeRange)?;
        Ok(Self { date, window })
    }

    /// Slot starting `lead` after `now` and lasting `duration`
    pub fn starting_in(now: DateTime<Utc>, lead: Duration, duration: Duration) -> Result<Self, DomainError> {
        let start = now + lead;
        Self::new(start.date_naive(), start, start + duration)
    }

    /// This slot followed by weekly copies, `weeks` entries in total
    pub fn recurring(&self, weeks: u32) -> Vec<ScheduleSlot> {
        let weeks = weeks.clamp(1, MAX_RECURRING_WEEKS);
        (0..i64::from(weeks))
            .map(|w| ScheduleSlot {
                date: self.date + Duration::weeks(w),
                window: self.window.shifted_weeks(w),
            })
            .collect()
    }

    pub fn overlaps(&self, other: &ScheduleSlot) -> bool {
        self.window.overlaps(&other.window)
    }
}

/// IDs of open schedules on the same date whose window overlaps `slot`
///
/// Closed schedules only keep booking history and never block a new slot.
pub fn overlapping_schedules(slot: &ScheduleSlot, existing: &[Schedule]) -> Vec<Snowflake> {
    existing
        .iter()
        .filter(|s| s.is_available && s.date == slot.date && s.window().overlaps(&slot.window))
        .map(|s| s.id)
        .collect()
}

/// Index pairs `(i, j)` of candidate slots that collide with each other
pub fn self_overlaps(slots: &[ScheduleSlot]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for (i, a) in slots.iter().enumerate() {
        for (j, b) in slots.iter().enumerate().skip(i + 1) {
            if a.date == b.date && a.overlaps(b) {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn slot(day: u32, from: u32, to: u32) -> ScheduleSlot {
        let date = NaiveDate::from_ymd_opt(2025, 6, day).unwrap();
        ScheduleSlot::new(
            date,
            Utc.with_ymd_and_hms(2025, 6, day, from, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 6, day, to, 0, 0).unwrap(),
        )
        .unwrap()
    }

    fn stored(id: i64, s: ScheduleSlot) -> Schedule {
        Schedule::new(Snowflake::new(id), Snowflake::new(9), &s)
    }

    #[test]
    fn test_slot_requires_ordered_times() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let t = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        assert!(matches!(
            ScheduleSlot::new(date, t, t),
            Err(DomainError::InvalidTimeRange)
        ));
    }

    #[test]
    fn test_recurring_adds_weekly_copies() {
        let copies = slot(2, 10, 12).recurring(3);
        assert_eq!(copies.len(), 3);
        assert_eq!(copies[1].date, NaiveDate::from_ymd_opt(2025, 6, 9).unwrap());
        assert_eq!(copies[2].window.start.date_naive(), copies[2].date);
    }

    #[test]
    fn test_recurring_is_capped() {
        assert_eq!(slot(2, 10, 12).recurring(40).len(), MAX_RECURRING_WEEKS as usize);
        assert_eq!(slot(2, 10, 12).recurring(0).len(), 1);
    }

    #[test]
    fn test_overlapping_schedules_same_date_only() {
        let existing = vec![stored(1, slot(3, 10, 12)), stored(2, slot(4, 10, 12))];
        assert_eq!(
            overlapping_schedules(&slot(3, 11, 13), &existing),
            vec![Snowflake::new(1)]
        );
        assert!(overlapping_schedules(&slot(3, 12, 13), &existing).is_empty());
    }

    #[test]
    fn test_closed_schedules_do_not_block() {
        let mut closed = stored(1, slot(3, 10, 12));
        closed.is_available = false;
        let existing = vec![closed, stored(2, slot(3, 14, 15))];
        assert!(overlapping_schedules(&slot(3, 10, 12), &existing).is_empty());
        assert_eq!(
            overlapping_schedules(&slot(3, 14, 16), &existing),
            vec![Snowflake::new(2)]
        );
    }

    #[test]
    fn test_self_overlaps() {
        let slots = vec![slot(5, 9, 11), slot(5, 10, 12), slot(5, 12, 13)];
        assert_eq!(self_overlaps(&slots), vec![(0, 1)]);
    }
}
