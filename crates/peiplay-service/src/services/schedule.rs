//! Schedule service
//!
//! Partners publish bookable slots here. Overlap checks compare slots filed
//! under the same calendar date.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use peiplay_common::AppError;
use peiplay_core::entities::{
    overlapping_schedules, self_overlaps, Schedule, ScheduleSlot,
};
use peiplay_core::value_objects::TimeRange;
use peiplay_core::{DomainError, Snowflake};
use tracing::{debug, info, instrument};

use crate::dto::{
    map_all, BatchScheduleRequest, BatchScheduleResponse, CreateScheduleRequest, ScheduleEntry,
    ScheduleResponse, TimeWindowQuery,
};

use super::access::AccessService;
use super::context::ServiceContext;
use super::error::ServiceResult;

/// Parse raw batch entries, keeping only well-formed slots with start < end
fn parse_entries(raw: Vec<serde_json::Value>) -> Vec<ScheduleSlot> {
    raw.into_iter()
        .filter_map(|value| serde_json::from_value::<ScheduleEntry>(value).ok())
        .filter_map(|entry| ScheduleSlot::new(entry.date, entry.start_time, entry.end_time).ok())
        .collect()
}

/// Windows of every pair of slots in the batch that collide with each other
fn overlapping_entries(slots: &[ScheduleSlot]) -> Vec<(TimeRange, TimeRange)> {
    self_overlaps(slots)
        .into_iter()
        .map(|(i, j)| (slots[i].window, slots[j].window))
        .collect()
}

fn distinct_dates(slots: &[ScheduleSlot]) -> Vec<NaiveDate> {
    slots
        .iter()
        .map(|s| s.date)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub struct ScheduleService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ScheduleService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Create one slot, or a weekly series when recurring
    ///
    /// The first slot must not overlap anything; later weekly copies that
    /// collide are dropped.
    #[instrument(skip(self, request), fields(user_id = %user_id))]
    pub async fn create(
        &self,
        user_id: Snowflake,
        request: CreateScheduleRequest,
    ) -> ServiceResult<Vec<ScheduleResponse>> {
        let partner = AccessService::new(self.ctx).require_partner(user_id).await?;
        let slot = ScheduleSlot::new(request.date, request.start_time, request.end_time)?;

        let repo = self.ctx.schedule_repo();
        let existing = repo.find_on_dates(partner.id, &[slot.date]).await?;
        let conflicts = overlapping_schedules(&slot, &existing);
        if !conflicts.is_empty() {
            return Err(DomainError::ScheduleConflict {
                schedule_ids: conflicts,
            }
            .into());
        }

        let weeks = match (request.is_recurring, request.recurring_weeks) {
            (true, Some(weeks)) => weeks,
            _ => 1,
        };

        if weeks <= 1 {
            let schedule = Schedule::new(self.ctx.generate_id(), partner.id, &slot);
            repo.insert_all(std::slice::from_ref(&schedule)).await?;
            info!(schedule_id = %schedule.id, "Schedule created");
            return Ok(vec![ScheduleResponse::from(&schedule)]);
        }

        let series: Vec<Schedule> = slot
            .recurring(weeks)
            .iter()
            .map(|s| Schedule::new(self.ctx.generate_id(), partner.id, s))
            .collect();
        let inserted = repo.insert_skipping_conflicts(&series).await?;
        let created: Vec<Schedule> = series
            .into_iter()
            .filter(|s| inserted.contains(&s.id))
            .collect();

        info!(
            partner_id = %partner.id,
            weeks,
            created = created.len(),
            "Recurring schedules created"
        );
        Ok(map_all(&created))
    }

    /// All-or-nothing insert of many slots; every conflict is reported
    #[instrument(skip(self, request), fields(user_id = %user_id, entries = request.schedules.len()))]
    pub async fn create_batch(
        &self,
        user_id: Snowflake,
        request: BatchScheduleRequest,
    ) -> ServiceResult<BatchScheduleResponse> {
        let partner = AccessService::new(self.ctx).require_partner(user_id).await?;

        let submitted = request.schedules.len();
        let slots = parse_entries(request.schedules);
        if slots.is_empty() {
            return Err(AppError::InvalidBody("no valid schedule entries".to_string()).into());
        }
        if slots.len() < submitted {
            debug!(dropped = submitted - slots.len(), "Invalid schedule entries dropped");
        }

        let windows = overlapping_entries(&slots);
        if !windows.is_empty() {
            debug!(pairs = windows.len(), "Batch entries overlap each other");
            return Err(DomainError::OverlappingEntries { windows }.into());
        }

        let repo = self.ctx.schedule_repo();
        let existing = repo.find_on_dates(partner.id, &distinct_dates(&slots)).await?;
        let mut conflicts: Vec<Snowflake> = slots
            .iter()
            .flat_map(|slot| overlapping_schedules(slot, &existing))
            .collect();
        conflicts.sort_unstable();
        conflicts.dedup();
        if !conflicts.is_empty() {
            return Err(DomainError::ScheduleConflict {
                schedule_ids: conflicts,
            }
            .into());
        }

        let schedules: Vec<Schedule> = slots
            .iter()
            .map(|s| Schedule::new(self.ctx.generate_id(), partner.id, s))
            .collect();
        repo.insert_all(&schedules).await?;

        info!(partner_id = %partner.id, inserted = schedules.len(), "Schedule batch created");
        Ok(BatchScheduleResponse {
            inserted: schedules.len(),
            schedules: map_all(&schedules),
        })
    }

    #[instrument(skip(self, window))]
    pub async fn list_mine(
        &self,
        user_id: Snowflake,
        window: TimeWindowQuery,
    ) -> ServiceResult<Vec<ScheduleResponse>> {
        let partner = AccessService::new(self.ctx).require_partner(user_id).await?;
        let schedules = self
            .ctx
            .schedule_repo()
            .find_by_partner(partner.id, window.from, window.to)
            .await?;
        Ok(map_all(&schedules))
    }

    /// Owner-only delete; refused while a booking holds the slot
    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: Snowflake, schedule_id: Snowflake) -> ServiceResult<()> {
        let partner = AccessService::new(self.ctx).require_partner(user_id).await?;
        let repo = self.ctx.schedule_repo();
        let schedule = repo
            .find_by_id(schedule_id)
            .await?
            .ok_or(DomainError::ScheduleNotFound(schedule_id))?;

        if schedule.partner_id != partner.id {
            return Err(DomainError::Forbidden("not your schedule".to_string()).into());
        }

        repo.delete(schedule_id).await?;
        info!(schedule_id = %schedule_id, "Schedule deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_entries_drops_invalid() {
        let raw = vec![
            json!({"date": "2025-06-01", "start_time": "2025-06-01T10:00:00Z", "end_time": "2025-06-01T11:00:00Z"}),
            json!({"date": "2025-06-01", "start_time": "2025-06-01T12:00:00Z", "end_time": "2025-06-01T12:00:00Z"}),
            json!({"date": "not-a-date"}),
            json!("garbage"),
        ];
        let slots = parse_entries(raw);
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].date, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
    }

    #[test]
    fn test_overlapping_entries_lists_each_pair() {
        let raw = vec![
            json!({"date": "2025-06-01", "start_time": "2025-06-01T10:00:00Z", "end_time": "2025-06-01T12:00:00Z"}),
            json!({"date": "2025-06-01", "start_time": "2025-06-01T11:00:00Z", "end_time": "2025-06-01T13:00:00Z"}),
            json!({"date": "2025-06-01", "start_time": "2025-06-01T11:30:00Z", "end_time": "2025-06-01T11:45:00Z"}),
            json!({"date": "2025-06-01", "start_time": "2025-06-01T13:00:00Z", "end_time": "2025-06-01T14:00:00Z"}),
        ];
        let slots = parse_entries(raw);
        let windows = overlapping_entries(&slots);

        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0], (slots[0].window, slots[1].window));
        assert!(windows.iter().all(|(a, b)| a.overlaps(b)));

        let err = DomainError::OverlappingEntries { windows };
        assert_eq!(err.code(), "SCHEDULE_CONFLICT");
        assert_eq!(err.details().unwrap()["overlapping_entries"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_distinct_dates() {
        let raw = vec![
            json!({"date": "2025-06-02", "start_time": "2025-06-02T10:00:00Z", "end_time": "2025-06-02T11:00:00Z"}),
            json!({"date": "2025-06-01", "start_time": "2025-06-01T10:00:00Z", "end_time": "2025-06-01T11:00:00Z"}),
            json!({"date": "2025-06-02", "start_time": "2025-06-02T12:00:00Z", "end_time": "2025-06-02T13:00:00Z"}),
        ];
        let dates = distinct_dates(&parse_entries(raw));
        assert_eq!(dates.len(), 2);
        assert!(dates[0] < dates[1]);
    }
}
