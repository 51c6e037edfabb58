//! Booking service
//!
//! Creation, cancellation, partner responses, and the completion sweep. The
//! conflict checks and price computation happen inside the repository
//! transaction; this layer resolves the caller and fans out notifications.

use chrono::{Duration, Utc};
use peiplay_cache::PubSubChannel;
use peiplay_core::entities::{
    generate_order_number, Booking, BookingResponse, BusyStatus, CancelOutcome,
    NotificationType, Schedule, ScheduleSlot,
};
use peiplay_core::events::{BookingCreatedEvent, BookingStatusChangedEvent, DomainEvent};
use peiplay_core::traits::{BookingQuery, NewBookings};
use peiplay_core::{DomainError, Snowflake};
use tracing::{info, instrument, warn};

use crate::dto::{
    map_all, BookingDetailResponse, BookingListQuery, BookingSide, CancelBookingRequest,
    CancelBookingResponse, CompleteBookingsResponse, CreateBookingRequest, InstantBookingRequest,
    PageParams, PaginatedResponse, RespondBookingRequest,
};

use super::access::AccessService;
use super::context::ServiceContext;
use super::error::ServiceResult;
use super::notification::NotificationService;
use super::referral::ReferralService;

/// Session length in whole minutes for an hour count such as `1.5`
#[allow(clippy::cast_possible_truncation)]
fn session_minutes(duration_hours: f64) -> i64 {
    (duration_hours * 60.0).round() as i64
}

/// Keep the first occurrence of each schedule ID
fn dedup_ids(ids: &[Snowflake]) -> Vec<Snowflake> {
    let mut unique = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(id) {
            unique.push(*id);
        }
    }
    unique
}

fn booking_data(booking: &Booking) -> serde_json::Value {
    serde_json::json!({
        "booking_id": booking.id,
        "status": booking.status,
        "start_time": booking.start_time,
        "end_time": booking.end_time,
    })
}

pub struct BookingService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> BookingService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Book one or more published schedules
    #[instrument(skip(self, request), fields(user_id = %user_id, schedules = request.schedule_ids.len()))]
    pub async fn create(
        &self,
        user_id: Snowflake,
        request: CreateBookingRequest,
    ) -> ServiceResult<Vec<BookingDetailResponse>> {
        let access = AccessService::new(self.ctx);
        access.require_active_user(user_id).await?;
        let customer = access.require_customer(user_id).await?;

        let schedule_ids = dedup_ids(&request.schedule_ids);
        if schedule_ids.is_empty() {
            return Err(DomainError::ValidationError("schedule_ids is required".to_string()).into());
        }

        let bookings = self
            .insert(customer.id, schedule_ids, request.promo_code, None)
            .await?;
        Ok(map_all(&bookings))
    }

    /// Book a partner who is available right now, starting shortly
    #[instrument(skip(self, request), fields(user_id = %user_id, partner_id = %request.partner_id))]
    pub async fn instant(
        &self,
        user_id: Snowflake,
        request: InstantBookingRequest,
    ) -> ServiceResult<BookingDetailResponse> {
        let access = AccessService::new(self.ctx);
        access.require_active_user(user_id).await?;
        let customer = access.require_customer(user_id).await?;
        let partner = access.find_partner(request.partner_id).await?;

        if !partner.is_approved() {
            return Err(DomainError::PartnerNotApproved.into());
        }
        let now = Utc::now();
        let window = Duration::minutes(self.ctx.platform().availability_window_minutes);
        if !partner.is_available_now || partner.availability_lapsed(now, window) {
            return Err(DomainError::ValidationError(
                "partner is not available for instant booking".to_string(),
            )
            .into());
        }

        let current = self
            .ctx
            .booking_repo()
            .find_current_for_partner(partner.id, now)
            .await?;
        let busy = BusyStatus::from_current(current.as_ref(), now);
        if busy.is_busy {
            return Err(DomainError::PartnerBusy {
                until: busy.end_time,
            }
            .into());
        }

        let lead = Duration::minutes(self.ctx.platform().instant_lead_minutes);
        let slot = ScheduleSlot::starting_in(
            now,
            lead,
            Duration::minutes(session_minutes(request.duration_hours)),
        )?;
        let schedule = Schedule::new(self.ctx.generate_id(), partner.id, &slot);

        let mut bookings = self
            .insert(customer.id, vec![schedule.id], request.promo_code, Some(schedule))
            .await?;
        let booking = bookings
            .pop()
            .ok_or_else(|| DomainError::InternalError("instant booking not created".to_string()))?;
        Ok(BookingDetailResponse::from(&booking))
    }

    async fn insert(
        &self,
        customer_id: Snowflake,
        schedule_ids: Vec<Snowflake>,
        promo_code: Option<String>,
        instant_schedule: Option<Schedule>,
    ) -> ServiceResult<Vec<Booking>> {
        let now = Utc::now();
        let request = NewBookings {
            customer_id,
            booking_ids: schedule_ids.iter().map(|_| self.ctx.generate_id()).collect(),
            order_numbers: schedule_ids.iter().map(|_| generate_order_number(now)).collect(),
            schedule_ids,
            promo_code: promo_code.filter(|c| !c.trim().is_empty()),
            instant_schedule,
            now,
        };
        let bookings = self.ctx.booking_repo().create(&request).await?;

        let notifications = NotificationService::new(self.ctx);
        for booking in &bookings {
            info!(
                booking_id = %booking.id,
                partner_id = %booking.partner_id,
                amount = %booking.final_amount,
                instant = booking.is_instant,
                "Booking created"
            );

            let content = if booking.is_instant {
                format!(
                    "New instant booking starting at {}",
                    booking.start_time.format("%Y-%m-%d %H:%M UTC")
                )
            } else {
                format!(
                    "New booking for {}",
                    booking.start_time.format("%Y-%m-%d %H:%M UTC")
                )
            };
            notifications
                .notify(
                    booking.partner_user_id,
                    NotificationType::BookingCreated,
                    "New booking",
                    content,
                    Some(booking_data(booking)),
                )
                .await;

            let event = DomainEvent::BookingCreated(BookingCreatedEvent {
                booking_id: booking.id,
                partner_id: booking.partner_id,
                customer_id: booking.customer_id,
                timestamp: now,
            });
            if let Err(e) = self
                .ctx
                .publisher()
                .publish_domain_event(&[PubSubChannel::user(booking.partner_user_id)], &event)
                .await
            {
                warn!(booking_id = %booking.id, error = %e, "Failed to publish booking event");
            }
        }

        Ok(bookings)
    }

    /// Customer cancellation; repeating it on a cancelled booking is a no-op
    #[instrument(skip(self, request))]
    pub async fn cancel(
        &self,
        user_id: Snowflake,
        booking_id: Snowflake,
        request: CancelBookingRequest,
    ) -> ServiceResult<CancelBookingResponse> {
        let booking = self.load(booking_id).await?;
        if !booking.is_customer(user_id) {
            return Err(DomainError::Forbidden("only the customer can cancel".to_string()).into());
        }

        let reason = request.reason.as_deref().map(str::trim).filter(|r| !r.is_empty());
        let (booking, outcome) = self
            .ctx
            .booking_repo()
            .cancel(booking_id, self.ctx.generate_id(), reason)
            .await?;

        if outcome == CancelOutcome::AlreadyCancelled {
            info!(booking_id = %booking_id, "Booking already cancelled");
            return Ok(CancelBookingResponse {
                booking: BookingDetailResponse::from(&booking),
                already_cancelled: true,
            });
        }

        info!(booking_id = %booking_id, "Booking cancelled");

        let content = match reason {
            Some(reason) => format!("The customer cancelled a booking: {reason}"),
            None => "The customer cancelled a booking".to_string(),
        };
        NotificationService::new(self.ctx)
            .notify(
                booking.partner_user_id,
                NotificationType::BookingCancelled,
                "Booking cancelled",
                content,
                Some(booking_data(&booking)),
            )
            .await;
        self.publish_status(&booking).await;

        Ok(CancelBookingResponse {
            booking: BookingDetailResponse::from(&booking),
            already_cancelled: false,
        })
    }

    /// Partner accepts or rejects a request
    #[instrument(skip(self, request), fields(response = ?request.response))]
    pub async fn respond(
        &self,
        user_id: Snowflake,
        booking_id: Snowflake,
        request: RespondBookingRequest,
    ) -> ServiceResult<BookingDetailResponse> {
        let mut booking = self.load(booking_id).await?;
        if !booking.is_partner(user_id) {
            return Err(DomainError::Forbidden("only the partner can respond".to_string()).into());
        }

        let expected = booking.status;
        booking.respond(request.response, request.reason.as_deref())?;
        self.ctx.booking_repo().save_status(&booking, expected).await?;

        info!(booking_id = %booking_id, status = %booking.status, "Partner responded to booking");

        let (kind, title, content) = match request.response {
            BookingResponse::Accept => (
                NotificationType::PartnerConfirmation,
                "Booking accepted",
                "Your partner accepted the booking".to_string(),
            ),
            BookingResponse::Reject => (
                NotificationType::PartnerRejection,
                "Booking rejected",
                format!(
                    "Your partner rejected the booking: {}",
                    booking.reject_reason.as_deref().unwrap_or_default()
                ),
            ),
        };
        NotificationService::new(self.ctx)
            .notify(booking.customer_user_id, kind, title, content, Some(booking_data(&booking)))
            .await;
        self.publish_status(&booking).await;

        Ok(BookingDetailResponse::from(&booking))
    }

    /// Direct confirmation by the partner or an admin
    #[instrument(skip(self))]
    pub async fn accept(
        &self,
        user_id: Snowflake,
        booking_id: Snowflake,
    ) -> ServiceResult<BookingDetailResponse> {
        let mut booking = self.load(booking_id).await?;
        if !booking.is_partner(user_id) && !AccessService::new(self.ctx).is_admin(user_id).await? {
            return Err(DomainError::Forbidden("only the partner can confirm".to_string()).into());
        }

        let expected = booking.status;
        booking.confirm()?;
        self.ctx.booking_repo().save_status(&booking, expected).await?;

        info!(booking_id = %booking_id, "Booking confirmed");

        NotificationService::new(self.ctx)
            .notify(
                booking.customer_user_id,
                NotificationType::PartnerConfirmation,
                "Booking confirmed",
                "Your booking has been confirmed",
                Some(booking_data(&booking)),
            )
            .await;
        self.publish_status(&booking).await;

        Ok(BookingDetailResponse::from(&booking))
    }

    /// Visible to either party and to admins
    #[instrument(skip(self))]
    pub async fn get(
        &self,
        user_id: Snowflake,
        booking_id: Snowflake,
    ) -> ServiceResult<BookingDetailResponse> {
        let booking = self.load(booking_id).await?;
        if !booking.is_participant(user_id) && !AccessService::new(self.ctx).is_admin(user_id).await? {
            return Err(DomainError::Forbidden("not a party to this booking".to_string()).into());
        }
        Ok(BookingDetailResponse::from(&booking))
    }

    #[instrument(skip(self, query))]
    pub async fn list_mine(
        &self,
        user_id: Snowflake,
        query: BookingListQuery,
        page: PageParams,
    ) -> ServiceResult<PaginatedResponse<BookingDetailResponse>> {
        let access = AccessService::new(self.ctx);
        let mut filter = BookingQuery {
            status: query.status,
            limit: page.limit,
            offset: page.offset(),
            ..BookingQuery::default()
        };
        match query.side {
            BookingSide::Customer => {
                filter.customer_id = Some(access.require_customer(user_id).await?.id);
            }
            BookingSide::Partner => {
                filter.partner_id = Some(access.require_partner(user_id).await?.id);
            }
        }

        let repo = self.ctx.booking_repo();
        let bookings = repo.list(&filter).await?;
        let total = repo.count(&filter).await?;
        Ok(PaginatedResponse::new(map_all(&bookings), page, total))
    }

    /// Complete every confirmed or accepted booking whose slot has ended
    #[instrument(skip(self))]
    pub async fn complete_due(&self) -> ServiceResult<CompleteBookingsResponse> {
        let completed = self.ctx.booking_repo().complete_due(Utc::now()).await?;

        let referrals = ReferralService::new(self.ctx);
        let notifications = NotificationService::new(self.ctx);
        let mut referral_calculated = 0;
        for booking in &completed {
            match referrals.calculate_for_booking(booking.id).await {
                Ok(outcome) if outcome.is_calculated() => referral_calculated += 1,
                Ok(_) => {}
                Err(e) => {
                    warn!(booking_id = %booking.id, error = %e, "Referral calculation failed");
                }
            }

            notifications
                .notify_all(
                    &[booking.customer_user_id, booking.partner_user_id],
                    NotificationType::BookingCompleted,
                    "Booking completed",
                    "Your session has ended. Leave a review!",
                    Some(booking_data(booking)),
                )
                .await;
            self.publish_status(booking).await;
        }

        info!(
            completed = completed.len(),
            referral_calculated, "Due bookings completed"
        );
        Ok(CompleteBookingsResponse {
            completed: completed.len(),
            referral_calculated,
        })
    }

    async fn load(&self, booking_id: Snowflake) -> ServiceResult<Booking> {
        let booking = self
            .ctx
            .booking_repo()
            .find_by_id(booking_id)
            .await?
            .ok_or(DomainError::BookingNotFound(booking_id))?;
        Ok(booking)
    }

    async fn publish_status(&self, booking: &Booking) {
        let event = DomainEvent::BookingStatusChanged(BookingStatusChangedEvent {
            booking_id: booking.id,
            status: booking.status,
            timestamp: booking.updated_at,
        });
        let channels = [
            PubSubChannel::user(booking.customer_user_id),
            PubSubChannel::user(booking.partner_user_id),
        ];
        if let Err(e) = self.ctx.publisher().publish_domain_event(&channels, &event).await {
            warn!(booking_id = %booking.id, error = %e, "Failed to publish status change");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_minutes() {
        assert_eq!(session_minutes(0.5), 30);
        assert_eq!(session_minutes(1.5), 90);
        assert_eq!(session_minutes(8.0), 480);
    }

    #[test]
    fn test_dedup_ids_keeps_order() {
        let ids = [Snowflake::new(3), Snowflake::new(1), Snowflake::new(3)];
        assert_eq!(dedup_ids(&ids), vec![Snowflake::new(3), Snowflake::new(1)]);
    }
}
