//! Entity to DTO mappers
//!
//! Implements `From` conversions from domain entities to response DTOs.

use peiplay_core::entities::{
    Announcement, Booking, ChatMessage, ChatRoom, ChatRoomSummary, CoinTransaction, GiftItem,
    GiftRecord, Notification, Partner, PartnerEarnings, PromoCode, RechargeRecord,
    ReferralInvitee, Review, Schedule, User, WithdrawalRequest,
};

use super::responses::{
    AnnouncementResponse, BookingDetailResponse, ChatMessageResponse, ChatRoomResponse,
    CoinTransactionResponse, GiftItemResponse, GiftRecordResponse, InviteeResponse,
    NotificationResponse, OwnPartnerResponse, PartnerEarningsResponse, PartnerResponse,
    PromoCodeResponse, RechargeResponse, ReviewResponse, ScheduleResponse, UserResponse,
    WithdrawalResponse,
};

// ============================================================================
// User & Partner Mappers
// ============================================================================

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            email_verified: user.email_verified,
            is_suspended: user.is_suspended,
            suspension_reason: user.suspension_reason.clone(),
            suspension_ends_at: user.suspension_ends_at,
            created_at: user.created_at,
        }
    }
}

impl From<&Partner> for PartnerResponse {
    fn from(partner: &Partner) -> Self {
        Self {
            id: partner.id,
            user_id: partner.user_id,
            name: partner.name.clone(),
            games: partner.games.clone(),
            half_hourly_rate: partner.half_hourly_rate,
            status: partner.status,
            customer_message: partner.customer_message.clone(),
            is_available_now: partner.is_available_now,
            available_now_since: partner.available_now_since,
            created_at: partner.created_at,
        }
    }
}

impl From<&Partner> for OwnPartnerResponse {
    fn from(partner: &Partner) -> Self {
        Self {
            partner: PartnerResponse::from(partner),
            invite_code: partner.invite_code.clone(),
            invited_by: partner.invited_by,
            referral_count: partner.referral_count,
            referral_earnings: partner.referral_earnings,
        }
    }
}

// ============================================================================
// Schedule & Booking Mappers
// ============================================================================

impl From<&Schedule> for ScheduleResponse {
    fn from(schedule: &Schedule) -> Self {
        Self {
            id: schedule.id,
            partner_id: schedule.partner_id,
            date: schedule.date,
            start_time: schedule.start_time,
            end_time: schedule.end_time,
            is_available: schedule.is_available,
        }
    }
}

impl From<&Booking> for BookingDetailResponse {
    fn from(booking: &Booking) -> Self {
        Self {
            id: booking.id,
            customer_id: booking.customer_id,
            partner_id: booking.partner_id,
            schedule_id: booking.schedule_id,
            start_time: booking.start_time,
            end_time: booking.end_time,
            status: booking.status,
            original_amount: booking.original_amount,
            discount_amount: booking.discount_amount(),
            final_amount: booking.final_amount,
            order_number: booking.order_number.clone(),
            is_instant: booking.is_instant,
            reject_reason: booking.reject_reason.clone(),
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        }
    }
}

// ============================================================================
// Economy Mappers
// ============================================================================

impl From<&CoinTransaction> for CoinTransactionResponse {
    fn from(tx: &CoinTransaction) -> Self {
        Self {
            id: tx.id,
            transaction_type: tx.transaction_type,
            amount: tx.amount,
            description: tx.description.clone(),
            order_id: tx.order_id.clone(),
            balance_before: tx.balance_before,
            balance_after: tx.balance_after,
            created_at: tx.created_at,
        }
    }
}

impl From<&RechargeRecord> for RechargeResponse {
    fn from(record: &RechargeRecord) -> Self {
        Self {
            order_number: record.order_number.clone(),
            coin_amount: record.coin_amount,
            payment_amount: record.payment_amount,
            status: record.status,
            created_at: record.created_at,
        }
    }
}

impl From<&PromoCode> for PromoCodeResponse {
    fn from(promo: &PromoCode) -> Self {
        Self {
            id: promo.id,
            code: promo.code.clone(),
            discount_type: promo.discount_type,
            value: promo.value,
            max_uses: promo.max_uses,
            used_count: promo.used_count,
            valid_from: promo.valid_from,
            valid_until: promo.valid_until,
            is_active: promo.is_active,
            partner_id: promo.partner_id,
            description: promo.description.clone(),
        }
    }
}

impl From<&GiftItem> for GiftItemResponse {
    fn from(gift: &GiftItem) -> Self {
        Self {
            id: gift.id,
            name: gift.name.clone(),
            emoji: gift.emoji.clone(),
            coin_cost: gift.coin_cost,
        }
    }
}

impl From<&GiftRecord> for GiftRecordResponse {
    fn from(record: &GiftRecord) -> Self {
        Self {
            id: record.id,
            sender_id: record.sender_id,
            partner_id: record.partner_id,
            gift_id: record.gift_id,
            gift_name: record.gift_name.clone(),
            gift_emoji: record.gift_emoji.clone(),
            coin_cost: record.coin_cost,
            partner_coins: record.partner_coins,
            chat_room_id: record.chat_room_id,
            created_at: record.created_at,
        }
    }
}

impl From<&PartnerEarnings> for PartnerEarningsResponse {
    fn from(earnings: &PartnerEarnings) -> Self {
        Self {
            total_earned_coins: earnings.total_earned_coins,
            pending_earnings_coins: earnings.pending_earnings_coins,
        }
    }
}

impl From<&WithdrawalRequest> for WithdrawalResponse {
    fn from(request: &WithdrawalRequest) -> Self {
        Self {
            id: request.id,
            partner_id: request.partner_id,
            amount: request.amount,
            status: request.status,
            admin_note: request.admin_note.clone(),
            requested_at: request.requested_at,
            processed_at: request.processed_at,
        }
    }
}

impl From<&ReferralInvitee> for InviteeResponse {
    fn from(invitee: &ReferralInvitee) -> Self {
        Self {
            partner_id: invitee.partner_id,
            name: invitee.name.clone(),
            joined_at: invitee.joined_at,
            earned: invitee.earned,
        }
    }
}

// ============================================================================
// Engagement Mappers
// ============================================================================

impl From<&Review> for ReviewResponse {
    fn from(review: &Review) -> Self {
        Self {
            id: review.id,
            booking_id: review.booking_id,
            reviewer_id: review.reviewer_id,
            reviewee_id: review.reviewee_id,
            rating: review.rating,
            comment: review.comment.clone(),
            is_approved: review.is_approved,
            created_at: review.created_at,
        }
    }
}

impl From<&ChatRoom> for ChatRoomResponse {
    fn from(room: &ChatRoom) -> Self {
        Self {
            id: room.id,
            room_type: room.room_type,
            booking_id: room.booking_id,
            last_message_at: room.last_message_at,
            unread_count: None,
            created_at: room.created_at,
        }
    }
}

impl From<&ChatRoomSummary> for ChatRoomResponse {
    fn from(summary: &ChatRoomSummary) -> Self {
        Self {
            unread_count: Some(summary.unread_count),
            ..Self::from(&summary.room)
        }
    }
}

impl From<&ChatMessage> for ChatMessageResponse {
    fn from(message: &ChatMessage) -> Self {
        Self {
            id: message.id,
            room_id: message.room_id,
            sender_id: message.sender_id,
            sender_name: message.sender_name.clone(),
            content: message.content.clone(),
            message_type: message.message_type,
            status: message.status,
            moderation_status: message.moderation_status,
            created_at: message.created_at,
        }
    }
}

impl From<&Notification> for NotificationResponse {
    fn from(notification: &Notification) -> Self {
        Self {
            id: notification.id,
            notification_type: notification.notification_type,
            title: notification.title.clone(),
            content: notification.content.clone(),
            data: notification.data.clone(),
            is_read: notification.is_read,
            created_at: notification.created_at,
        }
    }
}

impl From<&Announcement> for AnnouncementResponse {
    fn from(announcement: &Announcement) -> Self {
        Self {
            id: announcement.id,
            title: announcement.title.clone(),
            content: announcement.content.clone(),
            is_active: announcement.is_active,
            expires_at: announcement.expires_at,
            created_at: announcement.created_at,
            updated_at: announcement.updated_at,
        }
    }
}

/// Map a slice of entities into their response DTOs
pub fn map_all<'a, E, R>(items: &'a [E]) -> Vec<R>
where
    R: From<&'a E>,
{
    items.iter().map(R::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use peiplay_core::entities::BookingStatus;
    use peiplay_core::Snowflake;
    use rust_decimal::Decimal;

    #[test]
    fn test_booking_response_reports_discount() {
        let now = Utc::now();
        let booking = Booking {
            id: Snowflake::new(1),
            customer_id: Snowflake::new(2),
            customer_user_id: Snowflake::new(3),
            schedule_id: Snowflake::new(4),
            partner_id: Snowflake::new(5),
            partner_user_id: Snowflake::new(6),
            start_time: now,
            end_time: now + chrono::Duration::hours(1),
            status: BookingStatus::PendingPayment,
            original_amount: Decimal::new(40000, 2),
            final_amount: Decimal::new(36000, 2),
            promo_code_id: None,
            order_number: Some("PEI202501010000001234".to_string()),
            is_instant: false,
            reject_reason: None,
            created_at: now,
            updated_at: now,
        };
        let resp = BookingDetailResponse::from(&booking);
        assert_eq!(resp.discount_amount, Decimal::new(4000, 2));
        assert_eq!(resp.status, BookingStatus::PendingPayment);
    }

    #[test]
    fn test_room_summary_carries_unread_count() {
        let summary = ChatRoomSummary {
            room: ChatRoom::for_booking(Snowflake::new(1), Snowflake::new(2)),
            unread_count: 3,
        };
        let resp = ChatRoomResponse::from(&summary);
        assert_eq!(resp.unread_count, Some(3));
        assert_eq!(resp.booking_id, Some(Snowflake::new(2)));
    }
}
