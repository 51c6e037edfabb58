//! Response DTOs for API endpoints
//!
//! All response DTOs implement `Serialize` for JSON output.
//! Snowflake IDs are serialized as strings for JavaScript compatibility.

use chrono::{DateTime, NaiveDate, Utc};
use peiplay_core::entities::{
    BookingStatus, ChatRoomType, CoinTransactionType, DiscountType, MessageStatus, MessageType,
    ModerationStatus, NotificationType, PartnerStatus, RechargeStatus, UserRole,
    WithdrawalStatus,
};
use peiplay_core::Snowflake;
use rust_decimal::Decimal;
use serde::Serialize;

use super::requests::PageParams;

// ============================================================================
// Common Response Types
// ============================================================================

/// Page-number pagination metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl PageMeta {
    pub fn new(params: PageParams, total: i64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + params.limit - 1) / params.limit
        };
        Self {
            page: params.page,
            limit: params.limit,
            total,
            total_pages,
        }
    }
}

/// List response with page metadata
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PageMeta,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, params: PageParams, total: i64) -> Self {
        Self {
            data,
            pagination: PageMeta::new(params, total),
        }
    }
}

// ============================================================================
// Auth & User Responses
// ============================================================================

/// Authentication response with tokens
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: CurrentUserResponse,
}

/// The caller, with the profiles attached to the account
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUserResponse {
    pub id: Snowflake,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub email_verified: bool,
    pub customer_id: Option<Snowflake>,
    pub partner_id: Option<Snowflake>,
    pub partner_status: Option<PartnerStatus>,
    pub created_at: DateTime<Utc>,
}

/// Admin view of an account
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: Snowflake,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub email_verified: bool,
    pub is_suspended: bool,
    pub suspension_reason: Option<String>,
    pub suspension_ends_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Partner Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct PartnerResponse {
    pub id: Snowflake,
    pub user_id: Snowflake,
    pub name: String,
    pub games: Vec<String>,
    pub half_hourly_rate: Decimal,
    pub status: PartnerStatus,
    pub customer_message: Option<String>,
    pub is_available_now: bool,
    pub available_now_since: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// The owner's view, including referral bookkeeping
#[derive(Debug, Clone, Serialize)]
pub struct OwnPartnerResponse {
    #[serde(flatten)]
    pub partner: PartnerResponse,
    pub invite_code: Option<String>,
    pub invited_by: Option<Snowflake>,
    pub referral_count: i32,
    pub referral_earnings: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct PartnerDetailResponse {
    #[serde(flatten)]
    pub partner: PartnerResponse,
    pub average_rating: Option<Decimal>,
    pub review_count: i64,
}

// ============================================================================
// Schedule Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleResponse {
    pub id: Snowflake,
    pub partner_id: Snowflake,
    pub date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_available: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchScheduleResponse {
    pub inserted: usize,
    pub schedules: Vec<ScheduleResponse>,
}

// ============================================================================
// Booking Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct BookingDetailResponse {
    pub id: Snowflake,
    pub customer_id: Snowflake,
    pub partner_id: Snowflake,
    pub schedule_id: Snowflake,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: BookingStatus,
    pub original_amount: Decimal,
    pub discount_amount: Decimal,
    pub final_amount: Decimal,
    pub order_number: Option<String>,
    pub is_instant: bool,
    pub reject_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelBookingResponse {
    pub booking: BookingDetailResponse,
    pub already_cancelled: bool,
}

// ============================================================================
// Payment Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct OrderResponse {
    pub order_number: String,
    pub amount: Decimal,
    pub booking_id: Snowflake,
}

// ============================================================================
// Coin Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct CoinTransactionResponse {
    pub id: Snowflake,
    pub transaction_type: CoinTransactionType,
    pub amount: i64,
    pub description: Option<String>,
    pub order_id: Option<String>,
    pub balance_before: i64,
    pub balance_after: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoinBalanceResponse {
    pub coin_balance: i64,
    pub total_recharged: i64,
    pub total_spent: i64,
    pub recent_transactions: Vec<CoinTransactionResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RechargeResponse {
    pub order_number: String,
    pub coin_amount: i64,
    pub payment_amount: Decimal,
    pub status: RechargeStatus,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Promo Code Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct PromoCodeResponse {
    pub id: Snowflake,
    pub code: String,
    pub discount_type: DiscountType,
    pub value: Decimal,
    pub max_uses: i32,
    pub used_count: i32,
    pub valid_from: DateTime<Utc>,
    pub valid_until: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub partner_id: Option<Snowflake>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromoValidationResponse {
    pub code: String,
    pub discount_type: DiscountType,
    pub original_amount: Decimal,
    pub discount_amount: Decimal,
    pub final_amount: Decimal,
}

// ============================================================================
// Gift Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct GiftItemResponse {
    pub id: Snowflake,
    pub name: String,
    pub emoji: String,
    pub coin_cost: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GiftRecordResponse {
    pub id: Snowflake,
    pub sender_id: Snowflake,
    pub partner_id: Snowflake,
    pub gift_id: Snowflake,
    pub gift_name: String,
    pub gift_emoji: String,
    pub coin_cost: i64,
    pub partner_coins: i64,
    pub chat_room_id: Option<Snowflake>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendGiftResponse {
    pub gift: GiftRecordResponse,
    pub balance_after: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PartnerEarningsResponse {
    pub total_earned_coins: i64,
    pub pending_earnings_coins: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReceivedGiftsResponse {
    pub gifts: Vec<GiftRecordResponse>,
    pub earnings: PartnerEarningsResponse,
}

// ============================================================================
// Withdrawal Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct WithdrawalResponse {
    pub id: Snowflake,
    pub partner_id: Snowflake,
    pub amount: Decimal,
    pub status: WithdrawalStatus,
    pub admin_note: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WithdrawalCreatedResponse {
    pub withdrawal: WithdrawalResponse,
    pub available_balance: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct WithdrawalHistoryResponse {
    pub withdrawals: Vec<WithdrawalResponse>,
    pub total_earnings: Decimal,
    pub total_withdrawn: Decimal,
    pub available_balance: Decimal,
}

// ============================================================================
// Referral Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ReferralCodeResponse {
    pub invite_code: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReferralValidationResponse {
    pub valid: bool,
    pub inviter_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InviteeResponse {
    pub partner_id: Snowflake,
    pub name: String,
    pub joined_at: DateTime<Utc>,
    pub earned: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReferralStatsResponse {
    pub invite_code: Option<String>,
    pub referral_count: i32,
    pub referral_earnings: Decimal,
    pub invitees: Vec<InviteeResponse>,
}

// ============================================================================
// Review Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ReviewResponse {
    pub id: Snowflake,
    pub booking_id: Snowflake,
    pub reviewer_id: Snowflake,
    pub reviewee_id: Snowflake,
    pub rating: i16,
    pub comment: Option<String>,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RatingResponse {
    pub average_rating: Option<Decimal>,
    pub review_count: i64,
}

// ============================================================================
// Chat Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ChatRoomResponse {
    pub id: Snowflake,
    pub room_type: ChatRoomType,
    pub booking_id: Option<Snowflake>,
    pub last_message_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unread_count: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FreeChatRoomResponse {
    #[serde(flatten)]
    pub room: ChatRoomResponse,
    /// False when an existing room was returned
    pub created: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessageResponse {
    pub id: Snowflake,
    pub room_id: Snowflake,
    pub sender_id: Snowflake,
    pub sender_name: String,
    pub content: String,
    pub message_type: MessageType,
    pub status: MessageStatus,
    pub moderation_status: ModerationStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct UnreadCountResponse {
    pub unread_count: i64,
}

// ============================================================================
// Notification Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct NotificationResponse {
    pub id: Snowflake,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub content: String,
    pub data: Option<serde_json::Value>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct NotificationListResponse {
    pub notifications: Vec<NotificationResponse>,
    pub pagination: PageMeta,
    pub unread_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnnouncementResponse {
    pub id: Snowflake,
    pub title: String,
    pub content: String,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Cron Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct AutoCloseResponse {
    pub closed_count: usize,
    pub partners: Vec<PartnerResponse>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CompleteBookingsResponse {
    pub completed: usize,
    pub referral_calculated: usize,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReferralSweepResponse {
    pub processed: usize,
    pub calculated: usize,
}

// ============================================================================
// Health Responses
// ============================================================================

/// Liveness response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Per-dependency readiness
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub database: &'static str,
    pub redis: &'static str,
    pub circuit_breaker: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub checks: HealthChecks,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_meta_rounds_up() {
        let meta = PageMeta::new(PageParams::new(Some(1), Some(20)), 41);
        assert_eq!(meta.total_pages, 3);

        let meta = PageMeta::new(PageParams::new(Some(1), Some(20)), 0);
        assert_eq!(meta.total_pages, 0);
    }

    #[test]
    fn test_ids_serialize_as_strings() {
        let resp = ReferralValidationResponse {
            valid: true,
            inviter_name: Some("Mika".to_string()),
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["valid"], true);

        let room = ChatRoomResponse {
            id: Snowflake::new(42),
            room_type: ChatRoomType::OneOnOne,
            booking_id: None,
            last_message_at: None,
            unread_count: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&room).unwrap();
        assert_eq!(json["id"], "42");
        assert_eq!(json["room_type"], "ONE_ON_ONE");
        assert!(json.get("unread_count").is_none());
    }
}
