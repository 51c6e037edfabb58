//! Request DTOs for API endpoints
//!
//! All request DTOs implement `Deserialize`; bodies also implement `Validate`.

use chrono::{DateTime, NaiveDate, Utc};
use peiplay_core::entities::{
    BookingResponse, BookingStatus, DiscountType, PartnerStatus, UserRole, WithdrawalStatus,
};
use peiplay_core::Snowflake;
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

// ============================================================================
// Pagination
// ============================================================================

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 50;

/// 1-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: i64,
    pub limit: i64,
}

impl PageParams {
    /// Clamp raw query values into a usable page
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self::new(None, None)
    }
}

// ============================================================================
// Auth Requests
// ============================================================================

/// User registration request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: String,

    #[validate(length(min = 8, max = 72, message = "Password must be 8-72 characters"))]
    pub password: String,
}

/// User login request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Token refresh request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Logout request (optional refresh token to revoke)
#[derive(Debug, Clone, Deserialize, Default, Validate)]
pub struct LogoutRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    #[validate(length(min = 8, max = 72, message = "Password must be 8-72 characters"))]
    pub new_password: String,
}

// ============================================================================
// Partner Requests
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ApplyPartnerRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 20, message = "List between 1 and 20 games"))]
    pub games: Vec<String>,

    pub half_hourly_rate: Decimal,

    #[validate(length(max = 500, message = "Message must be at most 500 characters"))]
    pub customer_message: Option<String>,

    /// Referral code of an inviting partner
    pub invite_code: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdatePartnerRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 20, message = "List between 1 and 20 games"))]
    pub games: Option<Vec<String>>,

    pub half_hourly_rate: Option<Decimal>,

    #[validate(length(max = 500, message = "Message must be at most 500 characters"))]
    pub customer_message: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SetAvailabilityRequest {
    pub is_available_now: bool,
}

/// Public partner search filters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartnerListQuery {
    pub game: Option<String>,
    pub available_now: Option<bool>,
}

/// Admin partner listing filters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminPartnerQuery {
    pub status: Option<PartnerStatus>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReviewPartnerRequest {
    pub status: PartnerStatus,

    #[validate(length(max = 500, message = "Reason must be at most 500 characters"))]
    pub reason: Option<String>,
}

// ============================================================================
// Schedule Requests
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateScheduleRequest {
    pub date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,

    #[serde(default)]
    pub is_recurring: bool,

    #[validate(range(min = 1, max = 12, message = "Recurring weeks must be 1-12"))]
    pub recurring_weeks: Option<u32>,
}

/// One entry of a batch; entries that fail to parse are dropped
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleEntry {
    pub date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BatchScheduleRequest {
    /// Raw entries, parsed one by one
    #[validate(length(max = 200, message = "At most 200 schedules per batch"))]
    pub schedules: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct TimeWindowQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

// ============================================================================
// Booking Requests
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBookingRequest {
    #[validate(length(min = 1, max = 20, message = "Book between 1 and 20 schedules"))]
    pub schedule_ids: Vec<Snowflake>,

    pub promo_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct InstantBookingRequest {
    pub partner_id: Snowflake,

    #[validate(range(min = 0.5, max = 8.0, message = "Duration must be 0.5-8 hours"))]
    pub duration_hours: f64,

    pub promo_code: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CancelBookingRequest {
    #[validate(length(max = 500, message = "Reason must be at most 500 characters"))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RespondBookingRequest {
    pub response: BookingResponse,

    #[validate(length(max = 500, message = "Reason must be at most 500 characters"))]
    pub reason: Option<String>,
}

/// Which side of the booking the caller is listing as
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingSide {
    #[default]
    Customer,
    Partner,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct BookingListQuery {
    #[serde(default, rename = "as")]
    pub side: BookingSide,
    pub status: Option<BookingStatus>,
}

// ============================================================================
// Payment Requests
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub booking_id: Snowflake,
}

/// Gateway callback form; accepts the gateway's field names
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentCallbackRequest {
    #[serde(alias = "MerchantTradeNo")]
    pub merchant_trade_no: String,
    #[serde(alias = "RtnCode")]
    pub rtn_code: String,
    #[serde(alias = "TradeNo")]
    pub trade_no: String,
    #[serde(alias = "TradeAmt")]
    pub trade_amt: i64,
}

// ============================================================================
// Coin Requests
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RechargeRequest {
    #[validate(range(min = 1, max = 100_000, message = "Recharge 1-100000 coins"))]
    pub coin_amount: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AdminAddCoinsRequest {
    pub user_id: Snowflake,

    #[validate(range(min = 1, message = "Amount must be positive"))]
    pub amount: i64,

    #[validate(length(max = 200, message = "Description must be at most 200 characters"))]
    pub description: Option<String>,
}

// ============================================================================
// Promo Code Requests
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ValidatePromoRequest {
    #[validate(length(min = 1, max = 32, message = "Code must be 1-32 characters"))]
    pub code: String,
    pub amount: Decimal,
    pub partner_id: Option<Snowflake>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePromoRequest {
    #[validate(length(min = 3, max = 32, message = "Code must be 3-32 characters"))]
    pub code: String,
    pub discount_type: DiscountType,
    pub value: Decimal,
    pub max_uses: Option<i32>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub partner_id: Option<Snowflake>,

    #[validate(length(max = 200, message = "Description must be at most 200 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdatePromoRequest {
    pub discount_type: Option<DiscountType>,
    pub value: Option<Decimal>,
    pub max_uses: Option<i32>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,

    #[validate(length(max = 200, message = "Description must be at most 200 characters"))]
    pub description: Option<String>,
}

// ============================================================================
// Gift Requests
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SendGiftRequest {
    pub partner_id: Snowflake,
    pub gift_id: Snowflake,
    pub chat_room_id: Option<Snowflake>,
}

// ============================================================================
// Withdrawal Requests
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateWithdrawalRequest {
    pub amount: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProcessWithdrawalRequest {
    pub status: WithdrawalStatus,

    #[validate(length(max = 500, message = "Note must be at most 500 characters"))]
    pub admin_note: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct WithdrawalListQuery {
    pub status: Option<WithdrawalStatus>,
}

// ============================================================================
// Referral Requests
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReferralCodeRequest {
    #[validate(length(min = 1, max = 32, message = "Code must be 1-32 characters"))]
    pub code: String,
}

// ============================================================================
// Review Requests
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateReviewRequest {
    pub booking_id: Snowflake,

    #[validate(range(min = 1, max = 5, message = "Rating must be 1-5"))]
    pub rating: i16,

    #[validate(length(max = 1000, message = "Comment must be at most 1000 characters"))]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ReviewListQuery {
    pub reviewee_id: Option<Snowflake>,
    pub booking_id: Option<Snowflake>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationAction {
    Approve,
    Reject,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ModerateReviewRequest {
    pub action: ModerationAction,
}

// ============================================================================
// Chat Requests
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EnsureRoomRequest {
    pub booking_id: Snowflake,
}

/// Open a free chat with a partner outside any booking
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct FreeChatRequest {
    pub partner_id: Snowflake,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(min = 1, max = 2000, message = "Message must be 1-2000 characters"))]
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct MarkReadRequest {
    pub message_ids: Option<Vec<Snowflake>>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct MessagesQuery {
    pub before: Option<Snowflake>,
    pub limit: Option<i64>,
}

// ============================================================================
// Notification Requests
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AdminNotifyRequest {
    pub user_id: Snowflake,

    #[validate(length(min = 1, max = 100, message = "Title must be 1-100 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 2000, message = "Content must be 1-2000 characters"))]
    pub content: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAnnouncementRequest {
    #[validate(length(min = 1, max = 100, message = "Title must be 1-100 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 5000, message = "Content must be 1-5000 characters"))]
    pub content: String,

    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateAnnouncementRequest {
    #[validate(length(min = 1, max = 100, message = "Title must be 1-100 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 5000, message = "Content must be 1-5000 characters"))]
    pub content: Option<String>,

    pub is_active: Option<bool>,

    pub expires_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Admin User Requests
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminUserQuery {
    pub role: Option<UserRole>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SuspendUserRequest {
    #[validate(length(min = 1, max = 500, message = "Reason must be 1-500 characters"))]
    pub reason: String,

    #[validate(range(min = 0, max = 3650, message = "Days must be 0-3650"))]
    pub days: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_params_clamp() {
        let page = PageParams::new(Some(0), Some(500));
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, MAX_PAGE_SIZE);
        assert_eq!(page.offset(), 0);

        let page = PageParams::new(Some(3), Some(10));
        assert_eq!(page.offset(), 20);
    }

    #[test]
    fn test_register_validation() {
        let req = RegisterRequest {
            email: "not-an-email".to_string(),
            name: String::new(),
            password: "short".to_string(),
        };
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_booking_request_bounds() {
        let empty = CreateBookingRequest {
            schedule_ids: vec![],
            promo_code: None,
        };
        assert!(empty.validate().is_err());

        let too_many = CreateBookingRequest {
            schedule_ids: (0..21).map(Snowflake::new).collect(),
            promo_code: None,
        };
        assert!(too_many.validate().is_err());
    }

    #[test]
    fn test_instant_duration_bounds() {
        let req = InstantBookingRequest {
            partner_id: Snowflake::new(1),
            duration_hours: 0.25,
            promo_code: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_callback_accepts_gateway_field_names() {
        let req: PaymentCallbackRequest = serde_json::from_value(serde_json::json!({
            "MerchantTradeNo": "PEI202501011200001234",
            "RtnCode": "1",
            "TradeNo": "2501011200123",
            "TradeAmt": 450
        }))
        .unwrap();
        assert_eq!(req.rtn_code, "1");
        assert_eq!(req.trade_amt, 450);
    }

    #[test]
    fn test_booking_list_side() {
        let q: BookingListQuery =
            serde_json::from_value(serde_json::json!({ "as": "partner" })).unwrap();
        assert_eq!(q.side, BookingSide::Partner);
        let q: BookingListQuery = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(q.side, BookingSide::Customer);
    }
}
