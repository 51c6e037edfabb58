//! Data transfer objects for API requests and responses
//!
//! This module provides:
//! - Request DTOs with validation for API inputs
//! - Response DTOs for serializing API outputs
//! - Mappers for converting domain entities to DTOs

pub mod mappers;
pub mod requests;
pub mod responses;

pub use mappers::map_all;

pub use requests::{
    AdminAddCoinsRequest, AdminNotifyRequest, AdminPartnerQuery, AdminUserQuery,
    ApplyPartnerRequest, BatchScheduleRequest, BookingListQuery, BookingSide,
    CancelBookingRequest, ChangePasswordRequest, CreateAnnouncementRequest, CreateBookingRequest,
    CreateOrderRequest, CreatePromoRequest, CreateReviewRequest, CreateScheduleRequest,
    CreateWithdrawalRequest, EnsureRoomRequest, FreeChatRequest, InstantBookingRequest,
    LoginRequest, LogoutRequest, MarkReadRequest, MessagesQuery, ModerateReviewRequest, ModerationAction,
    PageParams, PartnerListQuery, PaymentCallbackRequest, ProcessWithdrawalRequest,
    RechargeRequest, ReferralCodeRequest, RefreshTokenRequest, RegisterRequest,
    RespondBookingRequest, ReviewListQuery, ReviewPartnerRequest, ScheduleEntry,
    SendGiftRequest, SendMessageRequest, SetAvailabilityRequest, SuspendUserRequest,
    TimeWindowQuery, UpdateAnnouncementRequest, UpdatePartnerRequest, UpdatePromoRequest,
    ValidatePromoRequest, WithdrawalListQuery, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};

pub use responses::{
    AnnouncementResponse, AuthResponse, AutoCloseResponse, BatchScheduleResponse,
    BookingDetailResponse, CancelBookingResponse, ChatMessageResponse, ChatRoomResponse,
    CoinBalanceResponse, CoinTransactionResponse, CompleteBookingsResponse, CurrentUserResponse,
    FreeChatRoomResponse, GiftItemResponse, GiftRecordResponse, HealthChecks, HealthResponse, InviteeResponse,
    NotificationListResponse, NotificationResponse, OrderResponse, OwnPartnerResponse, PageMeta,
    PaginatedResponse, PartnerDetailResponse, PartnerEarningsResponse, PartnerResponse,
    PromoCodeResponse, PromoValidationResponse, RatingResponse, ReadinessResponse,
    ReceivedGiftsResponse, RechargeResponse, ReferralCodeResponse, ReferralStatsResponse,
    ReferralSweepResponse, ReferralValidationResponse, ReviewResponse, ScheduleResponse,
    SendGiftResponse, UnreadCountResponse, UserResponse, WithdrawalCreatedResponse,
    WithdrawalHistoryResponse, WithdrawalResponse,
};
