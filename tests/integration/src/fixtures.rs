//! Test fixtures and data generators

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique per process and across runs against the same database
pub fn unique_suffix() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("{}{}", nanos % 1_000_000_000, COUNTER.fetch_add(1, Ordering::SeqCst))
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn unique() -> Self {
        let suffix = unique_suffix();
        Self {
            email: format!("player{suffix}@example.com"),
            name: format!("Player {suffix}"),
            password: "TestPass123!".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn from_register(reg: &RegisterRequest) -> Self {
        Self {
            email: reg.email.clone(),
            password: reg.password.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: CurrentUserResponse,
}

#[derive(Debug, Deserialize)]
pub struct CurrentUserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub customer_id: Option<String>,
    pub partner_id: Option<String>,
    pub partner_status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApplyPartnerRequest {
    pub name: String,
    pub games: Vec<String>,
    pub half_hourly_rate: u32,
    pub customer_message: Option<String>,
    pub invite_code: Option<String>,
}

impl ApplyPartnerRequest {
    pub fn unique() -> Self {
        Self {
            name: format!("Partner {}", unique_suffix()),
            games: vec!["Valorant".to_string(), "League of Legends".to_string()],
            half_hourly_rate: 250,
            customer_message: Some("Ranked duo, chill vibes".to_string()),
            invite_code: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PartnerResponse {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub games: Vec<String>,
    pub status: String,
    pub customer_message: Option<String>,
    pub is_available_now: bool,
}

#[derive(Debug, Deserialize)]
pub struct CoinBalanceResponse {
    pub coin_balance: i64,
    pub total_recharged: i64,
    pub total_spent: i64,
}

#[derive(Debug, Deserialize)]
pub struct RechargeResponse {
    pub order_number: String,
    pub coin_amount: i64,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct UnreadCountResponse {
    pub unread_count: i64,
}

#[derive(Debug, Deserialize)]
pub struct FreeChatRoomResponse {
    pub id: String,
    pub booking_id: Option<String>,
    pub created: bool,
}
