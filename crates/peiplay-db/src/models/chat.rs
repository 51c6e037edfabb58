//! Chat room, membership, and message models

use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct ChatRoomModel {
    pub id: i64,
    pub room_type: String,
    pub booking_id: Option<i64>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Room row plus the caller's unread count
#[derive(Debug, Clone, FromRow)]
pub struct ChatRoomSummaryModel {
    pub id: i64,
    pub room_type: String,
    pub booking_id: Option<i64>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub unread_count: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct ChatMemberModel {
    pub room_id: i64,
    pub user_id: i64,
    pub joined_at: DateTime<Utc>,
    pub last_read_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ChatMessageModel {
    pub id: i64,
    pub room_id: i64,
    pub sender_id: i64,
    pub sender_name: String,
    pub content: String,
    pub message_type: String,
    pub status: String,
    pub moderation_status: String,
    pub created_at: DateTime<Utc>,
}
