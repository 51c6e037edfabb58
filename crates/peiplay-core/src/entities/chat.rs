//! Chat rooms, membership, and messages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Maximum message length in characters
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// Words that send a message to moderation
pub const BLOCKED_KEYWORDS: [&str; 2] = ["垃圾", "spam"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChatRoomType {
    OneOnOne,
    Group,
}

impl ChatRoomType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneOnOne => "ONE_ON_ONE",
            Self::Group => "GROUP",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ONE_ON_ONE" => Some(Self::OneOnOne),
            "GROUP" => Some(Self::Group),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRoom {
    pub id: Snowflake,
    pub room_type: ChatRoomType,
    /// `None` for free chat outside a booking
    pub booking_id: Option<Snowflake>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ChatRoom {
    pub fn for_booking(id: Snowflake, booking_id: Snowflake) -> Self {
        Self {
            id,
            room_type: ChatRoomType::OneOnOne,
            booking_id: Some(booking_id),
            last_message_at: None,
            created_at: Utc::now(),
        }
    }

    /// Booking-less one-on-one room
    pub fn free_chat(id: Snowflake) -> Self {
        Self {
            id,
            room_type: ChatRoomType::OneOnOne,
            booking_id: None,
            last_message_at: None,
            created_at: Utc::now(),
        }
    }

    /// Fail once `sent` messages from one sender reach the free-chat cap
    pub fn check_free_chat_quota(&self, sent: i64, limit: i64) -> Result<(), DomainError> {
        if self.is_free_chat() && sent >= limit {
            return Err(DomainError::FreeChatLimitReached { limit });
        }
        Ok(())
    }

    #[inline]
    pub fn is_free_chat(&self) -> bool {
        self.booking_id.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMember {
    pub room_id: Snowflake,
    pub user_id: Snowflake,
    pub joined_at: DateTime<Utc>,
    pub last_read_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageStatus {
    Sent,
    Delivered,
    Read,
}

impl MessageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sent => "SENT",
            Self::Delivered => "DELIVERED",
            Self::Read => "READ",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SENT" => Some(Self::Sent),
            "DELIVERED" => Some(Self::Delivered),
            "READ" => Some(Self::Read),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModerationStatus {
    Pending,
    Approved,
    Flagged,
    Rejected,
}

impl ModerationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Flagged => "FLAGGED",
            Self::Rejected => "REJECTED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "APPROVED" => Some(Self::Approved),
            "FLAGGED" => Some(Self::Flagged),
            "REJECTED" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Keyword screen applied to every outgoing message
    pub fn screen(content: &str) -> Self {
        let lowered = content.to_lowercase();
        if BLOCKED_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
            Self::Flagged
        } else {
            Self::Approved
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    Text,
    Gift,
    System,
}

impl MessageType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Gift => "GIFT",
            Self::System => "SYSTEM",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "TEXT" => Some(Self::Text),
            "GIFT" => Some(Self::Gift),
            "SYSTEM" => Some(Self::System),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: Snowflake,
    pub room_id: Snowflake,
    pub sender_id: Snowflake,
    /// Snapshot of the sender's display name at send time
    pub sender_name: String,
    pub content: String,
    pub message_type: MessageType,
    pub status: MessageStatus,
    pub moderation_status: ModerationStatus,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Trim, reject empty or oversized content, and screen for keywords
    pub fn compose(
        id: Snowflake,
        room_id: Snowflake,
        sender_id: Snowflake,
        sender_name: String,
        content: &str,
    ) -> Result<Self, DomainError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(DomainError::EmptyMessage);
        }
        if content.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(DomainError::ValidationError(format!(
                "message exceeds {MAX_MESSAGE_LENGTH} characters"
            )));
        }
        Ok(Self {
            id,
            room_id,
            sender_id,
            sender_name,
            content: content.to_string(),
            message_type: MessageType::Text,
            status: MessageStatus::Sent,
            moderation_status: ModerationStatus::screen(content),
            created_at: Utc::now(),
        })
    }
}

/// Room listing row with the caller's unread count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRoomSummary {
    pub room: ChatRoom,
    pub unread_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compose(content: &str) -> Result<ChatMessage, DomainError> {
        ChatMessage::compose(
            Snowflake::new(1),
            Snowflake::new(2),
            Snowflake::new(3),
            "Ann".to_string(),
            content,
        )
    }

    #[test]
    fn test_content_is_trimmed() {
        let msg = compose("  gg wp \n").unwrap();
        assert_eq!(msg.content, "gg wp");
        assert_eq!(msg.moderation_status, ModerationStatus::Approved);
        assert_eq!(msg.status, MessageStatus::Sent);
    }

    #[test]
    fn test_blank_content_rejected() {
        assert!(matches!(compose("   "), Err(DomainError::EmptyMessage)));
    }

    #[test]
    fn test_keywords_flag_message() {
        assert_eq!(compose("this is SPAM").unwrap().moderation_status, ModerationStatus::Flagged);
        assert_eq!(compose("你是垃圾").unwrap().moderation_status, ModerationStatus::Flagged);
    }

    #[test]
    fn test_free_chat_quota() {
        let room = ChatRoom::free_chat(Snowflake::new(10));
        assert!(room.is_free_chat());
        assert!(room.check_free_chat_quota(4, 5).is_ok());
        assert!(matches!(
            room.check_free_chat_quota(5, 5),
            Err(DomainError::FreeChatLimitReached { limit: 5 })
        ));

        let booked = ChatRoom::for_booking(Snowflake::new(11), Snowflake::new(12));
        assert!(booked.check_free_chat_quota(500, 5).is_ok());
    }

    #[test]
    fn test_length_limit_counts_characters() {
        assert!(compose(&"字".repeat(MAX_MESSAGE_LENGTH)).is_ok());
        assert!(compose(&"a".repeat(MAX_MESSAGE_LENGTH + 1)).is_err());
    }
}
