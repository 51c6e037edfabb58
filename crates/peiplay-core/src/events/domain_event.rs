//! Domain events - emitted when marketplace state changes
//!
//! Events are pushed to Redis pub/sub so connected clients (chat widgets,
//! partner dashboards) can refresh without polling.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entities::{BookingStatus, NotificationType};
use crate::value_objects::Snowflake;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DomainEvent {
    // =========================================================================
    // Booking Events
    // =========================================================================
    BookingCreated(BookingCreatedEvent),
    BookingStatusChanged(BookingStatusChangedEvent),

    // =========================================================================
    // Partner Events
    // =========================================================================
    PartnerAvailabilityChanged(PartnerAvailabilityChangedEvent),

    // =========================================================================
    // Chat Events
    // =========================================================================
    MessageCreate(MessageCreateEvent),
    MessagesRead(MessagesReadEvent),

    // =========================================================================
    // Economy Events
    // =========================================================================
    GiftReceived(GiftReceivedEvent),
    WithdrawalRequested(WithdrawalRequestedEvent),

    // =========================================================================
    // Notification Events
    // =========================================================================
    NotificationCreate(NotificationCreateEvent),
}

impl DomainEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::BookingCreated(_) => "BOOKING_CREATED",
            Self::BookingStatusChanged(_) => "BOOKING_STATUS_CHANGED",
            Self::PartnerAvailabilityChanged(_) => "PARTNER_AVAILABILITY_CHANGED",
            Self::MessageCreate(_) => "MESSAGE_CREATE",
            Self::MessagesRead(_) => "MESSAGES_READ",
            Self::GiftReceived(_) => "GIFT_RECEIVED",
            Self::WithdrawalRequested(_) => "WITHDRAWAL_REQUESTED",
            Self::NotificationCreate(_) => "NOTIFICATION_CREATE",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::BookingCreated(e) => e.timestamp,
            Self::BookingStatusChanged(e) => e.timestamp,
            Self::PartnerAvailabilityChanged(e) => e.timestamp,
            Self::MessageCreate(e) => e.timestamp,
            Self::MessagesRead(e) => e.timestamp,
            Self::GiftReceived(e) => e.timestamp,
            Self::WithdrawalRequested(e) => e.timestamp,
            Self::NotificationCreate(e) => e.timestamp,
        }
    }
}

// ============================================================================
// Event Structs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingCreatedEvent {
    pub booking_id: Snowflake,
    pub partner_id: Snowflake,
    pub customer_id: Snowflake,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingStatusChangedEvent {
    pub booking_id: Snowflake,
    pub status: BookingStatus,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartnerAvailabilityChangedEvent {
    pub partner_id: Snowflake,
    pub is_available_now: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageCreateEvent {
    pub message_id: Snowflake,
    pub room_id: Snowflake,
    pub sender_id: Snowflake,
    pub sender_name: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesReadEvent {
    pub room_id: Snowflake,
    pub user_id: Snowflake,
    pub message_ids: Vec<Snowflake>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GiftReceivedEvent {
    pub gift_record_id: Snowflake,
    pub partner_id: Snowflake,
    pub sender_id: Snowflake,
    pub gift_name: String,
    pub gift_emoji: String,
    pub coin_cost: i64,
    pub chat_room_id: Option<Snowflake>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalRequestedEvent {
    pub withdrawal_id: Snowflake,
    pub partner_id: Snowflake,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationCreateEvent {
    pub notification_id: Snowflake,
    pub user_id: Snowflake,
    pub notification_type: NotificationType,
    pub title: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = DomainEvent::BookingStatusChanged(BookingStatusChangedEvent {
            booking_id: Snowflake::new(5),
            status: BookingStatus::PaidWaitingPartnerConfirmation,
            timestamp: Utc::now(),
        });

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "BOOKING_STATUS_CHANGED");
        assert_eq!(json["status"], "PAID_WAITING_PARTNER_CONFIRMATION");
        assert_eq!(json["booking_id"], "5");

        let parsed: DomainEvent = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.event_type(), "BOOKING_STATUS_CHANGED");
    }

    #[test]
    fn test_type_tag_matches_event_type() {
        let event = DomainEvent::MessagesRead(MessagesReadEvent {
            room_id: Snowflake::new(1),
            user_id: Snowflake::new(2),
            message_ids: vec![],
            timestamp: Utc::now(),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event.event_type());
    }
}
