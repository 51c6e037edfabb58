//! In-app notifications and site-wide announcements

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    BookingCreated,
    PaymentSuccess,
    PaymentFailed,
    PartnerConfirmation,
    PartnerRejection,
    BookingCancelled,
    BookingReminder,
    BookingStarting,
    BookingCompleted,
    WithdrawalUpdate,
    PartnerReview,
    System,
}

impl NotificationType {
    pub const ALL: [NotificationType; 12] = [
        Self::BookingCreated,
        Self::PaymentSuccess,
        Self::PaymentFailed,
        Self::PartnerConfirmation,
        Self::PartnerRejection,
        Self::BookingCancelled,
        Self::BookingReminder,
        Self::BookingStarting,
        Self::BookingCompleted,
        Self::WithdrawalUpdate,
        Self::PartnerReview,
        Self::System,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::BookingCreated => "BOOKING_CREATED",
            Self::PaymentSuccess => "PAYMENT_SUCCESS",
            Self::PaymentFailed => "PAYMENT_FAILED",
            Self::PartnerConfirmation => "PARTNER_CONFIRMATION",
            Self::PartnerRejection => "PARTNER_REJECTION",
            Self::BookingCancelled => "BOOKING_CANCELLED",
            Self::BookingReminder => "BOOKING_REMINDER",
            Self::BookingStarting => "BOOKING_STARTING",
            Self::BookingCompleted => "BOOKING_COMPLETED",
            Self::WithdrawalUpdate => "WITHDRAWAL_UPDATE",
            Self::PartnerReview => "PARTNER_REVIEW",
            Self::System => "SYSTEM",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: Snowflake,
    pub user_id: Snowflake,
    pub notification_type: NotificationType,
    pub title: String,
    pub content: String,
    pub data: Option<serde_json::Value>,
    pub is_read: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        id: Snowflake,
        user_id: Snowflake,
        notification_type: NotificationType,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id,
            user_id,
            notification_type,
            title: title.into(),
            content: content.into(),
            data: None,
            is_read: false,
            is_deleted: false,
            created_at: Utc::now(),
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub id: Snowflake,
    pub title: String,
    pub content: String,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_by: Snowflake,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Announcement {
    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at.map_or(true, |exp| exp > now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_type_strings_round_trip() {
        for t in NotificationType::ALL {
            assert_eq!(NotificationType::parse(t.as_str()), Some(t));
        }
    }

    #[test]
    fn test_new_notification_unread() {
        let n = Notification::new(
            Snowflake::new(1),
            Snowflake::new(2),
            NotificationType::BookingCreated,
            "New booking",
            "You have a new booking",
        )
        .with_data(serde_json::json!({ "booking_id": "3" }));
        assert!(!n.is_read);
        assert!(!n.is_deleted);
        assert!(n.data.is_some());
    }

    #[test]
    fn test_announcement_visibility() {
        let now = Utc::now();
        let mut a = Announcement {
            id: Snowflake::new(1),
            title: "Maintenance".into(),
            content: "Tonight".into(),
            is_active: true,
            expires_at: Some(now + Duration::hours(1)),
            created_by: Snowflake::new(9),
            created_at: now,
            updated_at: now,
        };
        assert!(a.is_visible_at(now));
        assert!(!a.is_visible_at(now + Duration::hours(2)));
        a.is_active = false;
        assert!(!a.is_visible_at(now));
    }
}
