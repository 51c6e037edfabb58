//! Notification and announcement mappers

use peiplay_core::{Announcement, DomainError, Notification, NotificationType, Snowflake};

use super::parse_column;
use crate::models::{AnnouncementModel, NotificationModel};

impl TryFrom<NotificationModel> for Notification {
    type Error = DomainError;

    fn try_from(model: NotificationModel) -> Result<Self, Self::Error> {
        Ok(Notification {
            id: Snowflake::new(model.id),
            user_id: Snowflake::new(model.user_id),
            notification_type: parse_column(
                &model.notification_type,
                "notifications.notification_type",
                NotificationType::parse,
            )?,
            title: model.title,
            content: model.content,
            data: model.data,
            is_read: model.is_read,
            is_deleted: model.is_deleted,
            created_at: model.created_at,
        })
    }
}

impl From<AnnouncementModel> for Announcement {
    fn from(model: AnnouncementModel) -> Self {
        Announcement {
            id: Snowflake::new(model.id),
            title: model.title,
            content: model.content,
            is_active: model.is_active,
            expires_at: model.expires_at,
            created_by: Snowflake::new(model.created_by),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
