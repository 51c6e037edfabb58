//! Notification service
//!
//! In-app notifications. `notify` is fire-and-forget from the caller's point
//! of view: a failed insert or publish is logged and swallowed.

use chrono::Utc;
use peiplay_cache::PubSubChannel;
use peiplay_core::entities::{Notification, NotificationType};
use peiplay_core::events::{DomainEvent, NotificationCreateEvent};
use peiplay_core::{DomainError, Snowflake};
use tracing::{info, instrument, warn};

use crate::dto::{
    map_all, AdminNotifyRequest, NotificationListResponse, NotificationResponse, PageMeta,
    PageParams,
};

use super::access::AccessService;
use super::context::ServiceContext;
use super::error::ServiceResult;

pub struct NotificationService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> NotificationService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Persist a notification and push it to the user's channel
    #[instrument(skip(self, title, content, data), fields(kind = notification_type.as_str()))]
    pub async fn notify(
        &self,
        user_id: Snowflake,
        notification_type: NotificationType,
        title: impl Into<String>,
        content: impl Into<String>,
        data: Option<serde_json::Value>,
    ) {
        let mut notification = Notification::new(
            self.ctx.generate_id(),
            user_id,
            notification_type,
            title.into(),
            content.into(),
        );
        if let Some(data) = data {
            notification = notification.with_data(data);
        }

        if let Err(e) = self.ctx.notification_repo().create(&notification).await {
            warn!(user_id = %user_id, error = %e, "Failed to store notification");
            return;
        }

        let event = DomainEvent::NotificationCreate(NotificationCreateEvent {
            notification_id: notification.id,
            user_id,
            notification_type,
            title: notification.title.clone(),
            content: notification.content.clone(),
            timestamp: notification.created_at,
        });
        if let Err(e) = self
            .ctx
            .publisher()
            .publish_domain_event(&[PubSubChannel::user(user_id)], &event)
            .await
        {
            warn!(user_id = %user_id, error = %e, "Failed to publish notification");
        }
    }

    /// Same notification to several users
    pub async fn notify_all(
        &self,
        user_ids: &[Snowflake],
        notification_type: NotificationType,
        title: &str,
        content: &str,
        data: Option<serde_json::Value>,
    ) {
        for user_id in user_ids {
            self.notify(*user_id, notification_type, title, content, data.clone())
                .await;
        }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        user_id: Snowflake,
        page: PageParams,
    ) -> ServiceResult<NotificationListResponse> {
        let repo = self.ctx.notification_repo();
        let notifications = repo.list(user_id, page.limit, page.offset()).await?;
        let total = repo.count(user_id).await?;
        let unread_count = repo.unread_count(user_id).await?;

        Ok(NotificationListResponse {
            notifications: map_all::<_, NotificationResponse>(&notifications),
            pagination: PageMeta::new(page, total),
            unread_count,
        })
    }

    #[instrument(skip(self))]
    pub async fn mark_all_read(&self, user_id: Snowflake) -> ServiceResult<u64> {
        let updated = self.ctx.notification_repo().mark_all_read(user_id).await?;
        info!(user_id = %user_id, updated, "Notifications marked read");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn mark_read(&self, id: Snowflake, user_id: Snowflake) -> ServiceResult<()> {
        if !self.ctx.notification_repo().mark_read(id, user_id).await? {
            return Err(DomainError::NotificationNotFound(id).into());
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Snowflake, user_id: Snowflake) -> ServiceResult<()> {
        if !self.ctx.notification_repo().delete(id, user_id).await? {
            return Err(DomainError::NotificationNotFound(id).into());
        }
        info!(notification_id = %id, "Notification deleted");
        Ok(())
    }

    /// Admin-authored SYSTEM notification to one user
    #[instrument(skip(self, request), fields(target = %request.user_id))]
    pub async fn admin_send_personal(
        &self,
        admin_id: Snowflake,
        request: AdminNotifyRequest,
    ) -> ServiceResult<()> {
        let access = AccessService::new(self.ctx);
        access.require_admin(admin_id).await?;
        access.require_user(request.user_id).await?;

        self.notify(
            request.user_id,
            NotificationType::System,
            request.title,
            request.content,
            Some(serde_json::json!({ "sent_by": admin_id, "sent_at": Utc::now() })),
        )
        .await;
        info!(admin_id = %admin_id, user_id = %request.user_id, "Personal notification sent");
        Ok(())
    }
}
