//! Site-wide announcements

use chrono::Utc;
use peiplay_core::entities::Announcement;
use peiplay_core::{DomainError, Snowflake};
use tracing::{info, instrument};

use crate::dto::{
    map_all, AnnouncementResponse, CreateAnnouncementRequest, PageParams,
    UpdateAnnouncementRequest,
};

use super::access::AccessService;
use super::context::ServiceContext;
use super::error::ServiceResult;

pub struct AnnouncementService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AnnouncementService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Active, unexpired announcements
    #[instrument(skip(self))]
    pub async fn list_active(&self) -> ServiceResult<Vec<AnnouncementResponse>> {
        let now = Utc::now();
        let items = self.ctx.announcement_repo().list_active(now).await?;
        let visible: Vec<Announcement> = items.into_iter().filter(|a| a.is_visible_at(now)).collect();
        Ok(map_all(&visible))
    }

    #[instrument(skip(self))]
    pub async fn admin_list(
        &self,
        admin_id: Snowflake,
        page: PageParams,
    ) -> ServiceResult<Vec<AnnouncementResponse>> {
        AccessService::new(self.ctx).require_admin(admin_id).await?;
        let items = self
            .ctx
            .announcement_repo()
            .list_all(page.limit, page.offset())
            .await?;
        Ok(map_all(&items))
    }

    #[instrument(skip(self, request))]
    pub async fn create(
        &self,
        admin_id: Snowflake,
        request: CreateAnnouncementRequest,
    ) -> ServiceResult<AnnouncementResponse> {
        AccessService::new(self.ctx).require_admin(admin_id).await?;

        let now = Utc::now();
        let announcement = Announcement {
            id: self.ctx.generate_id(),
            title: request.title,
            content: request.content,
            is_active: true,
            expires_at: request.expires_at,
            created_by: admin_id,
            created_at: now,
            updated_at: now,
        };
        self.ctx.announcement_repo().create(&announcement).await?;

        info!(announcement_id = %announcement.id, "Announcement created");
        Ok(AnnouncementResponse::from(&announcement))
    }

    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        admin_id: Snowflake,
        id: Snowflake,
        request: UpdateAnnouncementRequest,
    ) -> ServiceResult<AnnouncementResponse> {
        AccessService::new(self.ctx).require_admin(admin_id).await?;

        let mut announcement = self.load(id).await?;
        if let Some(title) = request.title {
            announcement.title = title;
        }
        if let Some(content) = request.content {
            announcement.content = content;
        }
        if let Some(active) = request.is_active {
            announcement.is_active = active;
        }
        if request.expires_at.is_some() {
            announcement.expires_at = request.expires_at;
        }
        announcement.updated_at = Utc::now();
        self.ctx.announcement_repo().update(&announcement).await?;

        info!(announcement_id = %id, "Announcement updated");
        Ok(AnnouncementResponse::from(&announcement))
    }

    #[instrument(skip(self))]
    pub async fn deactivate(
        &self,
        admin_id: Snowflake,
        id: Snowflake,
    ) -> ServiceResult<AnnouncementResponse> {
        AccessService::new(self.ctx).require_admin(admin_id).await?;

        let mut announcement = self.load(id).await?;
        announcement.is_active = false;
        announcement.updated_at = Utc::now();
        self.ctx.announcement_repo().update(&announcement).await?;

        info!(announcement_id = %id, "Announcement deactivated");
        Ok(AnnouncementResponse::from(&announcement))
    }

    async fn load(&self, id: Snowflake) -> ServiceResult<Announcement> {
        let announcement = self
            .ctx
            .announcement_repo()
            .find_by_id(id)
            .await?
            .ok_or(DomainError::AnnouncementNotFound(id))?;
        Ok(announcement)
    }
}
