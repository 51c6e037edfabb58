//! Customer favourites

use peiplay_core::Snowflake;
use tracing::{info, instrument};

use crate::dto::{map_all, PartnerResponse};

use super::access::AccessService;
use super::context::ServiceContext;
use super::error::ServiceResult;

pub struct FavoriteService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> FavoriteService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, user_id: Snowflake) -> ServiceResult<Vec<PartnerResponse>> {
        let customer = AccessService::new(self.ctx).require_customer(user_id).await?;
        let partners = self.ctx.favorite_repo().list(customer.id).await?;
        Ok(map_all(&partners))
    }

    #[instrument(skip(self))]
    pub async fn add(&self, user_id: Snowflake, partner_id: Snowflake) -> ServiceResult<()> {
        let access = AccessService::new(self.ctx);
        let customer = access.require_customer(user_id).await?;
        access.find_partner(partner_id).await?;
        self.ctx.favorite_repo().add(customer.id, partner_id).await?;
        info!(customer_id = %customer.id, partner_id = %partner_id, "Favorite added");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn remove(&self, user_id: Snowflake, partner_id: Snowflake) -> ServiceResult<()> {
        let customer = AccessService::new(self.ctx).require_customer(user_id).await?;
        self.ctx.favorite_repo().remove(customer.id, partner_id).await?;
        Ok(())
    }
}
