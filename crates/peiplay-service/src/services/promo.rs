//! Promo code service
//!
//! Public validation plus admin management.

use chrono::Utc;
use peiplay_core::entities::{DiscountType, PromoCode, UNLIMITED_USES};
use peiplay_core::{DomainError, Snowflake};
use rust_decimal::Decimal;
use tracing::{info, instrument};

use crate::dto::{
    map_all, CreatePromoRequest, PageParams, PromoCodeResponse, PromoValidationResponse,
    UpdatePromoRequest, ValidatePromoRequest,
};

use super::access::AccessService;
use super::context::ServiceContext;
use super::error::ServiceResult;

fn check_value(discount_type: DiscountType, value: Decimal) -> Result<(), DomainError> {
    if value <= Decimal::ZERO {
        return Err(DomainError::ValidationError("value must be greater than 0".to_string()));
    }
    if discount_type == DiscountType::Percentage && value > Decimal::ONE_HUNDRED {
        return Err(DomainError::ValidationError(
            "percentage discount cannot exceed 100".to_string(),
        ));
    }
    Ok(())
}

fn check_max_uses(max_uses: i32) -> Result<(), DomainError> {
    if max_uses != UNLIMITED_USES && max_uses < 1 {
        return Err(DomainError::ValidationError(
            "max_uses must be positive or -1 for unlimited".to_string(),
        ));
    }
    Ok(())
}

pub struct PromoService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> PromoService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Price an amount with a code without consuming a use
    #[instrument(skip(self, request), fields(code = %request.code))]
    pub async fn validate(&self, request: ValidatePromoRequest) -> ServiceResult<PromoValidationResponse> {
        if request.amount <= Decimal::ZERO {
            return Err(DomainError::ValidationError("amount must be greater than 0".to_string()).into());
        }

        let code = PromoCode::normalize(&request.code);
        let promo = self
            .ctx
            .promo_repo()
            .find_by_code(&code)
            .await?
            .ok_or_else(|| DomainError::PromoCodeNotFound(code.clone()))?;

        let discount = promo.apply(request.amount, request.partner_id, Utc::now())?;

        Ok(PromoValidationResponse {
            code: promo.code,
            discount_type: promo.discount_type,
            original_amount: discount.original_amount,
            discount_amount: discount.discount_amount,
            final_amount: discount.final_amount,
        })
    }

    #[instrument(skip(self))]
    pub async fn admin_list(
        &self,
        admin_id: Snowflake,
        page: PageParams,
    ) -> ServiceResult<Vec<PromoCodeResponse>> {
        AccessService::new(self.ctx).require_admin(admin_id).await?;
        let codes = self.ctx.promo_repo().list(page.limit, page.offset()).await?;
        Ok(map_all(&codes))
    }

    #[instrument(skip(self, request), fields(code = %request.code))]
    pub async fn admin_create(
        &self,
        admin_id: Snowflake,
        request: CreatePromoRequest,
    ) -> ServiceResult<PromoCodeResponse> {
        let access = AccessService::new(self.ctx);
        access.require_admin(admin_id).await?;

        check_value(request.discount_type, request.value)?;
        let max_uses = request.max_uses.unwrap_or(UNLIMITED_USES);
        check_max_uses(max_uses)?;

        let code = PromoCode::normalize(&request.code);
        if code.is_empty() {
            return Err(DomainError::ValidationError("code is required".to_string()).into());
        }
        if self.ctx.promo_repo().find_by_code(&code).await?.is_some() {
            return Err(DomainError::PromoCodeExists.into());
        }
        if let Some(partner_id) = request.partner_id {
            access.find_partner(partner_id).await?;
        }

        let mut promo = PromoCode::new(
            self.ctx.generate_id(),
            &code,
            request.discount_type,
            request.value,
            request.valid_from.unwrap_or_else(Utc::now),
        );
        promo.max_uses = max_uses;
        promo.valid_until = request.valid_until;
        promo.partner_id = request.partner_id;
        promo.description = request.description;

        self.ctx.promo_repo().create(&promo).await?;
        info!(promo_id = %promo.id, code = %promo.code, "Promo code created");

        Ok(PromoCodeResponse::from(&promo))
    }

    #[instrument(skip(self, request))]
    pub async fn admin_update(
        &self,
        admin_id: Snowflake,
        id: Snowflake,
        request: UpdatePromoRequest,
    ) -> ServiceResult<PromoCodeResponse> {
        AccessService::new(self.ctx).require_admin(admin_id).await?;
        let mut promo = self.load(id).await?;

        if let Some(discount_type) = request.discount_type {
            promo.discount_type = discount_type;
        }
        if let Some(value) = request.value {
            promo.value = value;
        }
        check_value(promo.discount_type, promo.value)?;
        if let Some(max_uses) = request.max_uses {
            check_max_uses(max_uses)?;
            promo.max_uses = max_uses;
        }
        if let Some(valid_from) = request.valid_from {
            promo.valid_from = valid_from;
        }
        if request.valid_until.is_some() {
            promo.valid_until = request.valid_until;
        }
        if let Some(active) = request.is_active {
            promo.is_active = active;
        }
        if request.description.is_some() {
            promo.description = request.description;
        }
        promo.updated_at = Utc::now();

        self.ctx.promo_repo().update(&promo).await?;
        info!(promo_id = %id, "Promo code updated");
        Ok(PromoCodeResponse::from(&promo))
    }

    #[instrument(skip(self))]
    pub async fn admin_delete(&self, admin_id: Snowflake, id: Snowflake) -> ServiceResult<()> {
        AccessService::new(self.ctx).require_admin(admin_id).await?;
        self.load(id).await?;
        self.ctx.promo_repo().delete(id).await?;
        info!(promo_id = %id, "Promo code deleted");
        Ok(())
    }

    /// Flip `is_active`
    #[instrument(skip(self))]
    pub async fn admin_toggle(
        &self,
        admin_id: Snowflake,
        id: Snowflake,
    ) -> ServiceResult<PromoCodeResponse> {
        AccessService::new(self.ctx).require_admin(admin_id).await?;
        let promo = self.load(id).await?;
        let updated = self.ctx.promo_repo().set_active(id, !promo.is_active).await?;
        info!(promo_id = %id, active = updated.is_active, "Promo code toggled");
        Ok(PromoCodeResponse::from(&updated))
    }

    async fn load(&self, id: Snowflake) -> ServiceResult<PromoCode> {
        let promo = self
            .ctx
            .promo_repo()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::PromoCodeNotFound(id.to_string()))?;
        Ok(promo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_value() {
        assert!(check_value(DiscountType::Percentage, Decimal::from(10)).is_ok());
        assert!(check_value(DiscountType::Percentage, Decimal::from(101)).is_err());
        assert!(check_value(DiscountType::Fixed, Decimal::from(500)).is_ok());
        assert!(check_value(DiscountType::Fixed, Decimal::ZERO).is_err());
    }

    #[test]
    fn test_check_max_uses() {
        assert!(check_max_uses(UNLIMITED_USES).is_ok());
        assert!(check_max_uses(10).is_ok());
        assert!(check_max_uses(0).is_err());
    }
}
