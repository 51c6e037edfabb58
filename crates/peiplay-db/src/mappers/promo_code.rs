//! Promo code mapper

use peiplay_core::{DiscountType, DomainError, PromoCode, Snowflake};

use super::parse_column;
use crate::models::PromoCodeModel;

impl TryFrom<PromoCodeModel> for PromoCode {
    type Error = DomainError;

    fn try_from(model: PromoCodeModel) -> Result<Self, Self::Error> {
        Ok(PromoCode {
            id: Snowflake::new(model.id),
            code: model.code,
            discount_type: parse_column(
                &model.discount_type,
                "promo_codes.discount_type",
                DiscountType::parse,
            )?,
            value: model.value,
            max_uses: model.max_uses,
            used_count: model.used_count,
            valid_from: model.valid_from,
            valid_until: model.valid_until,
            is_active: model.is_active,
            partner_id: model.partner_id.map(Snowflake::new),
            description: model.description,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
