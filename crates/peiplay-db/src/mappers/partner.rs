//! Partner mapper

use peiplay_core::{DomainError, Partner, PartnerStatus, Snowflake};

use super::parse_column;
use crate::models::PartnerModel;

impl TryFrom<PartnerModel> for Partner {
    type Error = DomainError;

    fn try_from(model: PartnerModel) -> Result<Self, Self::Error> {
        Ok(Partner {
            id: Snowflake::new(model.id),
            user_id: Snowflake::new(model.user_id),
            name: model.name,
            games: model.games,
            half_hourly_rate: model.half_hourly_rate,
            status: parse_column(&model.status, "partners.status", PartnerStatus::parse)?,
            customer_message: model.customer_message,
            is_available_now: model.is_available_now,
            available_now_since: model.available_now_since,
            invite_code: model.invite_code,
            invited_by: model.invited_by.map(Snowflake::new),
            referral_count: model.referral_count,
            referral_earnings: model.referral_earnings,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
