//! Gift mappers

use peiplay_core::{GiftItem, GiftRecord, PartnerEarnings, Snowflake};

use crate::models::{GiftItemModel, GiftRecordModel, PartnerEarningsModel};

impl From<GiftItemModel> for GiftItem {
    fn from(model: GiftItemModel) -> Self {
        GiftItem {
            id: Snowflake::new(model.id),
            name: model.name,
            emoji: model.emoji,
            coin_cost: model.coin_cost,
            partner_share: model.partner_share,
            is_active: model.is_active,
            sort_order: model.sort_order,
            created_at: model.created_at,
        }
    }
}

impl From<GiftRecordModel> for GiftRecord {
    fn from(model: GiftRecordModel) -> Self {
        GiftRecord {
            id: Snowflake::new(model.id),
            sender_id: Snowflake::new(model.sender_id),
            partner_id: Snowflake::new(model.partner_id),
            gift_id: Snowflake::new(model.gift_id),
            gift_name: model.gift_name,
            gift_emoji: model.gift_emoji,
            coin_cost: model.coin_cost,
            partner_coins: model.partner_coins,
            chat_room_id: model.chat_room_id.map(Snowflake::new),
            created_at: model.created_at,
        }
    }
}

impl From<PartnerEarningsModel> for PartnerEarnings {
    fn from(model: PartnerEarningsModel) -> Self {
        PartnerEarnings {
            partner_id: Snowflake::new(model.partner_id),
            total_earned_coins: model.total_earned_coins,
            pending_earnings_coins: model.pending_earnings_coins,
            updated_at: model.updated_at,
        }
    }
}
