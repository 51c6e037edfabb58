//! Gift service
//!
//! Customers spend coins on gifts; partners accrue a share as earnings.

use peiplay_cache::PubSubChannel;
use peiplay_core::entities::GiftSend;
use peiplay_core::events::{DomainEvent, GiftReceivedEvent};
use peiplay_core::{DomainError, Snowflake};
use tracing::{info, instrument, warn};

use crate::dto::{
    map_all, GiftItemResponse, GiftRecordResponse, PartnerEarningsResponse, ReceivedGiftsResponse,
    SendGiftRequest, SendGiftResponse,
};

use super::access::AccessService;
use super::context::ServiceContext;
use super::error::ServiceResult;

/// Gift history entries returned to the partner
const RECEIVED_HISTORY_LIMIT: i64 = 50;

pub struct GiftService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> GiftService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> ServiceResult<Vec<GiftItemResponse>> {
        let items = self.ctx.gift_repo().list_active().await?;
        Ok(map_all(&items))
    }

    /// Spend coins on a gift for a partner
    #[instrument(skip(self, request), fields(sender_id = %user_id, gift_id = %request.gift_id))]
    pub async fn send(
        &self,
        user_id: Snowflake,
        request: SendGiftRequest,
    ) -> ServiceResult<SendGiftResponse> {
        let access = AccessService::new(self.ctx);
        access.require_active_user(user_id).await?;
        let partner = access.find_partner(request.partner_id).await?;

        let gift = self
            .ctx
            .gift_repo()
            .find_by_id(request.gift_id)
            .await?
            .filter(|g| g.is_active)
            .ok_or(DomainError::GiftNotFound(request.gift_id))?;

        if let Some(room_id) = request.chat_room_id {
            if self.ctx.chat_repo().find_member(room_id, user_id).await?.is_none() {
                return Err(DomainError::NotRoomMember.into());
            }
        }

        let send = GiftSend {
            record_id: self.ctx.generate_id(),
            transaction_id: self.ctx.generate_id(),
            sender_id: user_id,
            partner_id: partner.id,
            gift,
            chat_room_id: request.chat_room_id,
        };
        let (record, tx) = self.ctx.gift_repo().send(&send).await?;

        info!(
            gift_record_id = %record.id,
            partner_id = %partner.id,
            coins = record.coin_cost,
            "Gift sent"
        );

        let event = DomainEvent::GiftReceived(GiftReceivedEvent {
            gift_record_id: record.id,
            partner_id: partner.id,
            sender_id: user_id,
            gift_name: record.gift_name.clone(),
            gift_emoji: record.gift_emoji.clone(),
            coin_cost: record.coin_cost,
            chat_room_id: record.chat_room_id,
            timestamp: record.created_at,
        });
        let mut channels = vec![PubSubChannel::user(partner.user_id)];
        if let Some(room_id) = record.chat_room_id {
            channels.push(PubSubChannel::room(room_id));
        }
        if let Err(e) = self.ctx.publisher().publish_domain_event(&channels, &event).await {
            warn!(gift_record_id = %record.id, error = %e, "Failed to publish gift event");
        }

        Ok(SendGiftResponse {
            gift: GiftRecordResponse::from(&record),
            balance_after: tx.balance_after,
        })
    }

    /// Gifts the calling partner received, with coin earnings
    #[instrument(skip(self))]
    pub async fn received(&self, user_id: Snowflake) -> ServiceResult<ReceivedGiftsResponse> {
        let partner = AccessService::new(self.ctx).require_partner(user_id).await?;
        let repo = self.ctx.gift_repo();
        let gifts = repo.received_by_partner(partner.id, RECEIVED_HISTORY_LIMIT).await?;
        let earnings = repo.earnings(partner.id).await?;

        Ok(ReceivedGiftsResponse {
            gifts: map_all(&gifts),
            earnings: PartnerEarningsResponse::from(&earnings),
        })
    }
}
