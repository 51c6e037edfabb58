//! Chat service
//!
//! One room per booking plus free-chat rooms between a user and a partner.
//! Members are the only readers and writers; new messages and read receipts
//! fan out over the room channel.

use chrono::Utc;
use peiplay_cache::PubSubChannel;
use peiplay_core::entities::{ChatMessage, ChatRoom};
use peiplay_core::events::{DomainEvent, MessageCreateEvent, MessagesReadEvent};
use peiplay_core::{DomainError, Snowflake};
use tracing::{debug, info, instrument, warn};

use crate::dto::{
    map_all, ChatMessageResponse, ChatRoomResponse, EnsureRoomRequest, FreeChatRequest,
    FreeChatRoomResponse, MarkReadRequest, MessagesQuery, SendMessageRequest, UnreadCountResponse,
};

use super::access::AccessService;
use super::context::ServiceContext;
use super::error::ServiceResult;

const DEFAULT_MESSAGE_PAGE: i64 = 50;
const MAX_MESSAGE_PAGE: i64 = 100;

fn message_page_size(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_MESSAGE_PAGE).clamp(1, MAX_MESSAGE_PAGE)
}

pub struct ChatService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ChatService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// The booking's room, created with both parties on first use
    #[instrument(skip(self, request), fields(booking_id = %request.booking_id))]
    pub async fn ensure_room(
        &self,
        user_id: Snowflake,
        request: EnsureRoomRequest,
    ) -> ServiceResult<ChatRoomResponse> {
        let booking = self
            .ctx
            .booking_repo()
            .find_by_id(request.booking_id)
            .await?
            .ok_or(DomainError::BookingNotFound(request.booking_id))?;

        if !booking.is_participant(user_id) && !AccessService::new(self.ctx).is_admin(user_id).await? {
            return Err(DomainError::Forbidden("not a party to this booking".to_string()).into());
        }

        let repo = self.ctx.chat_repo();
        if let Some(room) = repo.find_room_by_booking(booking.id).await? {
            return Ok(ChatRoomResponse::from(&room));
        }

        let room = ChatRoom::for_booking(self.ctx.generate_id(), booking.id);
        let room = repo
            .create_room(&room, &[booking.customer_user_id, booking.partner_user_id])
            .await?;

        info!(room_id = %room.id, booking_id = %booking.id, "Chat room created");
        Ok(ChatRoomResponse::from(&room))
    }

    /// The caller's booking-less room with a partner, created on first use
    #[instrument(skip(self, request), fields(partner_id = %request.partner_id))]
    pub async fn free_chat(
        &self,
        user_id: Snowflake,
        request: FreeChatRequest,
    ) -> ServiceResult<FreeChatRoomResponse> {
        let access = AccessService::new(self.ctx);
        access.require_active_user(user_id).await?;
        let partner = access.find_partner(request.partner_id).await?;
        if partner.user_id == user_id {
            return Err(DomainError::ValidationError("cannot chat with yourself".to_string()).into());
        }

        let repo = self.ctx.chat_repo();
        if let Some(room) = repo.find_free_room(user_id, partner.user_id).await? {
            return Ok(FreeChatRoomResponse {
                room: ChatRoomResponse::from(&room),
                created: false,
            });
        }

        let room = ChatRoom::free_chat(self.ctx.generate_id());
        let room = repo.create_room(&room, &[user_id, partner.user_id]).await?;

        info!(room_id = %room.id, partner_id = %partner.id, "Free chat room created");
        Ok(FreeChatRoomResponse {
            room: ChatRoomResponse::from(&room),
            created: true,
        })
    }

    /// The caller's rooms, most recently active first
    #[instrument(skip(self))]
    pub async fn rooms(&self, user_id: Snowflake) -> ServiceResult<Vec<ChatRoomResponse>> {
        let rooms = self.ctx.chat_repo().rooms_for_user(user_id).await?;
        Ok(map_all(&rooms))
    }

    #[instrument(skip(self, query))]
    pub async fn messages(
        &self,
        user_id: Snowflake,
        room_id: Snowflake,
        query: MessagesQuery,
    ) -> ServiceResult<Vec<ChatMessageResponse>> {
        self.require_member(room_id, user_id).await?;
        let messages = self
            .ctx
            .chat_repo()
            .messages(room_id, query.before, message_page_size(query.limit))
            .await?;
        Ok(map_all(&messages))
    }

    /// Post a message; free-chat rooms cap each sender
    #[instrument(skip(self, request), fields(room_id = %room_id, sender_id = %user_id))]
    pub async fn send(
        &self,
        user_id: Snowflake,
        room_id: Snowflake,
        request: SendMessageRequest,
    ) -> ServiceResult<ChatMessageResponse> {
        let room = self.require_member(room_id, user_id).await?;
        let sender = AccessService::new(self.ctx).require_active_user(user_id).await?;
        let repo = self.ctx.chat_repo();

        if room.is_free_chat() {
            let sent = repo.count_sent_by(room_id, user_id).await?;
            room.check_free_chat_quota(sent, self.ctx.platform().free_chat_message_limit)?;
        }

        let message = ChatMessage::compose(
            self.ctx.generate_id(),
            room_id,
            user_id,
            sender.name,
            &request.content,
        )?;
        repo.create_message(&message).await?;

        debug!(
            message_id = %message.id,
            moderation = message.moderation_status.as_str(),
            "Message stored"
        );

        let event = DomainEvent::MessageCreate(MessageCreateEvent {
            message_id: message.id,
            room_id,
            sender_id: user_id,
            sender_name: message.sender_name.clone(),
            content: message.content.clone(),
            timestamp: message.created_at,
        });
        if let Err(e) = self
            .ctx
            .publisher()
            .publish_domain_event(&[PubSubChannel::room(room_id)], &event)
            .await
        {
            warn!(message_id = %message.id, error = %e, "Failed to publish message");
        }

        self.invalidate_counterpart(&room, user_id).await;

        Ok(ChatMessageResponse::from(&message))
    }

    /// Record read receipts and move the member's read marker to now
    #[instrument(skip(self, request))]
    pub async fn mark_read(
        &self,
        user_id: Snowflake,
        room_id: Snowflake,
        request: MarkReadRequest,
    ) -> ServiceResult<()> {
        self.require_member(room_id, user_id).await?;

        let message_ids = request.message_ids.unwrap_or_default();
        let now = Utc::now();
        self.ctx
            .chat_repo()
            .mark_read(room_id, user_id, &message_ids, now)
            .await?;

        if let Err(e) = self.ctx.unread_counts().invalidate(user_id).await {
            warn!(user_id = %user_id, error = %e, "Failed to invalidate unread count");
        }

        let event = DomainEvent::MessagesRead(MessagesReadEvent {
            room_id,
            user_id,
            message_ids,
            timestamp: now,
        });
        if let Err(e) = self
            .ctx
            .publisher()
            .publish_domain_event(&[PubSubChannel::room(room_id)], &event)
            .await
        {
            warn!(room_id = %room_id, error = %e, "Failed to publish read receipts");
        }
        Ok(())
    }

    /// Unread messages across all rooms, served from a short-lived cache
    #[instrument(skip(self))]
    pub async fn unread_count(&self, user_id: Snowflake) -> ServiceResult<UnreadCountResponse> {
        let cache = self.ctx.unread_counts();
        match cache.get(user_id).await {
            Ok(Some(unread_count)) => return Ok(UnreadCountResponse { unread_count }),
            Ok(None) => {}
            Err(e) => warn!(user_id = %user_id, error = %e, "Unread cache read failed"),
        }

        let unread_count = self.ctx.chat_repo().unread_count(user_id).await?;
        if let Err(e) = cache.set(user_id, unread_count).await {
            warn!(user_id = %user_id, error = %e, "Unread cache write failed");
        }
        Ok(UnreadCountResponse { unread_count })
    }

    async fn require_member(&self, room_id: Snowflake, user_id: Snowflake) -> ServiceResult<ChatRoom> {
        let repo = self.ctx.chat_repo();
        let room = repo
            .find_room(room_id)
            .await?
            .ok_or(DomainError::ChatRoomNotFound(room_id))?;
        if repo.find_member(room_id, user_id).await?.is_none() {
            return Err(DomainError::NotRoomMember.into());
        }
        Ok(room)
    }

    /// Drop the cached unread counts of every other member
    async fn invalidate_counterpart(&self, room: &ChatRoom, sender_id: Snowflake) {
        let members = match self.ctx.chat_repo().member_ids(room.id).await {
            Ok(members) => members,
            Err(e) => {
                warn!(room_id = %room.id, error = %e, "Could not load room members");
                return;
            }
        };

        let others = other_members(members, sender_id);
        if let Err(e) = self.ctx.unread_counts().invalidate_many(&others).await {
            warn!(room_id = %room.id, error = %e, "Failed to invalidate unread counts");
        }
    }
}

fn other_members(members: Vec<Snowflake>, sender_id: Snowflake) -> Vec<Snowflake> {
    members.into_iter().filter(|id| *id != sender_id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_members_excludes_sender() {
        let members = vec![Snowflake::new(1), Snowflake::new(2), Snowflake::new(3)];
        assert_eq!(
            other_members(members, Snowflake::new(2)),
            vec![Snowflake::new(1), Snowflake::new(3)]
        );
        assert!(other_members(vec![Snowflake::new(4)], Snowflake::new(4)).is_empty());
    }

    #[test]
    fn test_message_page_size() {
        assert_eq!(message_page_size(None), DEFAULT_MESSAGE_PAGE);
        assert_eq!(message_page_size(Some(0)), 1);
        assert_eq!(message_page_size(Some(500)), MAX_MESSAGE_PAGE);
    }
}
