//! Chat mappers

use peiplay_core::{
    ChatMember, ChatMessage, ChatRoom, ChatRoomSummary, ChatRoomType, DomainError, MessageStatus,
    MessageType, ModerationStatus, Snowflake,
};

use super::parse_column;
use crate::models::{ChatMemberModel, ChatMessageModel, ChatRoomModel, ChatRoomSummaryModel};

impl TryFrom<ChatRoomModel> for ChatRoom {
    type Error = DomainError;

    fn try_from(model: ChatRoomModel) -> Result<Self, Self::Error> {
        Ok(ChatRoom {
            id: Snowflake::new(model.id),
            room_type: parse_column(&model.room_type, "chat_rooms.room_type", ChatRoomType::parse)?,
            booking_id: model.booking_id.map(Snowflake::new),
            last_message_at: model.last_message_at,
            created_at: model.created_at,
        })
    }
}

impl TryFrom<ChatRoomSummaryModel> for ChatRoomSummary {
    type Error = DomainError;

    fn try_from(model: ChatRoomSummaryModel) -> Result<Self, Self::Error> {
        let room = ChatRoom::try_from(ChatRoomModel {
            id: model.id,
            room_type: model.room_type,
            booking_id: model.booking_id,
            last_message_at: model.last_message_at,
            created_at: model.created_at,
        })?;
        Ok(ChatRoomSummary {
            room,
            unread_count: model.unread_count,
        })
    }
}

impl From<ChatMemberModel> for ChatMember {
    fn from(model: ChatMemberModel) -> Self {
        ChatMember {
            room_id: Snowflake::new(model.room_id),
            user_id: Snowflake::new(model.user_id),
            joined_at: model.joined_at,
            last_read_at: model.last_read_at,
        }
    }
}

impl TryFrom<ChatMessageModel> for ChatMessage {
    type Error = DomainError;

    fn try_from(model: ChatMessageModel) -> Result<Self, Self::Error> {
        Ok(ChatMessage {
            id: Snowflake::new(model.id),
            room_id: Snowflake::new(model.room_id),
            sender_id: Snowflake::new(model.sender_id),
            sender_name: model.sender_name,
            content: model.content,
            message_type: parse_column(
                &model.message_type,
                "chat_messages.message_type",
                MessageType::parse,
            )?,
            status: parse_column(&model.status, "chat_messages.status", MessageStatus::parse)?,
            moderation_status: parse_column(
                &model.moderation_status,
                "chat_messages.moderation_status",
                ModerationStatus::parse,
            )?,
            created_at: model.created_at,
        })
    }
}
