//! Chat handlers

use axum::{extract::State, Json};
use peiplay_service::dto::{
    ChatMessageResponse, ChatRoomResponse, EnsureRoomRequest, FreeChatRequest,
    FreeChatRoomResponse, MarkReadRequest, MessagesQuery, SendMessageRequest, UnreadCountResponse,
};
use peiplay_service::services::ChatService;

use crate::extractors::{AuthUser, IdPath, OptionalValidatedJson, QueryParams, ValidatedJson};
use crate::response::{ApiResult, Created, NoContent};
use crate::state::AppState;

/// GET /chat/rooms
pub async fn rooms(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<ChatRoomResponse>>> {
    let response = ChatService::new(state.service_context())
        .rooms(auth.user_id)
        .await?;
    Ok(Json(response))
}

/// Get or create the room for a booking
///
/// POST /chat/rooms
pub async fn ensure_room(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<EnsureRoomRequest>,
) -> ApiResult<Json<ChatRoomResponse>> {
    let response = ChatService::new(state.service_context())
        .ensure_room(auth.user_id, request)
        .await?;
    Ok(Json(response))
}

/// POST /chat/rooms/free-chat
pub async fn free_chat(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<FreeChatRequest>,
) -> ApiResult<Json<FreeChatRoomResponse>> {
    let response = ChatService::new(state.service_context())
        .free_chat(auth.user_id, request)
        .await?;
    Ok(Json(response))
}

/// GET /chat/rooms/{room_id}/messages
pub async fn messages(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(room_id): IdPath,
    QueryParams(query): QueryParams<MessagesQuery>,
) -> ApiResult<Json<Vec<ChatMessageResponse>>> {
    let response = ChatService::new(state.service_context())
        .messages(auth.user_id, room_id, query)
        .await?;
    Ok(Json(response))
}

/// POST /chat/rooms/{room_id}/messages
pub async fn send(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(room_id): IdPath,
    ValidatedJson(request): ValidatedJson<SendMessageRequest>,
) -> ApiResult<Created<Json<ChatMessageResponse>>> {
    let response = ChatService::new(state.service_context())
        .send(auth.user_id, room_id, request)
        .await?;
    Ok(Created(Json(response)))
}

/// POST /chat/rooms/{room_id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(room_id): IdPath,
    OptionalValidatedJson(request): OptionalValidatedJson<MarkReadRequest>,
) -> ApiResult<NoContent> {
    ChatService::new(state.service_context())
        .mark_read(auth.user_id, room_id, request)
        .await?;
    Ok(NoContent)
}

/// GET /chat/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<UnreadCountResponse>> {
    let response = ChatService::new(state.service_context())
        .unread_count(auth.user_id)
        .await?;
    Ok(Json(response))
}
