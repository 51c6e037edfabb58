//! PostgreSQL implementation of ChatRepository

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use peiplay_core::entities::{ChatMember, ChatMessage, ChatRoom, ChatRoomSummary};
use peiplay_core::traits::{ChatRepository, RepoResult};
use peiplay_core::value_objects::Snowflake;

use crate::mappers::map_all;
use crate::models::{ChatMemberModel, ChatMessageModel, ChatRoomModel, ChatRoomSummaryModel};
use crate::resilience::DbResilience;

use super::error::map_db_error;

const ROOM_COLUMNS: &str = "id, room_type, booking_id, last_message_at, created_at";

const MESSAGE_COLUMNS: &str = r"
    id, room_id, sender_id, sender_name, content, message_type, status, moderation_status,
    created_at
";

/// Messages in room `r` that member `mem` (user `$1`) has not read yet
const UNREAD_FOR_MEMBER: &str = r"
    SELECT COUNT(*)
    FROM chat_messages m
    WHERE m.room_id = mem.room_id
      AND m.sender_id <> $1
      AND m.moderation_status <> 'REJECTED'
      AND (mem.last_read_at IS NULL OR m.created_at > mem.last_read_at)
      AND NOT EXISTS (
          SELECT 1 FROM message_read_receipts rr WHERE rr.message_id = m.id AND rr.user_id = $1
      )
";

#[derive(Clone)]
pub struct PgChatRepository {
    pool: PgPool,
    resilience: Arc<DbResilience>,
}

impl PgChatRepository {
    pub fn new(pool: PgPool, resilience: Arc<DbResilience>) -> Self {
        Self { pool, resilience }
    }

    async fn find_room_where(
        &self,
        op: &'static str,
        column: &'static str,
        id: Snowflake,
    ) -> RepoResult<Option<ChatRoom>> {
        let pool = &self.pool;
        let sql = format!("SELECT {ROOM_COLUMNS} FROM chat_rooms WHERE {column} = $1");
        let sql = sql.as_str();
        let row = self
            .resilience
            .run(op, || async move {
                sqlx::query_as::<_, ChatRoomModel>(sql)
                    .bind(id.into_inner())
                    .fetch_optional(pool)
                    .await
                    .map_err(map_db_error)
            })
            .await?;

        row.map(ChatRoom::try_from).transpose()
    }

    async fn create_room_in_tx(
        &self,
        room: &ChatRoom,
        members: &[Snowflake],
    ) -> RepoResult<ChatRoom> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let sql = format!(
            r"
            INSERT INTO chat_rooms (id, room_type, booking_id, last_message_at, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (booking_id) DO NOTHING
            RETURNING {ROOM_COLUMNS}
            "
        );
        let inserted = sqlx::query_as::<_, ChatRoomModel>(&sql)
            .bind(room.id.into_inner())
            .bind(room.room_type.as_str())
            .bind(room.booking_id.map(Snowflake::into_inner))
            .bind(room.last_message_at)
            .bind(room.created_at)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_db_error)?;

        let created = match inserted {
            Some(model) => model,
            None => {
                // Lost a race with another request for the same booking (free rooms never conflict)
                let sql = format!("SELECT {ROOM_COLUMNS} FROM chat_rooms WHERE booking_id = $1");
                let existing = sqlx::query_as::<_, ChatRoomModel>(&sql)
                    .bind(room.booking_id.map(Snowflake::into_inner))
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(map_db_error)?;
                tx.commit().await.map_err(map_db_error)?;
                return ChatRoom::try_from(existing);
            }
        };

        let member_ids: Vec<i64> = members.iter().map(|m| m.into_inner()).collect();
        sqlx::query(
            r"
            INSERT INTO chat_room_members (room_id, user_id)
            SELECT $1, member FROM UNNEST($2::BIGINT[]) AS member
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(created.id)
        .bind(&member_ids)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;
        ChatRoom::try_from(created)
    }

    async fn create_message_in_tx(&self, message: &ChatMessage) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        sqlx::query(
            r"
            INSERT INTO chat_messages (id, room_id, sender_id, sender_name, content, message_type,
                                       status, moderation_status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(message.id.into_inner())
        .bind(message.room_id.into_inner())
        .bind(message.sender_id.into_inner())
        .bind(&message.sender_name)
        .bind(&message.content)
        .bind(message.message_type.as_str())
        .bind(message.status.as_str())
        .bind(message.moderation_status.as_str())
        .bind(message.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        sqlx::query("UPDATE chat_rooms SET last_message_at = $2 WHERE id = $1")
            .bind(message.room_id.into_inner())
            .bind(message.created_at)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)
    }

    async fn mark_read_in_tx(
        &self,
        room_id: Snowflake,
        user_id: Snowflake,
        message_ids: &[Snowflake],
        now: DateTime<Utc>,
    ) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        sqlx::query(
            "UPDATE chat_room_members SET last_read_at = $3 WHERE room_id = $1 AND user_id = $2",
        )
        .bind(room_id.into_inner())
        .bind(user_id.into_inner())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        if !message_ids.is_empty() {
            let ids: Vec<i64> = message_ids.iter().map(|id| id.into_inner()).collect();

            sqlx::query(
                r"
                INSERT INTO message_read_receipts (message_id, user_id, read_at)
                SELECT m.id, $2, $3
                FROM chat_messages m
                WHERE m.room_id = $1 AND m.id = ANY($4)
                ON CONFLICT (message_id, user_id) DO UPDATE SET read_at = EXCLUDED.read_at
                ",
            )
            .bind(room_id.into_inner())
            .bind(user_id.into_inner())
            .bind(now)
            .bind(&ids)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

            sqlx::query(
                r"
                UPDATE chat_messages SET status = 'READ'
                WHERE room_id = $1 AND id = ANY($3) AND sender_id <> $2
                ",
            )
            .bind(room_id.into_inner())
            .bind(user_id.into_inner())
            .bind(&ids)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        }

        tx.commit().await.map_err(map_db_error)
    }
}

#[async_trait]
impl ChatRepository for PgChatRepository {
    #[instrument(skip(self))]
    async fn find_room(&self, id: Snowflake) -> RepoResult<Option<ChatRoom>> {
        self.find_room_where("chat.find_room", "id", id).await
    }

    #[instrument(skip(self))]
    async fn find_room_by_booking(&self, booking_id: Snowflake) -> RepoResult<Option<ChatRoom>> {
        self.find_room_where("chat.find_room_by_booking", "booking_id", booking_id)
            .await
    }

    #[instrument(skip(self))]
    async fn find_free_room(&self, a: Snowflake, b: Snowflake) -> RepoResult<Option<ChatRoom>> {
        let pool = &self.pool;
        let sql = format!(
            r"
            SELECT {ROOM_COLUMNS}
            FROM chat_rooms r
            WHERE r.booking_id IS NULL
              AND r.room_type = 'ONE_ON_ONE'
              AND (
                  SELECT array_agg(m.user_id ORDER BY m.user_id)
                  FROM chat_room_members m
                  WHERE m.room_id = r.id
              ) = $1
            ORDER BY r.created_at
            LIMIT 1
            "
        );
        let sql = sql.as_str();
        let mut pair = [a.into_inner(), b.into_inner()];
        pair.sort_unstable();
        let pair = pair.as_slice();
        let row = self
            .resilience
            .run("chat.find_free_room", || async move {
                sqlx::query_as::<_, ChatRoomModel>(sql)
                    .bind(pair)
                    .fetch_optional(pool)
                    .await
                    .map_err(map_db_error)
            })
            .await?;

        row.map(ChatRoom::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn member_ids(&self, room_id: Snowflake) -> RepoResult<Vec<Snowflake>> {
        let pool = &self.pool;
        let ids = self
            .resilience
            .run("chat.member_ids", || async move {
                sqlx::query_scalar::<_, i64>(
                    "SELECT user_id FROM chat_room_members WHERE room_id = $1 ORDER BY user_id",
                )
                .bind(room_id.into_inner())
                .fetch_all(pool)
                .await
                .map_err(map_db_error)
            })
            .await?;

        Ok(ids.into_iter().map(Snowflake::new).collect())
    }

    #[instrument(skip(self, room), fields(room_id = %room.id))]
    async fn create_room(&self, room: &ChatRoom, members: &[Snowflake]) -> RepoResult<ChatRoom> {
        self.resilience
            .guard("chat.create_room", self.create_room_in_tx(room, members))
            .await
    }

    #[instrument(skip(self))]
    async fn find_member(
        &self,
        room_id: Snowflake,
        user_id: Snowflake,
    ) -> RepoResult<Option<ChatMember>> {
        let pool = &self.pool;
        let row = self
            .resilience
            .run("chat.find_member", || async move {
                sqlx::query_as::<_, ChatMemberModel>(
                    r"
                    SELECT room_id, user_id, joined_at, last_read_at
                    FROM chat_room_members
                    WHERE room_id = $1 AND user_id = $2
                    ",
                )
                .bind(room_id.into_inner())
                .bind(user_id.into_inner())
                .fetch_optional(pool)
                .await
                .map_err(map_db_error)
            })
            .await?;

        Ok(row.map(ChatMember::from))
    }

    #[instrument(skip(self))]
    async fn rooms_for_user(&self, user_id: Snowflake) -> RepoResult<Vec<ChatRoomSummary>> {
        let pool = &self.pool;
        let sql = format!(
            r"
            SELECT r.id, r.room_type, r.booking_id, r.last_message_at, r.created_at,
                   ({UNREAD_FOR_MEMBER}) AS unread_count
            FROM chat_rooms r
            JOIN chat_room_members mem ON mem.room_id = r.id AND mem.user_id = $1
            ORDER BY r.last_message_at DESC NULLS LAST, r.created_at DESC
            "
        );
        let sql = sql.as_str();
        let rows = self
            .resilience
            .run("chat.rooms_for_user", || async move {
                sqlx::query_as::<_, ChatRoomSummaryModel>(sql)
                    .bind(user_id.into_inner())
                    .fetch_all(pool)
                    .await
                    .map_err(map_db_error)
            })
            .await?;

        map_all(rows)
    }

    #[instrument(skip(self))]
    async fn messages(
        &self,
        room_id: Snowflake,
        before: Option<Snowflake>,
        limit: i64,
    ) -> RepoResult<Vec<ChatMessage>> {
        let pool = &self.pool;
        let sql = format!(
            r"
            SELECT {MESSAGE_COLUMNS}
            FROM chat_messages
            WHERE room_id = $1
              AND moderation_status <> 'REJECTED'
              AND ($2::BIGINT IS NULL OR id < $2)
            ORDER BY id DESC
            LIMIT $3
            "
        );
        let sql = sql.as_str();
        let before = before.map(Snowflake::into_inner);
        let rows = self
            .resilience
            .run("chat.messages", || async move {
                sqlx::query_as::<_, ChatMessageModel>(sql)
                    .bind(room_id.into_inner())
                    .bind(before)
                    .bind(limit)
                    .fetch_all(pool)
                    .await
                    .map_err(map_db_error)
            })
            .await?;

        map_all(rows)
    }

    #[instrument(skip(self))]
    async fn count_sent_by(&self, room_id: Snowflake, sender_id: Snowflake) -> RepoResult<i64> {
        let pool = &self.pool;
        self.resilience
            .run("chat.count_sent_by", || async move {
                sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM chat_messages WHERE room_id = $1 AND sender_id = $2",
                )
                .bind(room_id.into_inner())
                .bind(sender_id.into_inner())
                .fetch_one(pool)
                .await
                .map_err(map_db_error)
            })
            .await
    }

    #[instrument(skip(self, message), fields(room_id = %message.room_id, message_id = %message.id))]
    async fn create_message(&self, message: &ChatMessage) -> RepoResult<()> {
        self.resilience
            .guard("chat.create_message", self.create_message_in_tx(message))
            .await
    }

    #[instrument(skip(self, message_ids), fields(count = message_ids.len()))]
    async fn mark_read(
        &self,
        room_id: Snowflake,
        user_id: Snowflake,
        message_ids: &[Snowflake],
        now: DateTime<Utc>,
    ) -> RepoResult<()> {
        self.resilience
            .guard(
                "chat.mark_read",
                self.mark_read_in_tx(room_id, user_id, message_ids, now),
            )
            .await
    }

    #[instrument(skip(self))]
    async fn unread_count(&self, user_id: Snowflake) -> RepoResult<i64> {
        let pool = &self.pool;
        let sql = format!(
            r"
            SELECT COALESCE(SUM(({UNREAD_FOR_MEMBER})), 0)::BIGINT
            FROM chat_room_members mem
            WHERE mem.user_id = $1
            "
        );
        let sql = sql.as_str();
        self.resilience
            .run("chat.unread_count", || async move {
                sqlx::query_scalar::<_, i64>(sql)
                    .bind(user_id.into_inner())
                    .fetch_one(pool)
                    .await
                    .map_err(map_db_error)
            })
            .await
    }
}
