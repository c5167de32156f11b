//! PostgreSQL implementation of HistoryStore.
//!
//! Tables (see `migrations/`):
//! - `msg_group (id, name, created_at)`
//! - `msg_group_member (group_id, user_id, joined_at)`
//! - `message (id, group_id, sender_id, content, status, created_at)`

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row};

use crate::domain::chat::{Message, MessageStatus, MsgGroup, MsgGroupMember, NewMessage};
use crate::domain::foundation::{DomainError, MessageId, RoomId, Timestamp, UserId};
use crate::ports::HistoryStore;

/// PostgreSQL implementation of HistoryStore.
#[derive(Clone)]
pub struct PostgresHistoryStore {
    pool: PgPool,
}

impl PostgresHistoryStore {
    /// Creates a new PostgresHistoryStore.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HistoryStore for PostgresHistoryStore {
    async fn create_message(&self, message: NewMessage) -> Result<Message, DomainError> {
        let row = sqlx::query(
            r#"
            INSERT INTO message (group_id, sender_id, content, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id, group_id, sender_id, content, status, created_at
            "#,
        )
        .bind(message.group_id.as_i64())
        .bind(message.sender_id.as_str())
        .bind(&message.content)
        .bind(MessageStatus::Active.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to insert message", e))?;

        row_to_message(&row)
    }

    async fn delete_message(
        &self,
        message_id: MessageId,
        group_id: RoomId,
        sender_id: &UserId,
    ) -> Result<u64, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE message SET status = $4
            WHERE id = $1 AND group_id = $2 AND sender_id = $3 AND status = $5
            "#,
        )
        .bind(message_id.as_i64())
        .bind(group_id.as_i64())
        .bind(sender_id.as_str())
        .bind(MessageStatus::Deleted.as_str())
        .bind(MessageStatus::Active.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to delete message", e))?;

        Ok(result.rows_affected())
    }

    async fn find_group(&self, group_id: RoomId) -> Result<Option<MsgGroup>, DomainError> {
        let row = sqlx::query("SELECT id, name, created_at FROM msg_group WHERE id = $1")
            .bind(group_id.as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to fetch group", e))?;

        row.as_ref().map(row_to_group).transpose()
    }

    async fn get_group_members(&self, group_id: RoomId) -> Result<Vec<MsgGroupMember>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT group_id, user_id, joined_at
            FROM msg_group_member
            WHERE group_id = $1
            ORDER BY joined_at
            "#,
        )
        .bind(group_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to fetch group members", e))?;

        rows.iter().map(row_to_member).collect()
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Row conversion
// ════════════════════════════════════════════════════════════════════════════════

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(name)
        .map_err(|e| DomainError::database(&format!("Failed to get {}", name), e))
}

fn user_id_column(row: &PgRow, name: &str) -> Result<UserId, DomainError> {
    let raw: String = column(row, name)?;
    UserId::new(raw).map_err(|e| DomainError::database(&format!("Invalid {}", name), e))
}

fn timestamp_column(row: &PgRow, name: &str) -> Result<Timestamp, DomainError> {
    let value: chrono::DateTime<chrono::Utc> = column(row, name)?;
    Ok(Timestamp::from_datetime(value))
}

fn row_to_message(row: &PgRow) -> Result<Message, DomainError> {
    let status: String = column(row, "status")?;
    Ok(Message {
        id: MessageId::new(column(row, "id")?),
        group_id: RoomId::new(column(row, "group_id")?),
        sender_id: user_id_column(row, "sender_id")?,
        content: column(row, "content")?,
        status: status
            .parse()
            .map_err(|e| DomainError::database("Invalid message status", e))?,
        created_at: timestamp_column(row, "created_at")?,
    })
}

fn row_to_group(row: &PgRow) -> Result<MsgGroup, DomainError> {
    Ok(MsgGroup {
        id: RoomId::new(column(row, "id")?),
        name: column(row, "name")?,
        created_at: timestamp_column(row, "created_at")?,
    })
}

fn row_to_member(row: &PgRow) -> Result<MsgGroupMember, DomainError> {
    Ok(MsgGroupMember {
        group_id: RoomId::new(column(row, "group_id")?),
        user_id: user_id_column(row, "user_id")?,
        joined_at: timestamp_column(row, "joined_at")?,
    })
}
