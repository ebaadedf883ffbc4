use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppResult;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatMessage {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub order_id: Uuid,
    pub body: String,
    pub is_read: bool,
    pub created_at: OffsetDateTime,
}

const MESSAGE_COLUMNS: &str = "id, sender_id, receiver_id, order_id, body, is_read, created_at";

pub async fn insert(
    db: &PgPool,
    sender_id: Uuid,
    receiver_id: Uuid,
    order_id: Uuid,
    body: &str,
) -> AppResult<ChatMessage> {
    let message = sqlx::query_as::<_, ChatMessage>(&format!(
        r#"
        INSERT INTO chat_messages (sender_id, receiver_id, order_id, body)
        VALUES ($1, $2, $3, $4)
        RETURNING {MESSAGE_COLUMNS}
        "#
    ))
    .bind(sender_id)
    .bind(receiver_id)
    .bind(order_id)
    .bind(body)
    .fetch_one(db)
    .await?;
    Ok(message)
}

/// Marks everything addressed to the reader as read. Runs in the same
/// transaction as the listing select so a concurrent reader never sees a
/// half-marked thread.
pub async fn mark_read_tx(
    tx: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
    receiver_id: Uuid,
) -> AppResult<u64> {
    let result = sqlx::query(
        "UPDATE chat_messages SET is_read = TRUE WHERE order_id = $1 AND receiver_id = $2 AND NOT is_read",
    )
    .bind(order_id)
    .bind(receiver_id)
    .execute(&mut **tx)
    .await?;
    Ok(result.rows_affected())
}

pub async fn list_by_order_tx(
    tx: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
) -> AppResult<Vec<ChatMessage>> {
    let messages = sqlx::query_as::<_, ChatMessage>(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM chat_messages WHERE order_id = $1 ORDER BY created_at ASC"
    ))
    .bind(order_id)
    .fetch_all(&mut **tx)
    .await?;
    Ok(messages)
}
