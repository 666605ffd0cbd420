use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool, types::Json};

use crate::models::{Attachment, LastMessage, Message, MessageSender, MessageWithSender, new_id};

#[derive(FromRow)]
struct MessageRow {
    #[sqlx(flatten)]
    message: Message,
    sender_name: Option<String>,
}

#[tracing::instrument(skip(db, content, attachments))]
pub async fn insert(
    db: &SqlitePool,
    conversation_id: &str,
    sender_id: &str,
    content: Option<String>,
    attachments: Vec<Attachment>,
) -> Result<Message> {
    sqlx::query_as::<_, Message>(
        r#"
        INSERT INTO messages (id, conversation_id, sender_id, content, attachments, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(new_id())
    .bind(conversation_id)
    .bind(sender_id)
    .bind(content)
    .bind(Json(attachments))
    .bind(Utc::now())
    .fetch_one(db)
    .await
    .context("unable to create message")
}

/// Messages oldest first. `after` limits the result to what a poller has not seen yet.
#[tracing::instrument(skip(db))]
pub async fn list(
    db: &SqlitePool,
    conversation_id: &str,
    after: Option<DateTime<Utc>>,
) -> Result<Vec<MessageWithSender>> {
    let rows = sqlx::query_as::<_, MessageRow>(
        r#"
        SELECT m.*, u.name AS sender_name
        FROM messages m
        JOIN users u ON u.id = m.sender_id
        WHERE m.conversation_id = ?
          AND (? IS NULL OR m.created_at > ?)
        ORDER BY m.created_at ASC, m.rowid ASC
        "#,
    )
    .bind(conversation_id)
    .bind(after)
    .bind(after)
    .fetch_all(db)
    .await
    .context("unable to list messages")?;

    Ok(rows
        .into_iter()
        .map(|row| MessageWithSender {
            sender: MessageSender {
                id: row.message.sender_id.clone(),
                name: row.sender_name,
            },
            message: row.message,
        })
        .collect())
}

/// Stamp what the other party sent up to `up_to` as read by `reader_id`
#[tracing::instrument(skip(db))]
pub async fn mark_read(
    db: &SqlitePool,
    conversation_id: &str,
    reader_id: &str,
    up_to: DateTime<Utc>,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE messages SET read_at = ?
        WHERE conversation_id = ? AND sender_id != ? AND read_at IS NULL AND created_at <= ?
        "#,
    )
    .bind(Utc::now())
    .bind(conversation_id)
    .bind(reader_id)
    .bind(up_to)
    .execute(db)
    .await
    .context("unable to mark messages read")?;

    Ok(result.rows_affected())
}

#[tracing::instrument(skip(db))]
pub async fn last_message(db: &SqlitePool, conversation_id: &str) -> Result<Option<LastMessage>> {
    let message = sqlx::query_as::<_, Message>(
        r#"
        SELECT * FROM messages
        WHERE conversation_id = ?
        ORDER BY created_at DESC, rowid DESC
        LIMIT 1
        "#,
    )
    .bind(conversation_id)
    .fetch_optional(db)
    .await
    .context("unable to fetch last message")?;

    Ok(message.map(|m| LastMessage {
        content: m.content,
        created_at: m.created_at,
        sender_id: m.sender_id,
    }))
}
