use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use sqlx::{FromRow, SqlitePool, types::Json};

use super::{messages, properties, users};
use crate::models::{Conversation, ConversationDetail, ConversationSummary, PropertySummary, UserSummary, new_id};

#[derive(FromRow)]
struct InboxRow {
    #[sqlx(flatten)]
    conversation: Conversation,
    p1_name: Option<String>,
    p1_email: String,
    p2_name: Option<String>,
    p2_email: String,
    property_title: Option<String>,
    property_images: Option<Json<Vec<String>>>,
    unread_count: i64,
}

#[tracing::instrument(skip(db))]
pub async fn find_by_id(db: &SqlitePool, id: &str) -> Result<Option<Conversation>> {
    sqlx::query_as::<_, Conversation>("SELECT * FROM conversations WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await
        .context("unable to fetch conversation")
}

/// Thread between the two users about the same listing, in either orientation.
/// A missing property only matches threads without one.
#[tracing::instrument(skip(db))]
pub async fn find_between(
    db: &SqlitePool,
    user_a: &str,
    user_b: &str,
    property_id: Option<&str>,
) -> Result<Option<Conversation>> {
    sqlx::query_as::<_, Conversation>(
        r#"
        SELECT * FROM conversations
        WHERE (
            (participant1_id = ? AND participant2_id = ?)
            OR (participant1_id = ? AND participant2_id = ?)
        )
        AND property_id IS ?
        ORDER BY created_at ASC
        LIMIT 1
        "#,
    )
    .bind(user_a)
    .bind(user_b)
    .bind(user_b)
    .bind(user_a)
    .bind(property_id)
    .fetch_optional(db)
    .await
    .context("unable to look up conversation")
}

#[tracing::instrument(skip(db))]
pub async fn insert(
    db: &SqlitePool,
    participant1_id: &str,
    participant2_id: &str,
    property_id: Option<&str>,
) -> Result<Conversation> {
    let now = Utc::now();

    sqlx::query_as::<_, Conversation>(
        r#"
        INSERT INTO conversations (id, participant1_id, participant2_id, property_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(new_id())
    .bind(participant1_id)
    .bind(participant2_id)
    .bind(property_id)
    .bind(now)
    .bind(now)
    .fetch_one(db)
    .await
    .context("unable to create conversation")
}

/// Bump the thread so it sorts first in both inboxes
#[tracing::instrument(skip(db))]
pub async fn touch(db: &SqlitePool, id: &str) -> Result<()> {
    sqlx::query("UPDATE conversations SET updated_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(id)
        .execute(db)
        .await
        .context("unable to touch conversation")?;

    Ok(())
}

/// Resolve participants and listing for a single conversation
#[tracing::instrument(skip(db, conversation), fields(conversation_id = %conversation.id))]
pub async fn detail(db: &SqlitePool, conversation: Conversation) -> Result<ConversationDetail> {
    let participant1 = users::find_summary(db, &conversation.participant1_id)
        .await?
        .ok_or_else(|| anyhow!("participant {} missing", conversation.participant1_id))?;
    let participant2 = users::find_summary(db, &conversation.participant2_id)
        .await?
        .ok_or_else(|| anyhow!("participant {} missing", conversation.participant2_id))?;

    let property = match conversation.property_id.as_deref() {
        Some(property_id) => properties::find_by_id(db, property_id)
            .await?
            .map(|p| p.summary()),
        None => None,
    };

    Ok(ConversationDetail {
        conversation,
        participant1,
        participant2,
        property,
        current_user_id: None,
    })
}

/// Inbox for a user: latest activity first, with last message and unread count
#[tracing::instrument(skip(db))]
pub async fn list_for_user(db: &SqlitePool, user_id: &str) -> Result<Vec<ConversationSummary>> {
    let rows = sqlx::query_as::<_, InboxRow>(
        r#"
        SELECT
            c.*,
            u1.name AS p1_name,
            u1.email AS p1_email,
            u2.name AS p2_name,
            u2.email AS p2_email,
            p.title AS property_title,
            p.images AS property_images,
            (
                SELECT COUNT(*) FROM messages m
                WHERE m.conversation_id = c.id
                  AND m.sender_id != ?
                  AND m.read_at IS NULL
            ) AS unread_count
        FROM conversations c
        JOIN users u1 ON u1.id = c.participant1_id
        JOIN users u2 ON u2.id = c.participant2_id
        LEFT JOIN properties p ON p.id = c.property_id
        WHERE c.participant1_id = ? OR c.participant2_id = ?
        ORDER BY c.updated_at DESC
        "#,
    )
    .bind(user_id)
    .bind(user_id)
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("unable to list conversations")?;

    let mut inbox = Vec::with_capacity(rows.len());

    for row in rows {
        let conversation = row.conversation;
        let last_message = messages::last_message(db, &conversation.id).await?;

        let property = match (&conversation.property_id, row.property_title) {
            (Some(id), Some(title)) => Some(PropertySummary {
                id: id.clone(),
                title,
                images: row.property_images.map(|images| images.0).unwrap_or_default(),
            }),
            _ => None,
        };

        inbox.push(ConversationSummary {
            participant1: UserSummary {
                id: conversation.participant1_id.clone(),
                name: row.p1_name,
                email: row.p1_email,
            },
            participant2: UserSummary {
                id: conversation.participant2_id.clone(),
                name: row.p2_name,
                email: row.p2_email,
            },
            property,
            last_message,
            updated_at: conversation.updated_at,
            unread_count: row.unread_count,
            id: conversation.id,
        });
    }

    Ok(inbox)
}
