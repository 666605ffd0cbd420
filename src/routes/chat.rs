use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Multipart, Path, Query, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};
use validator::Validate;

use super::extract::ValidJson;
use crate::{
    auth::CurrentUser,
    db::{conversations, messages, properties, users},
    error::{AppError, AppResult},
    models::{Attachment, Conversation, MessageSender, MessageWithSender},
    state::AppState,
};

/// Multipart field carrying uploaded files
pub const UPLOAD_FIELD: &str = "files";

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest {
    pub participant2_id: Option<String>,
    pub property_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesQuery {
    pub conversation_id: Option<String>,
    /// Only return messages newer than this RFC 3339 instant
    pub after: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[validate(length(min = 1, message = "conversationId is required"))]
    pub conversation_id: String,
    #[validate(length(max = 5000, message = "Message is too long"))]
    pub content: Option<String>,
    #[serde(default)]
    #[validate(length(max = 10, message = "Too many attachments"))]
    pub attachments: Vec<Attachment>,
}

/// Load a conversation the caller takes part in
async fn participant_conversation(state: &AppState, id: &str, user_id: &str) -> AppResult<Conversation> {
    let conversation = conversations::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("Conversation not found"))?;

    if !conversation.has_participant(user_id) {
        return Err(AppError::Forbidden);
    }

    Ok(conversation)
}

fn parse_after(raw: Option<&str>) -> AppResult<Option<DateTime<Utc>>> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            DateTime::parse_from_rfc3339(s)
                .map(|d| d.with_timezone(&Utc))
                .map_err(|_| AppError::bad_request("Invalid after timestamp"))
        })
        .transpose()
}

#[tracing::instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list_conversations_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Value>> {
    let inbox = conversations::list_for_user(&state.db, &user.id).await?;

    Ok(Json(json!({ "conversations": inbox })))
}

/// Open a thread with another user, reusing one that already covers the same listing
#[tracing::instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn create_conversation_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ValidJson(body): ValidJson<CreateConversationRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let participant2_id = body
        .participant2_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("participant2Id is required"))?;

    if participant2_id == user.id {
        return Err(AppError::bad_request("Cannot start a conversation with yourself"));
    }

    if users::find_by_id(&state.db, &participant2_id).await?.is_none() {
        return Err(AppError::NotFound("User not found"));
    }

    let property_id = body.property_id.filter(|id| !id.trim().is_empty());
    if let Some(property_id) = property_id.as_deref() {
        if properties::find_by_id(&state.db, property_id).await?.is_none() {
            return Err(AppError::NotFound("Property not found"));
        }
    }

    let existing =
        conversations::find_between(&state.db, &user.id, &participant2_id, property_id.as_deref()).await?;

    let (status, conversation) = match existing {
        Some(conversation) => (StatusCode::OK, conversation),
        None => {
            let conversation =
                conversations::insert(&state.db, &user.id, &participant2_id, property_id.as_deref()).await?;
            info!(conversation_id = %conversation.id, "Conversation started");
            (StatusCode::CREATED, conversation)
        }
    };

    let detail = conversations::detail(&state.db, conversation).await?;

    Ok((status, Json(json!({ "conversation": detail }))))
}

#[tracing::instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn get_conversation_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let conversation = participant_conversation(&state, &id, &user.id).await?;

    let mut detail = conversations::detail(&state.db, conversation).await?;
    detail.current_user_id = Some(user.id);

    Ok(Json(json!({ "conversation": detail })))
}

/// Poll a thread. Reading marks the other party's returned messages as read.
#[tracing::instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list_messages_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<MessagesQuery>,
) -> AppResult<Json<Value>> {
    let conversation_id = query
        .conversation_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("Conversation ID is required"))?;
    let after = parse_after(query.after.as_deref())?;

    let conversation = participant_conversation(&state, &conversation_id, &user.id).await?;

    let messages = messages::list(&state.db, &conversation.id, after).await?;

    // Anything sent after this read stays unread until a later poll returns it
    if let Some(newest) = messages.last() {
        let marked =
            messages::mark_read(&state.db, &conversation.id, &user.id, newest.message.created_at).await?;
        if marked > 0 {
            debug!(marked, "Marked messages read");
        }
    }

    Ok(Json(json!({ "messages": messages })))
}

#[tracing::instrument(skip(state, user, body), fields(user_id = %user.id, conversation_id = %body.conversation_id))]
pub async fn send_message_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ValidJson(body): ValidJson<SendMessageRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let conversation = participant_conversation(&state, &body.conversation_id, &user.id).await?;

    let content = body.content.filter(|c| !c.trim().is_empty());
    if content.is_none() && body.attachments.is_empty() {
        return Err(AppError::bad_request("Message cannot be empty"));
    }

    let message = messages::insert(&state.db, &conversation.id, &user.id, content, body.attachments).await?;
    conversations::touch(&state.db, &conversation.id).await?;

    let message = MessageWithSender {
        sender: MessageSender {
            id: user.id,
            name: user.name,
        },
        message,
    };

    Ok((StatusCode::CREATED, Json(json!({ "message": message }))))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("File too large".to_string())
    } else {
        AppError::bad_request(err.body_text())
    }
}

/// Store every `files` part and describe them as message attachments
#[tracing::instrument(skip(state, user, multipart), fields(user_id = %user.id))]
pub async fn upload_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<Value>> {
    let mut multipart = multipart.map_err(|_| AppError::bad_request("No files provided"))?;
    let max_bytes = state.config.max_upload_bytes;

    let mut attachments = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("file").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;

        if bytes.len() > max_bytes {
            return Err(AppError::PayloadTooLarge(format!("{file_name} exceeds the upload limit")));
        }

        let stored = state.files.store(&file_name, &content_type, bytes).await?;
        attachments.push(Attachment {
            content_type: stored.content_type,
            url: stored.url,
            name: stored.name,
            size: stored.size,
        });
    }

    if attachments.is_empty() {
        return Err(AppError::bad_request("No files provided"));
    }

    info!(count = attachments.len(), "Files uploaded");

    Ok(Json(json!({ "attachments": attachments })))
}
