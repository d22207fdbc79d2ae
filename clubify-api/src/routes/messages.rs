/// Internal messaging
///
/// - `GET /api/messages?type=sent`: sent by the caller; otherwise received
/// - `POST /api/messages`: send with the caller as sender
/// - `PUT /api/messages/:id/read`: mark read (recipient only)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::extract::{not_blank, IdPath, QueryParams, ValidJson},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use clubify_shared::{
    auth::{authorization::require_participant, identity::AuthContext},
    models::{
        club::{Club, ClubRef},
        message::{CreateMessage, Mailbox, Message},
        Priority,
    },
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(required(message = "recipient is required"))]
    pub recipient: Option<Uuid>,

    pub club: Option<ClubRef>,

    #[serde(default)]
    #[validate(
        length(min = 1, max = 200, message = "Subject must be 1-200 characters"),
        custom(function = "not_blank", message = "Subject must not be blank")
    )]
    pub subject: String,

    #[serde(default)]
    #[validate(
        length(min = 1, max = 10000, message = "Content must be 1-10000 characters"),
        custom(function = "not_blank", message = "Content must not be blank")
    )]
    pub content: String,

    pub priority: Option<Priority>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageListResponse {
    pub success: bool,
    pub messages: Vec<Message>,
}

/// `message` carries the status text, so the record goes under `data`
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
    pub data: Message,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AckResponse {
    pub success: bool,
    pub message: String,
}

pub async fn list_messages(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    QueryParams(query): QueryParams<MessageQuery>,
) -> ApiResult<Json<MessageListResponse>> {
    let mailbox = Mailbox::from_query(query.kind.as_deref());
    let messages = Message::list_for(&state.db, auth.user_id, mailbox).await?;

    Ok(Json(MessageListResponse {
        success: true,
        messages,
    }))
}

pub async fn send_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidJson(req): ValidJson<SendMessageRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let recipient_id = req
        .recipient
        .ok_or_else(|| ApiError::invalid_field("recipient", "recipient is required"))?;

    let club_id = Club::resolve(&state.db, req.club.unwrap_or_default(), auth.user_id).await?;

    let message = Message::create(
        &state.db,
        CreateMessage {
            sender_id: auth.user_id,
            recipient_id,
            club_id,
            subject: req.subject.trim().to_string(),
            content: req.content,
            priority: req.priority.unwrap_or_default(),
        },
    )
    .await?;

    info!(message_id = %message.id, sender = %auth.user_id, recipient = %recipient_id, "Message sent");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            success: true,
            message: "Message sent successfully".to_string(),
            data: message,
        }),
    ))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    IdPath(id): IdPath,
) -> ApiResult<Json<AckResponse>> {
    let not_found = || ApiError::NotFound("Message not found".to_string());

    let recipient = Message::recipient_of(&state.db, id).await?.ok_or_else(not_found)?;

    require_participant(&auth, &[recipient], "Not authorized to mark this message as read")?;

    if !Message::mark_read(&state.db, id).await? {
        return Err(not_found());
    }

    debug!(message_id = %id, user_id = %auth.user_id, "Message marked as read");

    Ok(Json(AckResponse {
        success: true,
        message: "Message marked as read".to_string(),
    }))
}
