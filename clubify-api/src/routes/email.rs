/// `POST /api/send-email`: e-mail a lead or board member
///
/// The message leaves as "<caller> via Clubify" with `Reply-To` set to the
/// caller, through whichever [`Mailer`](clubify_shared::mail::Mailer) the
/// server was started with.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::extract::{is_blank, JsonBody},
};
use axum::{extract::State, Extension, Json};
use clubify_shared::{
    auth::identity::AuthContext,
    mail::{compose, Sender},
    models::user::{User, UserRole},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailRequest {
    pub recipient_id: Option<String>,

    #[validate(length(max = 200, message = "Subject must be at most 200 characters"))]
    pub subject: Option<String>,

    #[validate(length(max = 10000, message = "Message must be at most 10000 characters"))]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailRecipient {
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendEmailResponse {
    pub success: bool,
    pub message: String,
    pub recipient: EmailRecipient,
}

/// # Errors
///
/// - `400`: a field is missing, or the recipient is not a lead or board member
/// - `404`: no active user with that id
/// - `503`: the relay refused or could not be reached
pub async fn send_email(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    JsonBody(req): JsonBody<SendEmailRequest>,
) -> ApiResult<Json<SendEmailResponse>> {
    if is_blank(req.recipient_id.as_deref()) || is_blank(req.subject.as_deref()) || is_blank(req.message.as_deref()) {
        return Err(ApiError::BadRequest(
            "Recipient, subject, and message are required".to_string(),
        ));
    }

    req.validate()?;

    let (Some(recipient_id), Some(subject), Some(message)) = (req.recipient_id, req.subject, req.message) else {
        return Err(ApiError::BadRequest(
            "Recipient, subject, and message are required".to_string(),
        ));
    };

    let not_found = || ApiError::NotFound("Recipient not found".to_string());

    let recipient_id = Uuid::parse_str(recipient_id.trim()).map_err(|_| not_found())?;
    let recipient = User::find_by_id(&state.db, recipient_id)
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(not_found)?;

    if !recipient.role.is_officer() {
        return Err(ApiError::BadRequest(
            "Can only send emails to leads or board members".to_string(),
        ));
    }

    let email = compose(
        &Sender {
            name: auth.name.clone(),
            email: auth.email.clone(),
        },
        &recipient.email,
        subject.trim(),
        &message,
        &state.config.mail.from_address,
    );

    state.mailer.send(&email).await?;

    info!(
        sender = %auth.user_id,
        recipient = %recipient.id,
        mailer = state.mailer.name(),
        "E-mail relayed"
    );

    Ok(Json(SendEmailResponse {
        success: true,
        message: format!("Email sent successfully to {}", recipient.name),
        recipient: EmailRecipient {
            name: recipient.name,
            email: recipient.email,
            role: recipient.role,
        },
    }))
}
