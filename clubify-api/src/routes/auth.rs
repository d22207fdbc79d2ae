/// Authentication endpoints
///
/// - `POST /api/auth/signup`: create an account
/// - `POST /api/auth/login`: check a password
/// - `GET /api/test-auth`: echo the resolved caller
///
/// Signup and login both return a bearer token. Clients that predate tokens
/// may keep sending the `user-id` header instead.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::extract::{is_blank, JsonBody},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::Duration;
use clubify_shared::{
    auth::{
        identity::{AuthContext, AuthError},
        jwt::{create_token, Claims},
        password,
    },
    models::user::{normalize_email, CreateUser, User, UserRole},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub password: Option<String>,

    /// Defaults to `member`
    pub role: Option<UserRole>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Caller as returned by the auth endpoints (`id` and `_id` both present)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,

    #[serde(rename = "_id")]
    pub object_id: Uuid,

    pub name: String,
    pub email: String,
    pub role: UserRole,
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            object_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

impl From<&AuthContext> for AuthUser {
    fn from(auth: &AuthContext) -> Self {
        Self {
            id: auth.user_id,
            object_id: auth.user_id,
            name: auth.name.clone(),
            email: auth.email.clone(),
            role: auth.role,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub success: bool,
    pub message: String,
    pub user: AuthUser,

    /// Bearer token for the `Authorization` header
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TestAuthResponse {
    pub success: bool,
    pub message: String,
    pub user: AuthUser,
}

fn issue_token(state: &AppState, user: &User) -> ApiResult<String> {
    let claims = Claims::new(
        user.id,
        user.role,
        Duration::hours(state.config.auth.token_ttl_hours),
    );

    Ok(create_token(&claims, &state.config.auth.jwt_secret)?)
}

/// Argon2 is deliberately slow; keep it off the async workers
async fn hash_blocking(plain: String) -> ApiResult<String> {
    tokio::task::spawn_blocking(move || password::hash_password(&plain))
        .await
        .map_err(|e| ApiError::InternalError(format!("Hashing task failed: {e}")))?
        .map_err(ApiError::from)
}

async fn verify_blocking(plain: String, hash: String) -> ApiResult<bool> {
    tokio::task::spawn_blocking(move || password::verify_password(&plain, &hash))
        .await
        .map_err(|e| ApiError::InternalError(format!("Verification task failed: {e}")))?
        .map_err(ApiError::from)
}

/// Register a new user
///
/// # Errors
///
/// - `400`: name, e-mail or password missing, or password too short
/// - `409`: e-mail already registered
/// - `422`: malformed e-mail or over-long name
pub async fn signup(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SignupRequest>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    if is_blank(req.name.as_deref()) || is_blank(req.email.as_deref()) || is_blank(req.password.as_deref()) {
        return Err(ApiError::BadRequest(
            "Name, email, and password are required".to_string(),
        ));
    }

    req.validate()?;

    let (Some(name), Some(email), Some(plain)) = (req.name, req.email, req.password) else {
        return Err(ApiError::BadRequest(
            "Name, email, and password are required".to_string(),
        ));
    };

    password::validate_password_length(&plain)?;

    let email = normalize_email(&email);
    if User::find_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::Conflict("User with this email already exists".to_string()));
    }

    let password_hash = hash_blocking(plain).await?;

    // A concurrent signup can still win the race; the unique index turns
    // that into a 409 as well
    let user = User::create(
        &state.db,
        CreateUser {
            name: name.trim().to_string(),
            email,
            password_hash,
            role: req.role.unwrap_or_default(),
        },
    )
    .await?;

    info!(user_id = %user.id, role = %user.role, "User signed up");

    let token = issue_token(&state, &user)?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            success: true,
            message: "User created successfully".to_string(),
            user: AuthUser::from(&user),
            token,
        }),
    ))
}

/// Log in with e-mail and password
///
/// Unknown e-mail and wrong password give the same 401.
pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let (Some(email), Some(plain)) = (req.email, req.password) else {
        return Err(ApiError::BadRequest("Email and password are required".to_string()));
    };
    if email.trim().is_empty() || plain.is_empty() {
        return Err(ApiError::BadRequest("Email and password are required".to_string()));
    }

    let invalid = || ApiError::Unauthorized("Invalid credentials".to_string());

    let Some(user) = User::find_by_email(&state.db, &email).await? else {
        warn!("Login attempt for unknown e-mail");
        return Err(invalid());
    };

    if !verify_blocking(plain, user.password_hash.clone()).await? {
        warn!(user_id = %user.id, "Login attempt with wrong password");
        return Err(invalid());
    }

    if !user.is_active {
        return Err(AuthError::InactiveUser.into());
    }

    User::update_last_login(&state.db, user.id).await?;
    info!(user_id = %user.id, role = %user.role, "User logged in");

    let token = issue_token(&state, &user)?;

    Ok(Json(SessionResponse {
        success: true,
        message: "Login successful".to_string(),
        user: AuthUser::from(&user),
        token,
    }))
}

pub async fn test_auth(Extension(auth): Extension<AuthContext>) -> Json<TestAuthResponse> {
    Json(TestAuthResponse {
        success: true,
        message: "Authentication working".to_string(),
        user: AuthUser::from(&auth),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_user_has_both_ids() {
        let auth = AuthContext {
            user_id: Uuid::new_v4(),
            name: "Lee".to_string(),
            email: "lee@example.com".to_string(),
            role: UserRole::Lead,
            method: clubify_shared::auth::identity::AuthMethod::Header,
        };

        let json = serde_json::to_value(AuthUser::from(&auth)).unwrap();
        assert_eq!(json["id"], json["_id"]);
        assert_eq!(json["role"], "lead");
    }

    #[test]
    fn test_signup_email_format_checked() {
        let req = SignupRequest {
            name: Some("Sam".to_string()),
            email: Some("not-an-email".to_string()),
            password: Some("password123".to_string()),
            role: None,
        };

        assert!(req.validate().is_err());
    }
}
