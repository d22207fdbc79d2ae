/// User directory
///
/// - `GET /api/users?role=`: active users by name (lead, board)
/// - `PUT /api/users/:id`: change role or active flag (board)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::extract::{BoardOnly, Gate, IdPath, Officers, QueryParams, ValidJson},
};
use axum::{extract::State, Json};
use clubify_shared::models::user::{UpdateUser, User, UserRole};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub role: Option<UserRole>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserListResponse {
    pub success: bool,
    pub users: Vec<User>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub success: bool,
    pub message: String,
    pub user: User,
}

pub async fn list_users(
    State(state): State<AppState>,
    _: Gate<Officers>,
    QueryParams(query): QueryParams<UserQuery>,
) -> ApiResult<Json<UserListResponse>> {
    let users = User::list_active(&state.db, query.role).await?;

    Ok(Json(UserListResponse {
        success: true,
        users,
    }))
}

pub async fn update_user(
    State(state): State<AppState>,
    Gate(auth, _): Gate<BoardOnly>,
    IdPath(id): IdPath,
    ValidJson(req): ValidJson<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    if id == auth.user_id && req.is_active == Some(false) {
        return Err(ApiError::BadRequest(
            "You cannot deactivate your own account".to_string(),
        ));
    }

    let user = User::update(
        &state.db,
        id,
        UpdateUser {
            role: req.role,
            is_active: req.is_active,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    info!(
        user_id = %user.id,
        role = %user.role,
        is_active = user.is_active,
        updated_by = %auth.user_id,
        "User updated"
    );

    Ok(Json(UserResponse {
        success: true,
        message: "User updated successfully".to_string(),
        user,
    }))
}
