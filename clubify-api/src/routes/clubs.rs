/// Club endpoints
///
/// - `GET /api/clubs`: active clubs with admin and members
/// - `POST /api/clubs`: create a club with the caller as admin (lead, board)
/// - `POST /api/clubs/:id/join`: add the caller as a member
/// - `POST /api/init-default-club`, `GET /api/default-club-id`: public
///   helpers for the fallback club

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::extract::{not_blank, Gate, IdPath, Officers, ValidJson},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use clubify_shared::{
    auth::identity::AuthContext,
    models::club::{Club, ClubCategory, ClubMemberRole, CreateClub},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateClubRequest {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 100, message = "Name must be 1-100 characters"),
        custom(function = "not_blank", message = "Name must not be blank")
    )]
    pub name: String,

    #[serde(default)]
    #[validate(
        length(min = 1, max = 1000, message = "Description must be 1-1000 characters"),
        custom(function = "not_blank", message = "Description must not be blank")
    )]
    pub description: String,

    pub category: Option<ClubCategory>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClubListResponse {
    pub success: bool,
    pub clubs: Vec<Club>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClubResponse {
    pub success: bool,
    pub message: String,
    pub club: Club,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultClubIdResponse {
    pub success: bool,
    pub club_id: Uuid,
}

pub async fn list_clubs(State(state): State<AppState>) -> ApiResult<Json<ClubListResponse>> {
    let clubs = Club::list_active(&state.db).await?;

    Ok(Json(ClubListResponse {
        success: true,
        clubs,
    }))
}

pub async fn create_club(
    State(state): State<AppState>,
    Gate(auth, _): Gate<Officers>,
    ValidJson(req): ValidJson<CreateClubRequest>,
) -> ApiResult<(StatusCode, Json<ClubResponse>)> {
    let club = Club::create(
        &state.db,
        CreateClub {
            name: req.name.trim().to_string(),
            description: req.description,
            category: req.category.unwrap_or_default(),
            admin_id: auth.user_id,
        },
    )
    .await?;

    info!(club_id = %club.id, admin = %auth.user_id, "Club created");

    Ok((
        StatusCode::CREATED,
        Json(ClubResponse {
            success: true,
            message: "Club created successfully".to_string(),
            club,
        }),
    ))
}

/// Joining twice is not an error; the original membership is kept
pub async fn join_club(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    IdPath(id): IdPath,
) -> ApiResult<Json<ClubResponse>> {
    let not_found = || ApiError::NotFound("Club not found".to_string());

    let club = Club::find_by_id(&state.db, id).await?.ok_or_else(not_found)?;
    if !club.is_active {
        return Err(not_found());
    }

    let joined = Club::add_member(&state.db, id, auth.user_id, ClubMemberRole::Member).await?;
    let message = if joined {
        info!(club_id = %id, user_id = %auth.user_id, "User joined club");
        "Joined club successfully"
    } else {
        "Already a member of this club"
    };

    let club = Club::find_by_id(&state.db, id).await?.ok_or_else(not_found)?;

    Ok(Json(ClubResponse {
        success: true,
        message: message.to_string(),
        club,
    }))
}

pub async fn init_default_club(State(state): State<AppState>) -> ApiResult<Json<ClubResponse>> {
    let id = Club::ensure_default(&state.db, None).await?;

    let club = Club::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::InternalError(format!("Default club {id} vanished after upsert")))?;

    Ok(Json(ClubResponse {
        success: true,
        message: "Default club initialized".to_string(),
        club,
    }))
}

pub async fn default_club_id(State(state): State<AppState>) -> ApiResult<Json<DefaultClubIdResponse>> {
    let club_id = Club::default_id(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Default club not found".to_string()))?;

    Ok(Json(DefaultClubIdResponse {
        success: true,
        club_id,
    }))
}
