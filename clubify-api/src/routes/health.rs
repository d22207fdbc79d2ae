/// Service endpoints
///
/// - `GET /`: service banner
/// - `GET /health`: database connectivity
/// - fallback: JSON 404 for unknown routes

use crate::{app::AppState, error::ApiError};
use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use clubify_shared::db::pool;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy`, or `degraded` when the database is unreachable
    pub status: String,

    pub version: String,

    /// `connected` or `disconnected`
    pub database: String,

    pub timestamp: DateTime<Utc>,
}

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Clubify API Server is running!".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "active".to_string(),
    })
}

/// Reports `degraded` rather than failing so load balancers can tell the
/// process is up
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = match pool::health_check(&state.db).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach the database");
            false
        }
    };

    Json(HealthResponse {
        status: if connected { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if connected { "connected" } else { "disconnected" }.to_string(),
        timestamp: Utc::now(),
    })
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}
