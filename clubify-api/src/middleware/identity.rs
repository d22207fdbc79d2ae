/// Identity middleware
///
/// Resolves the caller from the request headers and stores the resulting
/// [`AuthContext`] in the request extensions. Requests without a usable
/// identity are rejected with 401 before reaching a handler.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use clubify_shared::auth::identity::{authenticate, AuthContext, Credential};
use tracing::debug;

use crate::{app::AppState, error::ApiError};

pub async fn require_identity(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let credential = Credential::from_headers(req.headers(), state.config.auth.allow_header_identity)?;

    let auth: AuthContext = authenticate(&state.db, credential, &state.config.auth.jwt_secret).await?;

    debug!(
        user_id = %auth.user_id,
        role = %auth.role,
        method = ?auth.method,
        "Authenticated request"
    );

    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}
