/// Request identity
///
/// Turns request headers into an authenticated [`AuthContext`]. Two
/// credentials are understood, checked in this order:
///
/// 1. `Authorization: Bearer <jwt>` issued at login or signup
/// 2. `user-id: <id or e-mail>`, a plain identifier (when enabled)
///
/// A `user-id` value is looked up as a user id first and then as an e-mail
/// address. The plain header carries no proof of identity; deployments that
/// need one disable it and rely on tokens.
///
/// # Example
///
/// ```no_run
/// use axum::http::HeaderMap;
/// use clubify_shared::auth::identity::{authenticate, Credential};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, headers: HeaderMap) -> Result<(), Box<dyn std::error::Error>> {
/// let credential = Credential::from_headers(&headers, true)?;
/// let auth = authenticate(&pool, credential, "jwt-secret").await?;
/// println!("{} is a {}", auth.name, auth.role);
/// # Ok(())
/// # }
/// ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::jwt::{validate_token, JwtError};
use crate::models::{
    user::{User, UserRole},
    UserSummary,
};

/// Header carrying a plain user identifier
pub const USER_ID_HEADER: &str = "user-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    /// Signed bearer token
    Token,

    /// Plain `user-id` header
    Header,
}

/// Authenticated caller, stored in request extensions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub method: AuthMethod,
}

impl AuthContext {
    pub fn from_user(user: &User, method: AuthMethod) -> Self {
        Self {
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            method,
        }
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.user_id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Authentication required")]
    MissingCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Account is deactivated")]
    InactiveUser,

    #[error("{0}")]
    InvalidToken(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Credential found in a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    Bearer(String),
    UserId(String),
}

impl Credential {
    /// Picks the credential to use from the request headers
    ///
    /// A bearer token wins over a `user-id` header. The header is ignored
    /// when `allow_user_id_header` is false.
    pub fn from_headers(
        headers: &HeaderMap,
        allow_user_id_header: bool,
    ) -> Result<Self, AuthError> {
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty());

        if let Some(token) = bearer {
            return Ok(Credential::Bearer(token.to_string()));
        }

        if allow_user_id_header {
            let identifier = headers
                .get(USER_ID_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|id| !id.is_empty());

            if let Some(identifier) = identifier {
                return Ok(Credential::UserId(identifier.to_string()));
            }
        }

        Err(AuthError::MissingCredentials)
    }
}

/// Resolves a credential to an active user
pub async fn authenticate(
    pool: &PgPool,
    credential: Credential,
    jwt_secret: &str,
) -> Result<AuthContext, AuthError> {
    let (user, method) = match credential {
        Credential::Bearer(token) => {
            let claims = validate_token(&token, jwt_secret).map_err(|e| match e {
                JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
                _ => AuthError::InvalidToken("Invalid token".to_string()),
            })?;
            (User::find_by_id(pool, claims.sub).await?, AuthMethod::Token)
        }
        Credential::UserId(identifier) => (
            User::find_by_identifier(pool, &identifier).await?,
            AuthMethod::Header,
        ),
    };

    let user = user.ok_or(AuthError::UserNotFound)?;

    if !user.is_active {
        debug!(user_id = %user.id, "Rejected deactivated user");
        return Err(AuthError::InactiveUser);
    }

    Ok(AuthContext::from_user(&user, method))
}
