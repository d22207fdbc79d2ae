/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and the signup length rule
/// - [`jwt`]: HS256 access tokens issued at login and signup
/// - [`identity`]: Resolving request headers to an [`identity::AuthContext`]
/// - [`authorization`]: Role gates and ownership checks
///
/// # Example
///
/// ```no_run
/// use clubify_shared::auth::authorization::{require_role, OFFICERS};
/// use clubify_shared::auth::identity::{authenticate, Credential};
/// use axum::http::HeaderMap;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, headers: HeaderMap) -> Result<(), Box<dyn std::error::Error>> {
/// let auth = authenticate(&pool, Credential::from_headers(&headers, true)?, "secret").await?;
/// require_role(&auth, &OFFICERS)?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod identity;
pub mod jwt;
pub mod password;
