/// Role gates and ownership checks
///
/// Handlers call these after authentication. Both return [`AuthzError`],
/// which the API maps to 403.
///
/// # Example
///
/// ```
/// use clubify_shared::auth::authorization::{require_role, OFFICERS};
/// use clubify_shared::auth::identity::{AuthContext, AuthMethod};
/// use clubify_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// let member = AuthContext {
///     user_id: Uuid::new_v4(),
///     name: "Sam".to_string(),
///     email: "sam@example.com".to_string(),
///     role: UserRole::Member,
///     method: AuthMethod::Header,
/// };
///
/// let err = require_role(&member, &OFFICERS).unwrap_err();
/// assert_eq!(
///     err.to_string(),
///     "Insufficient permissions. Required: lead or board, Current: member"
/// );
/// ```

use uuid::Uuid;

use super::identity::AuthContext;
use crate::models::user::UserRole;

/// Leads and board members
pub const OFFICERS: [UserRole; 2] = [UserRole::Lead, UserRole::Board];

#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    #[error("Insufficient permissions. Required: {required}, Current: {actual}")]
    InsufficientRole { required: String, actual: UserRole },

    /// Caller is not one of the record's participants
    #[error("{0}")]
    NotParticipant(&'static str),
}

/// Joins roles for display: `lead or board`
pub fn describe_roles(roles: &[UserRole]) -> String {
    roles
        .iter()
        .map(UserRole::as_str)
        .collect::<Vec<_>>()
        .join(" or ")
}

pub fn require_role(auth: &AuthContext, allowed: &[UserRole]) -> Result<(), AuthzError> {
    if allowed.contains(&auth.role) {
        return Ok(());
    }

    Err(AuthzError::InsufficientRole {
        required: describe_roles(allowed),
        actual: auth.role,
    })
}

/// Passes if the caller is one of `participants`
///
/// `denial` is the message returned otherwise, e.g.
/// "Not authorized to update this task".
pub fn require_participant(
    auth: &AuthContext,
    participants: &[Uuid],
    denial: &'static str,
) -> Result<(), AuthzError> {
    if participants.contains(&auth.user_id) {
        Ok(())
    } else {
        Err(AuthzError::NotParticipant(denial))
    }
}
