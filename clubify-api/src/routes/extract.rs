/// Request extractors that reject with [`ApiError`]
///
/// axum's own extractors answer malformed input with plain-text bodies;
/// these wrappers keep every rejection in the JSON error format.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    Json,
};
use clubify_shared::{
    auth::{
        authorization::{require_role, OFFICERS},
        identity::{AuthContext, AuthError},
    },
    models::user::UserRole,
};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::error::ApiError;

/// JSON body, deserialized but not validated
///
/// Handlers that must report missing fields with a specific message check
/// presence first and call `validate()` themselves.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

        Ok(JsonBody(value))
    }
}

/// JSON body that has passed its `validator` rules
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let JsonBody(value) = JsonBody::<T>::from_request(req, state).await?;
        value.validate()?;

        Ok(ValidJson(value))
    }
}

/// Query string parameters
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

        Ok(QueryParams(value))
    }
}

/// Single `:id` path segment parsed as a UUID
pub struct IdPath(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for IdPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

        Uuid::parse_str(&raw)
            .map(IdPath)
            .map_err(|_| ApiError::BadRequest(format!("Invalid id '{raw}'")))
    }
}

/// Roles admitted by a [`Gate`]
pub trait RoleSet {
    const ROLES: &'static [UserRole];
}

/// Leads and board members
pub struct Officers;

impl RoleSet for Officers {
    const ROLES: &'static [UserRole] = &OFFICERS;
}

pub struct BoardOnly;

impl RoleSet for BoardOnly {
    const ROLES: &'static [UserRole] = &[UserRole::Board];
}

/// Caller that passed the role gate `R`
///
/// Reads the [`AuthContext`] left by the identity middleware. As a parts
/// extractor it runs before any body extractor, so callers without the
/// role get 403 whatever they sent.
pub struct Gate<R>(pub AuthContext, pub(crate) PhantomData<R>);

#[async_trait]
impl<R, S> FromRequestParts<S> for Gate<R>
where
    R: RoleSet + Send + Sync + 'static,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth = parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AuthError::MissingCredentials)?;

        require_role(&auth, R::ROLES)?;
        Ok(Gate(auth, PhantomData))
    }
}

/// `validator` rule rejecting strings that are empty after trimming
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// True for `None` and for strings that are empty after trimming
pub fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}
