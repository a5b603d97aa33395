//! Caller identity from request headers.
//!
//! Sessions are handled by the platform in front of this service, which
//! forwards the authenticated user and organization as headers.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const ORGANIZATION_ID_HEADER: &str = "x-organization-id";

fn uuid_header(headers: &HeaderMap, name: &str) -> Result<Uuid, ApiError> {
    let value = headers
        .get(name)
        .ok_or_else(|| ApiError::Unauthorized(format!("Missing {} header", name)))?;
    value
        .to_str()
        .ok()
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid {} header", name)))
}

/// The authenticated user making the request.
#[derive(Debug, Clone, Copy)]
pub struct Actor(pub Uuid);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Actor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        uuid_header(&parts.headers, USER_ID_HEADER).map(Actor)
    }
}

/// The organization the request acts within.
#[derive(Debug, Clone, Copy)]
pub struct Organization(pub Uuid);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Organization {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        uuid_header(&parts.headers, ORGANIZATION_ID_HEADER).map(Organization)
    }
}

/// Check `Authorization: Bearer <secret>` against the configured cron secret.
///
/// With no secret configured every call is refused.
pub fn verify_cron_secret(headers: &HeaderMap, expected: Option<&str>) -> Result<(), ApiError> {
    let expected = expected
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Cron secret not configured".to_string()))?;
    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

    let matches: bool = provided
        .trim()
        .as_bytes()
        .ct_eq(expected.as_bytes())
        .into();
    if matches {
        Ok(())
    } else {
        Err(ApiError::Unauthorized("Invalid cron secret".to_string()))
    }
}
