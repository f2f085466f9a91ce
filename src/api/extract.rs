//! Caller identity, resolved from the `Authorization: Bearer` header.

use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use uuid::Uuid;

use crate::auth::jwt::{Claims, TokenKind};
use crate::AppState;

use super::errors::ApiError;

/// The authenticated caller. Extracting this in a handler is what makes a
/// route require authentication.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub claims: Claims,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_owned()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("Expected a bearer token".to_owned()))?;

        let claims = state.jwt.verify(token, TokenKind::Access)?;

        // A valid signature is not enough once the account is gone: tokens
        // of deleted accounts stop working before their natural expiry.
        if !state.users.exists(claims.sub).await? {
            return Err(ApiError::Unauthorized("Invalid or expired token".to_owned()));
        }

        Ok(AuthUser {
            id: claims.sub,
            claims,
        })
    }
}
