//! HS256 token issuing and verification.

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::db::models::User;

/// Distinguishes short-lived access tokens from long-lived refresh tokens so
/// neither can stand in for the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: Uuid,
    pub username: String,
    pub email: String,
    pub roles: Vec<String>,
    pub kind: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl_secs: u64,
    refresh_ttl_secs: u64,
}

impl JwtKeys {
    pub fn new(secret: &str, access_ttl_secs: u64, refresh_ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    pub fn refresh_ttl_secs(&self) -> u64 {
        self.refresh_ttl_secs
    }

    pub fn issue_access(&self, user: &User) -> Result<String, ApiError> {
        self.issue(user, TokenKind::Access, self.access_ttl_secs)
    }

    pub fn issue_refresh(&self, user: &User) -> Result<String, ApiError> {
        self.issue(user, TokenKind::Refresh, self.refresh_ttl_secs)
    }

    fn issue(&self, user: &User, kind: TokenKind, ttl_secs: u64) -> Result<String, ApiError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            roles: user.roles.clone(),
            kind,
            iat: now,
            exp: now + ttl_secs as i64,
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(e.into()))
    }

    /// Verify signature and expiry and check the token is of `expected` kind.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, ApiError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_owned()))?;
        if data.claims.kind != expected {
            return Err(ApiError::Unauthorized("Invalid or expired token".to_owned()));
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "alice".to_owned(),
            email: "alice@example.com".to_owned(),
            password_hash: String::new(),
            first_name: "Alice".to_owned(),
            last_name: "Smith".to_owned(),
            roles: vec!["USER".to_owned()],
            created_at: Utc::now(),
        }
    }

    fn keys() -> JwtKeys {
        JwtKeys::new("test-secret", 3600, 604_800)
    }

    #[test]
    fn access_token_round_trips() {
        let user = test_user();
        let token = keys().issue_access(&user).unwrap();
        let claims = keys().verify(&token, TokenKind::Access).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.roles, vec!["USER"]);
        assert_eq!(claims.kind, TokenKind::Access);
    }

    #[test]
    fn refresh_token_cannot_be_used_as_access_token() {
        let user = test_user();
        let refresh = keys().issue_refresh(&user).unwrap();
        assert!(keys().verify(&refresh, TokenKind::Access).is_err());
        assert!(keys().verify(&refresh, TokenKind::Refresh).is_ok());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let user = test_user();
        let token = keys().issue_access(&user).unwrap();
        let other = JwtKeys::new("another-secret", 3600, 604_800);
        assert!(other.verify(&token, TokenKind::Access).is_err());
    }

    #[test]
    fn garbage_token_is_rejected() {
        let err = keys()
            .verify("not.a.token", TokenKind::Access)
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }
}
