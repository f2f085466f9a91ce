pub mod jwt;
pub mod password;

use sqlx::PgPool;
use tracing::{info, warn};

use crate::api::dto::{JwtResponse, LoginRequest, RegisterRequest};
use crate::api::errors::ApiError;
use crate::cache::{keys, Cache};
use crate::db::models::User;

use jwt::{JwtKeys, TokenKind};

/// Credential checks and token issuing.
///
/// Login failures are always the same generic message so a caller cannot
/// tell an unknown username from a wrong password.
#[derive(Clone)]
pub struct AuthService {
    pool: PgPool,
    cache: Cache,
    jwt: JwtKeys,
}

const GENERIC_LOGIN_FAILURE: &str = "Invalid username or password";

impl AuthService {
    pub fn new(pool: PgPool, cache: Cache, jwt: JwtKeys) -> Self {
        Self { pool, cache, jwt }
    }

    pub async fn login(&self, req: LoginRequest) -> Result<JwtResponse, ApiError> {
        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = $1")
            .bind(&req.username)
            .fetch_optional(&self.pool)
            .await?;

        let user = match user {
            Some(user) if password::verify_password(&req.password, &user.password_hash) => user,
            _ => {
                warn!(username = %req.username, "login failed");
                return Err(ApiError::Unauthorized(GENERIC_LOGIN_FAILURE.to_owned()));
            }
        };

        info!(user_id = %user.id, "user authenticated");
        self.token_response(&user)
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<JwtResponse, ApiError> {
        validate_registration(&req)?;

        let username_taken: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
                .bind(&req.username)
                .fetch_one(&self.pool)
                .await?;
        if username_taken {
            return Err(ApiError::Conflict("Username is already taken".to_owned()));
        }

        let email_taken: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
                .bind(&req.email)
                .fetch_one(&self.pool)
                .await?;
        if email_taken {
            return Err(ApiError::Conflict("Email is already in use".to_owned()));
        }

        let password_hash = password::hash_password(&req.password)?;
        let user: User = sqlx::query_as(
            "INSERT INTO users (username, email, password_hash, first_name, last_name, roles) \
             VALUES ($1, $2, $3, $4, $5, '{USER}') \
             RETURNING *",
        )
        .bind(&req.username)
        .bind(&req.email)
        .bind(&password_hash)
        .bind(&req.first_name)
        .bind(&req.last_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ApiError::conflict_on_unique(e, "Username or email is already in use"))?;

        info!(user_id = %user.id, username = %user.username, "user registered");
        self.cache.evict(&keys::all_users()).await;

        self.token_response(&user)
    }

    /// Exchange a valid refresh token for a fresh token pair. The presented
    /// refresh token stays valid until its natural expiry; there is no
    /// revocation list.
    pub async fn refresh(&self, refresh_token: &str) -> Result<JwtResponse, ApiError> {
        let claims = self.jwt.verify(refresh_token, TokenKind::Refresh)?;

        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(claims.sub)
            .fetch_optional(&self.pool)
            .await?;
        let user = user
            .ok_or_else(|| ApiError::Unauthorized("Invalid or expired token".to_owned()))?;

        info!(user_id = %user.id, "access token refreshed");
        self.token_response(&user)
    }

    fn token_response(&self, user: &User) -> Result<JwtResponse, ApiError> {
        Ok(JwtResponse {
            token: self.jwt.issue_access(user)?,
            refresh_token: self.jwt.issue_refresh(user)?,
            token_type: "Bearer".to_owned(),
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            roles: user.roles.clone(),
        })
    }
}

fn validate_registration(req: &RegisterRequest) -> Result<(), ApiError> {
    let username_len = req.username.chars().count();
    if !(4..=20).contains(&username_len) {
        return Err(ApiError::Validation(
            "Username must be between 4 and 20 characters".to_owned(),
        ));
    }
    if req.password.chars().count() < 6 {
        return Err(ApiError::Validation(
            "Password must be at least 6 characters".to_owned(),
        ));
    }
    if !req.email.contains('@') {
        return Err(ApiError::Validation("Invalid email format".to_owned()));
    }
    if req.first_name.trim().is_empty() || req.last_name.trim().is_empty() {
        return Err(ApiError::Validation(
            "First and last name cannot be empty".to_owned(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> RegisterRequest {
        RegisterRequest {
            username: "alice".to_owned(),
            password: "hunter22".to_owned(),
            email: "alice@example.com".to_owned(),
            first_name: "Alice".to_owned(),
            last_name: "Smith".to_owned(),
        }
    }

    #[test]
    fn valid_registration_passes() {
        assert!(validate_registration(&valid_request()).is_ok());
    }

    #[test]
    fn short_username_rejected() {
        let mut req = valid_request();
        req.username = "abc".to_owned();
        assert!(matches!(
            validate_registration(&req),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn long_username_rejected() {
        let mut req = valid_request();
        req.username = "a".repeat(21);
        assert!(validate_registration(&req).is_err());
    }

    #[test]
    fn short_password_rejected() {
        let mut req = valid_request();
        req.password = "12345".to_owned();
        assert!(validate_registration(&req).is_err());
    }

    #[test]
    fn email_without_at_rejected() {
        let mut req = valid_request();
        req.email = "not-an-email".to_owned();
        assert!(validate_registration(&req).is_err());
    }

    #[test]
    fn blank_names_rejected() {
        let mut req = valid_request();
        req.first_name = "  ".to_owned();
        assert!(validate_registration(&req).is_err());
    }
}
