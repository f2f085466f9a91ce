use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

/// Error taxonomy for every request path.
///
/// Not-found and ownership violations are deliberately the same variant so a
/// caller can never distinguish "does not exist" from "belongs to someone
/// else". Cache failures never reach this type; the cache layer swallows
/// them.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Maps a duplicate-key store error to `Conflict` with the given message.
    /// Anything else keeps the default mapping. Uniqueness is pre-checked on
    /// the hot paths, but a concurrent insert can still trip the constraint.
    pub fn conflict_on_unique(e: sqlx::Error, message: &str) -> Self {
        if let Some(db_err) = e.as_database_error() {
            if db_err.is_unique_violation() {
                return ApiError::Conflict(message.to_owned());
            }
        }
        e.into()
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_owned()),
            other => ApiError::Internal(other.into()),
        }
    }
}

/// Uniform error envelope returned for every failed request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub status: u16,
    pub message: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            // Internal causes are logged, never surfaced.
            ApiError::Internal(e) => {
                error!(error = %e, "internal error");
                "Internal server error".to_owned()
            }
            other => other.to_string(),
        };
        let body = Json(ErrorResponse {
            status: status.as_u16(),
            message,
            timestamp: chrono::Utc::now(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_map_to_expected_status_codes() {
        assert_eq!(
            ApiError::Validation("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound("gone".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Conflict("dup".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Unauthorized("no".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn row_not_found_becomes_not_found() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn internal_message_is_generic() {
        let resp = ApiError::Internal(anyhow::anyhow!("secret database detail")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn unique_violation_maps_to_conflict(pool: sqlx::PgPool) {
        let insert = "INSERT INTO users (username, email, password_hash, first_name, last_name) \
                      VALUES ('alice', $1, 'x', 'Alice', 'Smith')";
        sqlx::query(insert)
            .bind("alice@example.com")
            .execute(&pool)
            .await
            .unwrap();

        let err = sqlx::query(insert)
            .bind("other@example.com")
            .execute(&pool)
            .await
            .unwrap_err();
        let mapped = ApiError::conflict_on_unique(err, "Username is already taken");
        assert!(matches!(mapped, ApiError::Conflict(m) if m == "Username is already taken"));
    }

    #[test]
    fn non_unique_errors_keep_their_mapping() {
        let mapped = ApiError::conflict_on_unique(sqlx::Error::RowNotFound, "unused");
        assert!(matches!(mapped, ApiError::NotFound(_)));
    }
}
