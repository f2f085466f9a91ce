use axum::{extract::State, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::api::dto::{JwtResponse, LoginRequest, RefreshRequest, RegisterRequest};
use crate::api::errors::ApiError;
use crate::AppState;

pub const REFRESH_COOKIE: &str = "refreshToken";

/// Authenticate with username and password.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated; refresh token also set as cookie", body = JwtResponse),
        (status = 401, description = "Invalid credentials"),
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<JwtResponse>), ApiError> {
    let resp = state.auth.login(req).await?;
    let jar = jar.add(refresh_cookie(&state, &resp.refresh_token));
    Ok((jar, Json(resp)))
}

/// Create an account and log straight in.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registered and authenticated", body = JwtResponse),
        (status = 400, description = "Invalid registration data"),
        (status = 409, description = "Username or email already taken"),
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> Result<(CookieJar, Json<JwtResponse>), ApiError> {
    let resp = state.auth.register(req).await?;
    let jar = jar.add(refresh_cookie(&state, &resp.refresh_token));
    Ok((jar, Json(resp)))
}

/// Exchange a refresh token (cookie, or body fallback) for a fresh pair.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New token pair", body = JwtResponse),
        (status = 401, description = "Missing, invalid or expired refresh token"),
    ),
    tag = "auth"
)]
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> Result<(CookieJar, Json<JwtResponse>), ApiError> {
    let token = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_owned())
        .or_else(|| body.and_then(|Json(b)| b.refresh_token))
        .ok_or_else(|| ApiError::Unauthorized("Missing refresh token".to_owned()))?;

    let resp = state.auth.refresh(&token).await?;
    let jar = jar.add(refresh_cookie(&state, &resp.refresh_token));
    Ok((jar, Json(resp)))
}

/// HTTP-only cookie scoped to the refresh endpoint; `Secure` in prod.
fn refresh_cookie(state: &AppState, token: &str) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, token.to_owned()))
        .http_only(true)
        .secure(state.cookie_secure)
        .same_site(SameSite::Strict)
        .path("/auth/refresh")
        .max_age(time::Duration::seconds(
            state.jwt.refresh_ttl_secs() as i64
        ))
        .build()
}
