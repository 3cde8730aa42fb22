use axum::{
    Extension, Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::types::{MessageResponse, UserDto};
use super::{ApiError, ApiResponse, AppState};
use crate::config::Config;
use crate::entities::users;
use crate::services::{CreateUser, ServiceError};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub user: UserDto,
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Authenticated user attached to the request by [`auth_middleware`].
#[derive(Clone)]
pub struct AuthUser(pub users::Model);

// ============================================================================
// Middleware
// ============================================================================

/// Bearer-token authentication for the protected routes.
///
/// Verifies the access token, loads the user behind it and attaches an
/// [`AuthUser`] extension for handlers. A token whose user has vanished is
/// reported exactly like a forged one.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers())?.to_owned();
    let claims = state.token_service().decode_access_token(&token)?;

    let user = state
        .user_service()
        .get_active_user(claims.sub)
        .await
        .map_err(|err| match err {
            ServiceError::NotFound(_) => ServiceError::Unauthorized("Invalid token".to_string()),
            other => other,
        })?;

    tracing::Span::current().record("user_id", user.id.to_string());
    request.extensions_mut().insert(AuthUser(user));

    Ok(next.run(request).await)
}

/// Pull the token out of `Authorization: Bearer <token>`.
fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
/// Create an account. New accounts pick up the default role through the
/// user-saved integration event, inside the same transaction.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserDto>>), ApiError> {
    let user = state
        .user_service()
        .create_user(CreateUser {
            username: payload.username,
            email: payload.email,
            password: payload.password,
            full_name: payload.full_name,
        })
        .await?;

    tracing::info!("Registered user: {}", user.username);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(user.into())),
    ))
}

/// POST /auth/login
/// Authenticate with username and password. Returns a short-lived access
/// token in the body and sets the refresh token as an HTTP-only cookie.
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<LoginResponse>>), ApiError> {
    if payload.username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let user = state
        .user_service()
        .verify_credentials(&payload.username, &payload.password)
        .await?;

    let tokens = state.token_service();
    let access_token = tokens.create_access_token(user.id, None)?;
    let refresh_token = tokens.create_refresh_token(user.id, None)?;

    let config = state.config().read().await;
    let jar = jar.add(refresh_cookie(&config, refresh_token, tokens.refresh_ttl()));
    drop(config);

    tracing::info!("User logged in: {}", user.username);

    Ok((
        jar,
        Json(ApiResponse::success(LoginResponse {
            user: user.into(),
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: tokens.access_ttl().num_seconds(),
        })),
    ))
}

/// POST /auth/refresh
/// Exchange the refresh cookie for a fresh access token. The refresh token
/// is rotated on every use; the old cookie value stops mattering as soon as
/// the new one is set.
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<ApiResponse<TokenResponse>>), ApiError> {
    let cookie_name = {
        let config = state.config().read().await;
        config.auth.refresh_cookie_name.clone()
    };

    let token = jar
        .get(&cookie_name)
        .map(|cookie| cookie.value().to_string())
        .ok_or_else(|| ApiError::unauthorized("Missing refresh token"))?;

    let claims = state.token_service().decode_refresh_token(&token)?;

    let user = state
        .user_service()
        .get_active_user(claims.sub)
        .await
        .map_err(|err| match err {
            ServiceError::NotFound(_) => ServiceError::Unauthorized("Invalid token".to_string()),
            other => other,
        })?;

    let tokens = state.token_service();
    let access_token = tokens.create_access_token(user.id, None)?;
    let rotated = tokens.create_refresh_token(user.id, None)?;

    let config = state.config().read().await;
    let jar = jar.add(refresh_cookie(&config, rotated, tokens.refresh_ttl()));
    drop(config);

    Ok((
        jar,
        Json(ApiResponse::success(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: tokens.access_ttl().num_seconds(),
        })),
    ))
}

/// POST /auth/logout
/// Clear the refresh cookie. Access tokens stay valid until they expire,
/// which is why their lifetime is short.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<ApiResponse<MessageResponse>>), ApiError> {
    let config = state.config().read().await;
    let jar = jar.add(removal_cookie(&config));
    drop(config);

    Ok((
        jar,
        Json(ApiResponse::success(MessageResponse::new("Logged out"))),
    ))
}

/// GET /auth/me
/// Current user, as established by the auth middleware.
pub async fn get_current_user(
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Json<ApiResponse<UserDto>> {
    Json(ApiResponse::success(user.into()))
}

// ============================================================================
// Helpers
// ============================================================================

// The cookie is scoped to the auth endpoints; no other route ever sees the
// refresh token.
const REFRESH_COOKIE_PATH: &str = "/api/auth";

fn refresh_cookie(config: &Config, token: String, ttl: chrono::Duration) -> Cookie<'static> {
    Cookie::build((config.auth.refresh_cookie_name.clone(), token))
        .path(REFRESH_COOKIE_PATH)
        .http_only(true)
        .secure(config.server.secure_cookies)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::seconds(ttl.num_seconds()))
        .build()
}

fn removal_cookie(config: &Config) -> Cookie<'static> {
    Cookie::build((config.auth.refresh_cookie_name.clone(), ""))
        .path(REFRESH_COOKIE_PATH)
        .http_only(true)
        .secure(config.server.secure_cookies)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::ZERO)
        .build()
}
