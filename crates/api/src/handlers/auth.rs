//! Handlers for registration, login, token refresh and logout.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use gatehouse_core::types::SessionId;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::client::ClientMeta;
use crate::response::{DataResponse, UserResponse};
use crate::state::AppState;

const TOKEN_TYPE: &str = "Bearer";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /register`.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

/// Request body for `POST /login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for `POST /token/refresh`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Request body for `POST /logout`.
#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub session_id: SessionId,
}

/// Successful login payload.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub session_id: SessionId,
    pub user: UserResponse,
}

/// Successful refresh payload. The refresh token itself is unchanged.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/register
pub async fn register(
    State(state): State<AppState>,
    input: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<DataResponse<UserResponse>>)> {
    let Json(input) = input?;
    let user = state
        .auth
        .register(&input.email, &input.name, &input.password)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse::success(UserResponse::from(&user))),
    ))
}

/// POST /api/v1/login
///
/// Authenticate with email + password. Returns an access token, a refresh
/// token and the id of the session backing it.
pub async fn login(
    State(state): State<AppState>,
    ClientMeta(client): ClientMeta,
    input: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<DataResponse<LoginResponse>>> {
    let Json(input) = input?;
    let outcome = state
        .auth
        .login(&input.email, &input.password, client)
        .await?;

    Ok(Json(DataResponse::success(LoginResponse {
        access_token: outcome.access_token,
        refresh_token: outcome.refresh_token,
        token_type: TOKEN_TYPE,
        expires_in: state.auth.access_token_ttl_secs(),
        session_id: outcome.session_id,
        user: UserResponse::from(&outcome.user),
    })))
}

/// POST /api/v1/token/refresh
pub async fn refresh(
    State(state): State<AppState>,
    input: Result<Json<RefreshRequest>, JsonRejection>,
) -> AppResult<Json<DataResponse<RefreshResponse>>> {
    let Json(input) = input?;
    let access_token = state.auth.refresh_token(&input.refresh_token).await?;

    Ok(Json(DataResponse::success(RefreshResponse {
        access_token,
        token_type: TOKEN_TYPE,
        expires_in: state.auth.access_token_ttl_secs(),
    })))
}

/// POST /api/v1/logout
///
/// Delete one of the caller's sessions. Returns 204 No Content.
pub async fn logout(
    State(state): State<AppState>,
    auth_user: AuthUser,
    input: Result<Json<LogoutRequest>, JsonRejection>,
) -> AppResult<StatusCode> {
    let Json(input) = input?;
    state
        .auth
        .logout_user(auth_user.user_id, input.session_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/logout-all
///
/// Delete every session of the caller. Returns 204 No Content.
pub async fn logout_all(State(state): State<AppState>, auth_user: AuthUser) -> AppResult<StatusCode> {
    state.auth.logout_all_sessions(auth_user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
