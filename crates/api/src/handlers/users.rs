//! Handlers for the `/users` resource.
//!
//! Reads are open to any authenticated caller; mutations are restricted to
//! the caller's own account.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use gatehouse_core::types::UserId;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::PaginationParams;
use crate::response::{DataResponse, UserResponse};
use crate::state::AppState;

/// Request body for `PUT /users/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: String,
    pub email: String,
}

/// Request body for `POST /users/{id}/password`.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Paginated user listing.
#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// GET /api/v1/users?limit=&offset=
pub async fn list_users(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    params: Result<Query<PaginationParams>, QueryRejection>,
) -> AppResult<Json<DataResponse<UserListResponse>>> {
    let Query(params) = params?;
    let page = state.auth.list_users(params.limit, params.offset).await?;

    Ok(Json(DataResponse::success(UserListResponse {
        users: page.users.iter().map(UserResponse::from).collect(),
        total: page.total,
        limit: page.limit,
        offset: page.offset,
    })))
}

/// GET /api/v1/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    id: Result<Path<UserId>, PathRejection>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let Path(id) = id?;
    let user = state.auth.get_user(id).await?;
    Ok(Json(DataResponse::success(UserResponse::from(&user))))
}

/// PUT /api/v1/users/{id}
pub async fn update_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
    id: Result<Path<UserId>, PathRejection>,
    input: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let Path(id) = id?;
    auth_user.ensure_self(id)?;
    let Json(input) = input?;

    let user = state
        .auth
        .update_profile(id, &input.name, &input.email)
        .await?;
    Ok(Json(DataResponse::success(UserResponse::from(&user))))
}

/// POST /api/v1/users/{id}/password
pub async fn change_password(
    State(state): State<AppState>,
    auth_user: AuthUser,
    id: Result<Path<UserId>, PathRejection>,
    input: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> AppResult<StatusCode> {
    let Path(id) = id?;
    auth_user.ensure_self(id)?;
    let Json(input) = input?;

    state
        .auth
        .change_password(id, &input.old_password, &input.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    id: Result<Path<UserId>, PathRejection>,
) -> AppResult<StatusCode> {
    let Path(id) = id?;
    auth_user.ensure_self(id)?;

    state.auth.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
