//! Shared response envelope types for API handlers.
//!
//! Successful responses use `{ "status": "success", "data": ... }`; failures
//! use `{ "status": "fail" | "error", "code": ..., "message": ... }` (see
//! [`crate::error::AppError`]).

use gatehouse_core::types::{Timestamp, UserId};
use gatehouse_db::models::user::User;
use serde::Serialize;

/// Standard `{ "status": "success", "data": T }` response envelope.
///
/// # Example
///
/// ```ignore
/// Ok(Json(DataResponse::success(items)))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub status: &'static str,
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success",
            data,
        }
    }
}

/// Failure envelope body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// `fail` for client errors, `error` for server errors.
    pub status: &'static str,
    pub code: &'static str,
    pub message: String,
}

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
