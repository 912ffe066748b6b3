//! User entity model and DTOs.

use gatehouse_core::types::{Timestamp, UserId};
use sqlx::FromRow;

/// Full user row from the `users` table.
///
/// Contains the password hash, so it is deliberately not `Serialize`; the API
/// layer converts it into its own response type.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

impl User {
    /// A soft-deleted user is invisible to every lookup.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// DTO for creating a new user. The id and timestamps are chosen by the caller.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: Timestamp,
}
