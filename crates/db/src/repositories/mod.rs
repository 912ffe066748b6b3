//! Storage traits and their implementations.
//!
//! Soft-delete filtering lives here and only here: every [`UserStore`] read
//! excludes rows whose `deleted_at` is set, and every mutation targets live
//! rows only. Callers never re-check `deleted_at` themselves.

use async_trait::async_trait;
use gatehouse_core::types::{SessionId, Timestamp, UserId};

use crate::error::StoreError;
use crate::models::session::{NewSession, Session};
use crate::models::user::{NewUser, User};

pub mod memory;
pub mod session_repo;
pub mod user_repo;

pub use memory::MemoryStore;
pub use session_repo::PgSessionRepo;
pub use user_repo::PgUserRepo;

/// Durable record of user identity, credential hash and profile fields.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. A live user with the same email yields
    /// [`StoreError::Conflict`].
    async fn insert_user(&self, input: &NewUser) -> Result<User, StoreError>;

    /// Find a live user by id.
    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Find a live user by email (case-sensitive).
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Replace name and email of a live user, returning the updated row.
    async fn update_profile(
        &self,
        id: UserId,
        name: &str,
        email: &str,
        updated_at: Timestamp,
    ) -> Result<User, StoreError>;

    /// Replace the password hash of a live user.
    async fn update_password(
        &self,
        id: UserId,
        password_hash: &str,
        updated_at: Timestamp,
    ) -> Result<(), StoreError>;

    /// Toggle `is_active`. Returns `true` if a live row was updated.
    async fn set_active(
        &self,
        id: UserId,
        is_active: bool,
        updated_at: Timestamp,
    ) -> Result<bool, StoreError>;

    /// Mark a live user deleted. Returns `false` if already gone.
    async fn soft_delete_user(&self, id: UserId, deleted_at: Timestamp)
        -> Result<bool, StoreError>;

    /// One page of live users, newest first.
    async fn list_users(&self, limit: i64, offset: i64) -> Result<Vec<User>, StoreError>;

    /// Total number of live users.
    async fn count_users(&self) -> Result<i64, StoreError>;

    /// Confirm the backing store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Durable record of refresh-token sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert_session(&self, input: &NewSession) -> Result<Session, StoreError>;

    async fn find_session(&self, id: SessionId) -> Result<Option<Session>, StoreError>;

    /// Look up a session by the digest of its refresh token.
    ///
    /// Expired sessions are returned too; deciding what expiry means is the
    /// caller's job.
    async fn find_session_by_token_hash(
        &self,
        refresh_token_hash: &str,
    ) -> Result<Option<Session>, StoreError>;

    async fn list_sessions_for_user(&self, user_id: UserId) -> Result<Vec<Session>, StoreError>;

    /// Delete one session. Returns `true` if a row was removed.
    async fn delete_session(&self, id: SessionId) -> Result<bool, StoreError>;

    /// Delete every session with `expires_at <= now`. Returns the count.
    async fn delete_expired_sessions(&self, now: Timestamp) -> Result<u64, StoreError>;
}

/// PostgreSQL-backed store: one pool shared by the user and session repos.
#[derive(Clone)]
pub struct PgStore {
    pub users: PgUserRepo,
    pub sessions: PgSessionRepo,
}

impl PgStore {
    pub fn new(pool: crate::DbPool) -> Self {
        Self {
            users: PgUserRepo::new(pool.clone()),
            sessions: PgSessionRepo::new(pool),
        }
    }
}
