//! In-memory store for local development and tests.
//!
//! All state sits behind a single [`RwLock`], so registration, lookup by email
//! and updates racing on the same keys are serialized. Email uniqueness among
//! live users is checked inside the same write-lock scope as the insert.

use std::collections::HashMap;

use async_trait::async_trait;
use gatehouse_core::types::{SessionId, Timestamp, UserId};
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::models::session::{NewSession, Session};
use crate::models::user::{NewUser, User};
use crate::repositories::{SessionStore, UserStore};

#[derive(Default)]
struct MemoryState {
    users: HashMap<UserId, User>,
    sessions: HashMap<SessionId, Session>,
}

impl MemoryState {
    fn live_user(&self, id: UserId) -> Option<&User> {
        self.users.get(&id).filter(|u| !u.is_deleted())
    }

    fn live_user_mut(&mut self, id: UserId) -> Option<&mut User> {
        self.users.get_mut(&id).filter(|u| !u.is_deleted())
    }

    fn live_users(&self) -> impl Iterator<Item = &User> {
        self.users.values().filter(|u| !u.is_deleted())
    }

    fn email_taken(&self, email: &str, except: Option<UserId>) -> bool {
        self.live_users()
            .any(|u| u.email == email && Some(u.id) != except)
    }
}

/// Map-backed implementation of both [`UserStore`] and [`SessionStore`].
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, input: &NewUser) -> Result<User, StoreError> {
        let mut state = self.state.write().await;

        if state.users.contains_key(&input.id) {
            return Err(StoreError::Conflict(format!("user id {} exists", input.id)));
        }
        if state.email_taken(&input.email, None) {
            return Err(StoreError::Conflict("email already registered".into()));
        }

        let user = User {
            id: input.id,
            email: input.email.clone(),
            name: input.name.clone(),
            password_hash: input.password_hash.clone(),
            is_active: input.is_active,
            created_at: input.created_at,
            updated_at: input.created_at,
            deleted_at: None,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.state.read().await.live_user(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let state = self.state.read().await;
        let user = state.live_users().find(|u| u.email == email).cloned();
        Ok(user)
    }

    async fn update_profile(
        &self,
        id: UserId,
        name: &str,
        email: &str,
        updated_at: Timestamp,
    ) -> Result<User, StoreError> {
        let mut state = self.state.write().await;

        if state.live_user(id).is_none() {
            return Err(StoreError::NotFound);
        }
        if state.email_taken(email, Some(id)) {
            return Err(StoreError::Conflict("email already registered".into()));
        }

        let user = state.live_user_mut(id).ok_or(StoreError::NotFound)?;
        user.name = name.to_string();
        user.email = email.to_string();
        user.updated_at = updated_at;
        Ok(user.clone())
    }

    async fn update_password(
        &self,
        id: UserId,
        password_hash: &str,
        updated_at: Timestamp,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let user = state.live_user_mut(id).ok_or(StoreError::NotFound)?;
        user.password_hash = password_hash.to_string();
        user.updated_at = updated_at;
        Ok(())
    }

    async fn set_active(
        &self,
        id: UserId,
        is_active: bool,
        updated_at: Timestamp,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        match state.live_user_mut(id) {
            Some(user) => {
                user.is_active = is_active;
                user.updated_at = updated_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn soft_delete_user(
        &self,
        id: UserId,
        deleted_at: Timestamp,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        match state.live_user_mut(id) {
            Some(user) => {
                user.deleted_at = Some(deleted_at);
                user.updated_at = deleted_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_users(&self, limit: i64, offset: i64) -> Result<Vec<User>, StoreError> {
        let state = self.state.read().await;
        let mut users: Vec<&User> = state.live_users().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        let offset = usize::try_from(offset.max(0)).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        Ok(users
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count_users(&self) -> Result<i64, StoreError> {
        let count = self.state.read().await.live_users().count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert_session(&self, input: &NewSession) -> Result<Session, StoreError> {
        let mut state = self.state.write().await;

        if state.sessions.contains_key(&input.id)
            || state
                .sessions
                .values()
                .any(|s| s.refresh_token_hash == input.refresh_token_hash)
        {
            return Err(StoreError::Conflict("session already exists".into()));
        }

        let session = Session {
            id: input.id,
            user_id: input.user_id,
            refresh_token_hash: input.refresh_token_hash.clone(),
            ip_address: input.ip_address.clone(),
            user_agent: input.user_agent.clone(),
            expires_at: input.expires_at,
            created_at: input.created_at,
        };
        state.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn find_session(&self, id: SessionId) -> Result<Option<Session>, StoreError> {
        Ok(self.state.read().await.sessions.get(&id).cloned())
    }

    async fn find_session_by_token_hash(
        &self,
        refresh_token_hash: &str,
    ) -> Result<Option<Session>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .sessions
            .values()
            .find(|s| s.refresh_token_hash == refresh_token_hash)
            .cloned())
    }

    async fn list_sessions_for_user(&self, user_id: UserId) -> Result<Vec<Session>, StoreError> {
        let state = self.state.read().await;
        let mut sessions: Vec<Session> = state
            .sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    async fn delete_session(&self, id: SessionId) -> Result<bool, StoreError> {
        Ok(self.state.write().await.sessions.remove(&id).is_some())
    }

    async fn delete_expired_sessions(&self, now: Timestamp) -> Result<u64, StoreError> {
        let mut state = self.state.write().await;
        let before = state.sessions.len();
        state.sessions.retain(|_, s| !s.is_expired_at(now));
        Ok((before - state.sessions.len()) as u64)
    }
}
