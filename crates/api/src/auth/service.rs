//! Registration, login, token refresh, logout and profile flows.
//!
//! [`AuthService`] is the only component that decides when users and sessions
//! are created, mutated or destroyed. Storage is reached exclusively through
//! the [`UserStore`] / [`SessionStore`] traits, which also own soft-delete
//! filtering.

use std::sync::Arc;

use chrono::Utc;
use gatehouse_core::error::CoreError;
use gatehouse_core::pagination::{clamp_limit, clamp_offset};
use gatehouse_core::types::{SessionId, UserId};
use gatehouse_core::validation::{validate_password, validate_profile, validate_registration};
use gatehouse_db::models::session::NewSession;
use gatehouse_db::models::user::{NewUser, User};
use gatehouse_db::{SessionStore, StoreError, UserStore};
use uuid::Uuid;

use crate::auth::jwt::{hash_refresh_token, Claims, TokenIssuer};
use crate::auth::password::PasswordHasher;

/// Default lifetime of a refresh-token session.
pub const DEFAULT_SESSION_EXPIRY_HOURS: i64 = 24;

/// Session lifetime and revocation rules.
#[derive(Debug, Clone)]
pub struct SessionPolicy {
    /// How long a session created at login stays usable.
    pub session_ttl: chrono::Duration,
    /// Drop every session of a user after a successful password change.
    pub revoke_on_password_change: bool,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            session_ttl: chrono::Duration::hours(DEFAULT_SESSION_EXPIRY_HOURS),
            revoke_on_password_change: false,
        }
    }
}

/// Request provenance recorded on the session row.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
    pub session_id: SessionId,
}

/// One page of live users plus the independent total count.
#[derive(Debug, Clone)]
pub struct UserPage {
    pub users: Vec<User>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Orchestrates the user and session lifecycle.
pub struct AuthService {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
    policy: SessionPolicy,
}

fn internal(context: &str, err: impl std::fmt::Display) -> CoreError {
    CoreError::Internal(format!("{context}: {err}"))
}

fn store_internal(context: &'static str) -> impl Fn(StoreError) -> CoreError {
    move |e| internal(context, e)
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        hasher: PasswordHasher,
        tokens: TokenIssuer,
        policy: SessionPolicy,
    ) -> Self {
        Self {
            users,
            sessions,
            hasher,
            tokens,
            policy,
        }
    }

    /// Access token lifetime in seconds.
    pub fn access_token_ttl_secs(&self) -> i64 {
        self.tokens.access_token_ttl_secs()
    }

    // -----------------------------------------------------------------------
    // Registration and authentication
    // -----------------------------------------------------------------------

    /// Create an active user after validating input and email uniqueness.
    pub async fn register(&self, email: &str, name: &str, password: &str) -> Result<User, CoreError> {
        validate_registration(email, name, password)?;

        let existing = self
            .users
            .find_user_by_email(email)
            .await
            .map_err(store_internal("Failed to look up user by email"))?;
        if existing.is_some() {
            tracing::warn!(email, "Attempted to register existing email");
            return Err(CoreError::UserAlreadyExists);
        }

        let password_hash = self
            .hasher
            .hash(password)
            .map_err(|e| internal("Password hashing error", e))?;

        let input = NewUser {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: name.to_string(),
            password_hash,
            is_active: true,
            created_at: Utc::now(),
        };

        // The store's uniqueness check is authoritative if a concurrent
        // registration slipped past the lookup above.
        let user = self.users.insert_user(&input).await.map_err(|e| match e {
            StoreError::Conflict(_) => CoreError::UserAlreadyExists,
            other => internal("Failed to create user", other),
        })?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Authenticate by email and password and open a new session.
    ///
    /// Unknown email and wrong password both yield
    /// [`CoreError::InvalidCredentials`], and both pay for one Argon2
    /// verification.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        client: ClientInfo,
    ) -> Result<LoginOutcome, CoreError> {
        let Some(user) = self
            .users
            .find_user_by_email(email)
            .await
            .map_err(store_internal("Failed to look up user by email"))?
        else {
            self.hasher.verify_dummy(password);
            tracing::warn!(email, "Login failed: unknown email");
            return Err(CoreError::InvalidCredentials);
        };

        let password_valid = self
            .hasher
            .verify(password, &user.password_hash)
            .map_err(|e| internal("Password verification error", e))?;
        if !password_valid {
            tracing::warn!(email, "Login failed: invalid password");
            return Err(CoreError::InvalidCredentials);
        }

        if !user.is_active {
            tracing::warn!(user_id = %user.id, "Login failed: account inactive");
            return Err(CoreError::Unauthorized("account is inactive".into()));
        }

        let access_token = self
            .tokens
            .issue_access_token(user.id, &user.email)
            .map_err(|e| internal("Token generation error", e))?;
        let refresh_token = self.tokens.issue_refresh_token();

        let now = Utc::now();
        let session = self
            .sessions
            .insert_session(&NewSession {
                id: Uuid::new_v4(),
                user_id: user.id,
                refresh_token_hash: hash_refresh_token(&refresh_token),
                ip_address: client.ip_address,
                user_agent: client.user_agent,
                expires_at: now + self.policy.session_ttl,
                created_at: now,
            })
            .await
            .map_err(store_internal("Failed to create session"))?;

        tracing::info!(user_id = %user.id, session_id = %session.id, "User logged in");
        Ok(LoginOutcome {
            user,
            access_token,
            refresh_token,
            session_id: session.id,
        })
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// The session is neither rotated nor extended. An expired session is
    /// deleted on sight.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<String, CoreError> {
        let token_hash = hash_refresh_token(refresh_token);

        let session = self
            .sessions
            .find_session_by_token_hash(&token_hash)
            .await
            .map_err(store_internal("Failed to look up session"))?
            .ok_or(CoreError::SessionNotFound)?;

        if session.is_expired_at(Utc::now()) {
            if let Err(e) = self.sessions.delete_session(session.id).await {
                tracing::warn!(session_id = %session.id, error = %e, "Failed to delete expired session");
            }
            tracing::info!(session_id = %session.id, "Refresh rejected: session expired");
            return Err(CoreError::SessionExpired);
        }

        let user = self
            .users
            .find_user(session.user_id)
            .await
            .map_err(store_internal("Failed to look up user"))?
            .ok_or(CoreError::UserNotFound)?;

        let access_token = self
            .tokens
            .issue_access_token(user.id, &user.email)
            .map_err(|e| internal("Token generation error", e))?;

        tracing::info!(user_id = %user.id, "Access token refreshed");
        Ok(access_token)
    }

    /// Verify a bearer access token.
    pub fn authenticate(&self, access_token: &str) -> Result<Claims, CoreError> {
        self.tokens.verify_access_token(access_token)
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    pub async fn get_user(&self, id: UserId) -> Result<User, CoreError> {
        self.users
            .find_user(id)
            .await
            .map_err(store_internal("Failed to look up user"))?
            .ok_or(CoreError::UserNotFound)
    }

    /// Replace name and email after validation and uniqueness checks.
    pub async fn update_profile(&self, id: UserId, name: &str, email: &str) -> Result<User, CoreError> {
        validate_profile(email, name)?;

        let user = self.get_user(id).await?;

        if email != user.email {
            let holder = self
                .users
                .find_user_by_email(email)
                .await
                .map_err(store_internal("Failed to look up user by email"))?;
            if holder.is_some_and(|other| other.id != id) {
                tracing::warn!(user_id = %id, "Profile update rejected: email in use");
                return Err(CoreError::UserAlreadyExists);
            }
        }

        let updated = self
            .users
            .update_profile(id, name, email, Utc::now())
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => CoreError::UserAlreadyExists,
                StoreError::NotFound => CoreError::UserNotFound,
                other => internal("Failed to update user", other),
            })?;

        tracing::info!(user_id = %id, "User profile updated");
        Ok(updated)
    }

    /// Change a password after verifying the old one.
    ///
    /// Existing sessions survive unless the policy says otherwise.
    pub async fn change_password(
        &self,
        id: UserId,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), CoreError> {
        let user = self.get_user(id).await?;

        let old_valid = self
            .hasher
            .verify(old_password, &user.password_hash)
            .map_err(|e| internal("Password verification error", e))?;
        if !old_valid {
            tracing::warn!(user_id = %id, "Password change failed: invalid old password");
            return Err(CoreError::InvalidPassword("old password is incorrect".into()));
        }

        validate_password(new_password)?;

        let password_hash = self
            .hasher
            .hash(new_password)
            .map_err(|e| internal("Password hashing error", e))?;

        self.users
            .update_password(id, &password_hash, Utc::now())
            .await
            .map_err(|e| match e {
                StoreError::NotFound => CoreError::UserNotFound,
                other => internal("Failed to update password", other),
            })?;

        tracing::info!(user_id = %id, "Password changed");

        if self.policy.revoke_on_password_change {
            self.revoke_all_best_effort(id).await;
        }
        Ok(())
    }

    /// Soft-delete a user and drop their sessions.
    ///
    /// Session cleanup is best effort: its failure is logged, not returned.
    pub async fn delete_user(&self, id: UserId) -> Result<(), CoreError> {
        self.get_user(id).await?;

        let deleted = self
            .users
            .soft_delete_user(id, Utc::now())
            .await
            .map_err(store_internal("Failed to delete user"))?;
        if !deleted {
            return Err(CoreError::UserNotFound);
        }

        self.revoke_all_best_effort(id).await;

        tracing::info!(user_id = %id, "User deleted");
        Ok(())
    }

    /// One page of live users. `limit` outside `(0, 100]` becomes 10 and a
    /// negative `offset` becomes 0.
    ///
    /// The total is counted separately from the page, so the two may disagree
    /// under concurrent writes.
    pub async fn list_users(&self, limit: Option<i64>, offset: Option<i64>) -> Result<UserPage, CoreError> {
        let limit = clamp_limit(limit);
        let offset = clamp_offset(offset);

        let users = self
            .users
            .list_users(limit, offset)
            .await
            .map_err(store_internal("Failed to list users"))?;
        let total = self
            .users
            .count_users()
            .await
            .map_err(store_internal("Failed to count users"))?;

        Ok(UserPage {
            users,
            total,
            limit,
            offset,
        })
    }

    // -----------------------------------------------------------------------
    // Sessions
    // -----------------------------------------------------------------------

    /// Delete one session belonging to `user_id`.
    ///
    /// A session owned by someone else is reported as not found.
    pub async fn logout_user(&self, user_id: UserId, session_id: SessionId) -> Result<(), CoreError> {
        let session = self
            .sessions
            .find_session(session_id)
            .await
            .map_err(store_internal("Failed to look up session"))?
            .filter(|s| s.user_id == user_id)
            .ok_or(CoreError::SessionNotFound)?;

        let deleted = self
            .sessions
            .delete_session(session.id)
            .await
            .map_err(store_internal("Failed to delete session"))?;
        if !deleted {
            return Err(CoreError::SessionNotFound);
        }

        tracing::info!(user_id = %user_id, session_id = %session_id, "User logged out");
        Ok(())
    }

    /// Delete every session of a user. Returns how many were removed.
    ///
    /// Individual delete failures are logged and skipped; only failing to
    /// list the sessions is an error.
    pub async fn logout_all_sessions(&self, user_id: UserId) -> Result<usize, CoreError> {
        let sessions = self
            .sessions
            .list_sessions_for_user(user_id)
            .await
            .map_err(store_internal("Failed to list user sessions"))?;

        let mut removed = 0;
        for session in &sessions {
            match self.sessions.delete_session(session.id).await {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(session_id = %session.id, error = %e, "Failed to delete session");
                }
            }
        }

        tracing::info!(user_id = %user_id, count = removed, "All sessions deleted for user");
        Ok(removed)
    }

    /// Remove every session whose expiry has passed.
    pub async fn purge_expired_sessions(&self) -> Result<u64, CoreError> {
        self.sessions
            .delete_expired_sessions(Utc::now())
            .await
            .map_err(store_internal("Failed to purge expired sessions"))
    }

    /// Whether the backing store answers.
    pub async fn storage_healthy(&self) -> bool {
        self.users.ping().await.is_ok()
    }

    async fn revoke_all_best_effort(&self, user_id: UserId) {
        if let Err(e) = self.logout_all_sessions(user_id).await {
            tracing::warn!(user_id = %user_id, error = %e, "Failed to revoke user sessions");
        }
    }
}
