//! Behaviour tests for `AuthService` over the in-memory store.
//!
//! Covers registration, login, refresh, password change, profile update,
//! deletion, logout and listing without an HTTP layer.

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use common::{service_over, test_service, test_service_with, TEST_PASSWORD};
use gatehouse_api::auth::jwt::hash_refresh_token;
use gatehouse_api::auth::service::{ClientInfo, SessionPolicy};
use gatehouse_api::auth::AuthService;
use gatehouse_core::error::CoreError;
use gatehouse_core::types::{Timestamp, UserId};
use gatehouse_db::models::session::NewSession;
use gatehouse_db::models::user::{NewUser, User};
use gatehouse_db::{MemoryStore, SessionStore, StoreError, UserStore};
use uuid::Uuid;

fn client() -> ClientInfo {
    ClientInfo {
        ip_address: Some("203.0.113.10".into()),
        user_agent: Some("integration-tests".into()),
    }
}

// ---------------------------------------------------------------------------
// Register
// ---------------------------------------------------------------------------

#[tokio::test]
async fn register_succeeds_once_per_email() {
    let (auth, _store) = test_service();

    let user = auth
        .register("ada@example.com", "Ada", TEST_PASSWORD)
        .await
        .unwrap();
    assert_eq!(user.email, "ada@example.com");
    assert_eq!(user.name, "Ada");
    assert!(user.is_active);
    assert!(user.deleted_at.is_none());
    assert_ne!(user.password_hash, TEST_PASSWORD);

    let err = auth
        .register("ada@example.com", "Another Ada", TEST_PASSWORD)
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::UserAlreadyExists);
}

#[tokio::test]
async fn register_rejects_invalid_input() {
    let (auth, store) = test_service();

    assert_matches!(
        auth.register("not-an-email", "Name", "longenough1").await,
        Err(CoreError::InvalidEmail)
    );
    assert_matches!(
        auth.register("a@b.com", "Name", "short").await,
        Err(CoreError::InvalidPassword(_))
    );
    assert_matches!(
        auth.register("a@b.com", "   ", "longenough1").await,
        Err(CoreError::InvalidName)
    );
    assert_matches!(
        auth.register("a@b.com", "Name", &"x".repeat(129)).await,
        Err(CoreError::InvalidPassword(_))
    );

    assert_eq!(store.count_users().await.unwrap(), 0);
}

#[tokio::test]
async fn register_accepts_password_length_bounds() {
    let (auth, _store) = test_service();

    auth.register("min@example.com", "Min", &"a".repeat(8))
        .await
        .unwrap();
    auth.register("max@example.com", "Max", &"a".repeat(128))
        .await
        .unwrap();
}

#[tokio::test]
async fn register_frees_email_after_delete() {
    let (auth, _store) = test_service();

    let first = auth
        .register("reuse@example.com", "First", TEST_PASSWORD)
        .await
        .unwrap();
    auth.delete_user(first.id).await.unwrap();

    let second = auth
        .register("reuse@example.com", "Second", TEST_PASSWORD)
        .await
        .unwrap();
    assert_ne!(first.id, second.id);
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[tokio::test]
async fn login_returns_tokens_and_records_session() {
    let (auth, store) = test_service();
    let user = auth
        .register("login@example.com", "Login", TEST_PASSWORD)
        .await
        .unwrap();

    let outcome = auth
        .login("login@example.com", TEST_PASSWORD, client())
        .await
        .unwrap();

    assert_eq!(outcome.user.email, "login@example.com");
    assert!(!outcome.access_token.is_empty());
    assert!(!outcome.refresh_token.is_empty());

    let session = store
        .find_session(outcome.session_id)
        .await
        .unwrap()
        .expect("session row should exist");
    assert_eq!(session.user_id, user.id);
    assert_eq!(session.refresh_token_hash, hash_refresh_token(&outcome.refresh_token));
    assert_eq!(session.ip_address.as_deref(), Some("203.0.113.10"));
    assert_eq!(session.user_agent.as_deref(), Some("integration-tests"));

    let ttl = session.expires_at - session.created_at;
    assert_eq!(ttl, Duration::hours(24));

    let claims = auth.authenticate(&outcome.access_token).unwrap();
    assert_eq!(claims.sub, user.id);
    assert_eq!(claims.email, "login@example.com");
}

#[tokio::test]
async fn each_login_opens_another_session() {
    let (auth, store) = test_service();
    let user = auth
        .register("multi@example.com", "Multi", TEST_PASSWORD)
        .await
        .unwrap();

    let a = auth
        .login("multi@example.com", TEST_PASSWORD, client())
        .await
        .unwrap();
    let b = auth
        .login("multi@example.com", TEST_PASSWORD, ClientInfo::default())
        .await
        .unwrap();

    assert_ne!(a.session_id, b.session_id);
    assert_ne!(a.refresh_token, b.refresh_token);
    assert_eq!(store.list_sessions_for_user(user.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let (auth, _store) = test_service();
    auth.register("real@example.com", "Real", TEST_PASSWORD)
        .await
        .unwrap();

    let wrong_password = auth
        .login("real@example.com", "not-the-password", client())
        .await
        .unwrap_err();
    let unknown_email = auth
        .login("ghost@example.com", TEST_PASSWORD, client())
        .await
        .unwrap_err();

    assert_matches!(wrong_password, CoreError::InvalidCredentials);
    assert_matches!(unknown_email, CoreError::InvalidCredentials);
    assert_eq!(wrong_password.to_string(), unknown_email.to_string());
}

#[tokio::test]
async fn login_of_deleted_user_is_invalid_credentials() {
    let (auth, _store) = test_service();
    let user = auth
        .register("deleted@example.com", "Deleted", TEST_PASSWORD)
        .await
        .unwrap();
    auth.delete_user(user.id).await.unwrap();

    assert_matches!(
        auth.login("deleted@example.com", TEST_PASSWORD, client()).await,
        Err(CoreError::InvalidCredentials)
    );
}

#[tokio::test]
async fn login_of_inactive_user_is_unauthorized() {
    let (auth, store) = test_service();
    let user = auth
        .register("inactive@example.com", "Inactive", TEST_PASSWORD)
        .await
        .unwrap();
    assert!(store.set_active(user.id, false, Utc::now()).await.unwrap());

    assert_matches!(
        auth.login("inactive@example.com", TEST_PASSWORD, client()).await,
        Err(CoreError::Unauthorized(_))
    );
    assert!(store.list_sessions_for_user(user.id).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Refresh
// ---------------------------------------------------------------------------

#[tokio::test]
async fn refresh_issues_new_access_token_without_rotation() {
    let (auth, store) = test_service();
    let user = auth
        .register("refresh@example.com", "Refresh", TEST_PASSWORD)
        .await
        .unwrap();
    let outcome = auth
        .login("refresh@example.com", TEST_PASSWORD, client())
        .await
        .unwrap();
    let before = store.find_session(outcome.session_id).await.unwrap().unwrap();

    let access = auth.refresh_token(&outcome.refresh_token).await.unwrap();
    assert_eq!(auth.authenticate(&access).unwrap().sub, user.id);

    // Same refresh token keeps working; the session is unchanged.
    auth.refresh_token(&outcome.refresh_token).await.unwrap();
    let after = store.find_session(outcome.session_id).await.unwrap().unwrap();
    assert_eq!(before.expires_at, after.expires_at);
    assert_eq!(before.refresh_token_hash, after.refresh_token_hash);
}

#[tokio::test]
async fn refresh_with_unknown_token_is_session_not_found() {
    let (auth, _store) = test_service();
    assert_matches!(
        auth.refresh_token("never-issued").await,
        Err(CoreError::SessionNotFound)
    );
}

#[tokio::test]
async fn expired_session_is_rejected_then_gone() {
    let (auth, store) = test_service();
    let user = auth
        .register("expired@example.com", "Expired", TEST_PASSWORD)
        .await
        .unwrap();

    let raw = "expired-refresh-token";
    let now = Utc::now();
    store
        .insert_session(&NewSession {
            id: Uuid::new_v4(),
            user_id: user.id,
            refresh_token_hash: hash_refresh_token(raw),
            ip_address: None,
            user_agent: None,
            expires_at: now - Duration::minutes(1),
            created_at: now - Duration::hours(25),
        })
        .await
        .unwrap();

    assert_matches!(auth.refresh_token(raw).await, Err(CoreError::SessionExpired));
    assert_matches!(auth.refresh_token(raw).await, Err(CoreError::SessionNotFound));
    assert!(store.list_sessions_for_user(user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn refresh_after_user_vanished_is_user_not_found() {
    let (auth, store) = test_service();
    let user = auth
        .register("vanish@example.com", "Vanish", TEST_PASSWORD)
        .await
        .unwrap();
    let outcome = auth
        .login("vanish@example.com", TEST_PASSWORD, client())
        .await
        .unwrap();

    // Removed behind the service's back, so the session survives.
    assert!(store.soft_delete_user(user.id, Utc::now()).await.unwrap());
    assert!(store.find_session(outcome.session_id).await.unwrap().is_some());

    assert_matches!(
        auth.refresh_token(&outcome.refresh_token).await,
        Err(CoreError::UserNotFound)
    );
}

// ---------------------------------------------------------------------------
// Change password
// ---------------------------------------------------------------------------

#[tokio::test]
async fn change_password_with_wrong_old_password_keeps_hash() {
    let (auth, store) = test_service();
    let user = auth
        .register("pw@example.com", "Pw", TEST_PASSWORD)
        .await
        .unwrap();

    let err = auth
        .change_password(user.id, "definitely-wrong", "brand-new-password")
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::InvalidPassword(_));

    let stored = store.find_user(user.id).await.unwrap().unwrap();
    assert_eq!(stored.password_hash, user.password_hash);
    auth.login("pw@example.com", TEST_PASSWORD, client())
        .await
        .unwrap();
}

#[tokio::test]
async fn change_password_validates_new_password() {
    let (auth, _store) = test_service();
    let user = auth
        .register("pw2@example.com", "Pw", TEST_PASSWORD)
        .await
        .unwrap();

    assert_matches!(
        auth.change_password(user.id, TEST_PASSWORD, "short").await,
        Err(CoreError::InvalidPassword(_))
    );
}

#[tokio::test]
async fn change_password_switches_credentials_and_keeps_sessions() {
    let (auth, _store) = test_service();
    let user = auth
        .register("pw3@example.com", "Pw", TEST_PASSWORD)
        .await
        .unwrap();
    let outcome = auth
        .login("pw3@example.com", TEST_PASSWORD, client())
        .await
        .unwrap();

    auth.change_password(user.id, TEST_PASSWORD, "a-new-password")
        .await
        .unwrap();

    assert_matches!(
        auth.login("pw3@example.com", TEST_PASSWORD, client()).await,
        Err(CoreError::InvalidCredentials)
    );
    auth.login("pw3@example.com", "a-new-password", client())
        .await
        .unwrap();
    auth.refresh_token(&outcome.refresh_token).await.unwrap();
}

#[tokio::test]
async fn change_password_revokes_sessions_when_configured() {
    let (auth, store) = test_service_with(SessionPolicy {
        revoke_on_password_change: true,
        ..SessionPolicy::default()
    });
    let user = auth
        .register("pw4@example.com", "Pw", TEST_PASSWORD)
        .await
        .unwrap();
    let outcome = auth
        .login("pw4@example.com", TEST_PASSWORD, client())
        .await
        .unwrap();

    auth.change_password(user.id, TEST_PASSWORD, "a-new-password")
        .await
        .unwrap();

    assert!(store.list_sessions_for_user(user.id).await.unwrap().is_empty());
    assert_matches!(
        auth.refresh_token(&outcome.refresh_token).await,
        Err(CoreError::SessionNotFound)
    );
}

#[tokio::test]
async fn change_password_of_missing_user_is_not_found() {
    let (auth, _store) = test_service();
    assert_matches!(
        auth.change_password(Uuid::new_v4(), TEST_PASSWORD, "a-new-password")
            .await,
        Err(CoreError::UserNotFound)
    );
}

// ---------------------------------------------------------------------------
// Update profile
// ---------------------------------------------------------------------------

#[tokio::test]
async fn update_profile_changes_fields() {
    let (auth, _store) = test_service();
    let user = auth
        .register("old@example.com", "Old Name", TEST_PASSWORD)
        .await
        .unwrap();

    let updated = auth
        .update_profile(user.id, "New Name", "new@example.com")
        .await
        .unwrap();
    assert_eq!(updated.name, "New Name");
    assert_eq!(updated.email, "new@example.com");
    assert!(updated.updated_at >= user.updated_at);

    auth.login("new@example.com", TEST_PASSWORD, client())
        .await
        .unwrap();
}

#[tokio::test]
async fn update_profile_rejects_taken_email() {
    let (auth, _store) = test_service();
    auth.register("taken@example.com", "Taken", TEST_PASSWORD)
        .await
        .unwrap();
    let user = auth
        .register("mine@example.com", "Mine", TEST_PASSWORD)
        .await
        .unwrap();

    assert_matches!(
        auth.update_profile(user.id, "Mine", "taken@example.com").await,
        Err(CoreError::UserAlreadyExists)
    );
    // Keeping one's own email is not a conflict.
    auth.update_profile(user.id, "Renamed", "mine@example.com")
        .await
        .unwrap();
}

#[tokio::test]
async fn update_profile_validates_and_requires_user() {
    let (auth, _store) = test_service();
    let user = auth
        .register("val@example.com", "Val", TEST_PASSWORD)
        .await
        .unwrap();

    assert_matches!(
        auth.update_profile(user.id, "Val", "nope").await,
        Err(CoreError::InvalidEmail)
    );
    assert_matches!(
        auth.update_profile(user.id, "", "val@example.com").await,
        Err(CoreError::InvalidName)
    );
    assert_matches!(
        auth.update_profile(Uuid::new_v4(), "Val", "val@example.com")
            .await,
        Err(CoreError::UserNotFound)
    );
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delete_user_hides_user_and_kills_refresh_tokens() {
    let (auth, store) = test_service();
    let user = auth
        .register("bye@example.com", "Bye", TEST_PASSWORD)
        .await
        .unwrap();
    let outcome = auth
        .login("bye@example.com", TEST_PASSWORD, client())
        .await
        .unwrap();

    auth.delete_user(user.id).await.unwrap();

    assert_matches!(auth.get_user(user.id).await, Err(CoreError::UserNotFound));
    assert_matches!(
        auth.refresh_token(&outcome.refresh_token).await,
        Err(CoreError::SessionNotFound)
    );
    assert!(store.list_sessions_for_user(user.id).await.unwrap().is_empty());
    assert_matches!(auth.delete_user(user.id).await, Err(CoreError::UserNotFound));
}

// ---------------------------------------------------------------------------
// Logout
// ---------------------------------------------------------------------------

#[tokio::test]
async fn logout_deletes_only_the_given_session() {
    let (auth, store) = test_service();
    let user = auth
        .register("out@example.com", "Out", TEST_PASSWORD)
        .await
        .unwrap();
    let a = auth
        .login("out@example.com", TEST_PASSWORD, client())
        .await
        .unwrap();
    let b = auth
        .login("out@example.com", TEST_PASSWORD, client())
        .await
        .unwrap();

    auth.logout_user(user.id, a.session_id).await.unwrap();

    assert_matches!(
        auth.refresh_token(&a.refresh_token).await,
        Err(CoreError::SessionNotFound)
    );
    auth.refresh_token(&b.refresh_token).await.unwrap();
    assert_eq!(store.list_sessions_for_user(user.id).await.unwrap().len(), 1);

    assert_matches!(
        auth.logout_user(user.id, a.session_id).await,
        Err(CoreError::SessionNotFound)
    );
}

#[tokio::test]
async fn logout_cannot_touch_another_users_session() {
    let (auth, _store) = test_service();
    let owner = auth
        .register("owner@example.com", "Owner", TEST_PASSWORD)
        .await
        .unwrap();
    let intruder = auth
        .register("intruder@example.com", "Intruder", TEST_PASSWORD)
        .await
        .unwrap();
    let outcome = auth
        .login("owner@example.com", TEST_PASSWORD, client())
        .await
        .unwrap();

    assert_matches!(
        auth.logout_user(intruder.id, outcome.session_id).await,
        Err(CoreError::SessionNotFound)
    );
    auth.logout_user(owner.id, outcome.session_id).await.unwrap();
}

#[tokio::test]
async fn logout_all_removes_every_session() {
    let (auth, store) = test_service();
    let user = auth
        .register("all@example.com", "All", TEST_PASSWORD)
        .await
        .unwrap();
    for _ in 0..3 {
        auth.login("all@example.com", TEST_PASSWORD, client())
            .await
            .unwrap();
    }

    assert_eq!(auth.logout_all_sessions(user.id).await.unwrap(), 3);
    assert!(store.list_sessions_for_user(user.id).await.unwrap().is_empty());
    assert_eq!(auth.logout_all_sessions(user.id).await.unwrap(), 0);
}

// ---------------------------------------------------------------------------
// List and purge
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_users_clamps_paging_and_counts_live_users() {
    let (auth, _store) = test_service();
    let mut ids = Vec::new();
    for i in 0..3 {
        let user = auth
            .register(&format!("user{i}@example.com"), "User", TEST_PASSWORD)
            .await
            .unwrap();
        ids.push(user.id);
    }
    auth.delete_user(ids[0]).await.unwrap();

    let page = auth.list_users(Some(200), Some(-5)).await.unwrap();
    assert_eq!(page.limit, 10);
    assert_eq!(page.offset, 0);
    assert_eq!(page.total, 2);
    assert_eq!(page.users.len(), 2);
    assert!(page.users.iter().all(|u| u.id != ids[0]));

    let page = auth.list_users(Some(1), Some(1)).await.unwrap();
    assert_eq!(page.limit, 1);
    assert_eq!(page.offset, 1);
    assert_eq!(page.users.len(), 1);
    assert_eq!(page.total, 2);

    let page = auth.list_users(None, None).await.unwrap();
    assert_eq!(page.limit, 10);
    assert_eq!(page.offset, 0);
}

#[tokio::test]
async fn purge_removes_only_expired_sessions() {
    let (auth, store) = test_service();
    let user = auth
        .register("purge@example.com", "Purge", TEST_PASSWORD)
        .await
        .unwrap();
    auth.login("purge@example.com", TEST_PASSWORD, client())
        .await
        .unwrap();

    let now = Utc::now();
    store
        .insert_session(&NewSession {
            id: Uuid::new_v4(),
            user_id: user.id,
            refresh_token_hash: hash_refresh_token("stale"),
            ip_address: None,
            user_agent: None,
            expires_at: now - Duration::seconds(1),
            created_at: now - Duration::hours(24),
        })
        .await
        .unwrap();

    assert_eq!(auth.purge_expired_sessions().await.unwrap(), 1);
    assert_eq!(store.list_sessions_for_user(user.id).await.unwrap().len(), 1);
    assert!(auth.storage_healthy().await);
}

// ---------------------------------------------------------------------------
// Store-enforced email uniqueness
// ---------------------------------------------------------------------------

/// Delegates to a memory store, but email lookups never see a holder. Every
/// duplicate then has to be caught by the store's own uniqueness check.
struct StaleEmailLookup(Arc<MemoryStore>);

#[async_trait]
impl UserStore for StaleEmailLookup {
    async fn insert_user(&self, input: &NewUser) -> Result<User, StoreError> {
        self.0.insert_user(input).await
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        self.0.find_user(id).await
    }

    async fn find_user_by_email(&self, _email: &str) -> Result<Option<User>, StoreError> {
        Ok(None)
    }

    async fn update_profile(
        &self,
        id: UserId,
        name: &str,
        email: &str,
        updated_at: Timestamp,
    ) -> Result<User, StoreError> {
        self.0.update_profile(id, name, email, updated_at).await
    }

    async fn update_password(
        &self,
        id: UserId,
        password_hash: &str,
        updated_at: Timestamp,
    ) -> Result<(), StoreError> {
        self.0.update_password(id, password_hash, updated_at).await
    }

    async fn set_active(
        &self,
        id: UserId,
        is_active: bool,
        updated_at: Timestamp,
    ) -> Result<bool, StoreError> {
        self.0.set_active(id, is_active, updated_at).await
    }

    async fn soft_delete_user(
        &self,
        id: UserId,
        deleted_at: Timestamp,
    ) -> Result<bool, StoreError> {
        self.0.soft_delete_user(id, deleted_at).await
    }

    async fn list_users(&self, limit: i64, offset: i64) -> Result<Vec<User>, StoreError> {
        self.0.list_users(limit, offset).await
    }

    async fn count_users(&self) -> Result<i64, StoreError> {
        self.0.count_users().await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.0.ping().await
    }
}

fn stale_lookup_service() -> (Arc<AuthService>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let auth = service_over(
        Arc::new(StaleEmailLookup(store.clone())),
        store.clone(),
        SessionPolicy::default(),
    );
    (auth, store)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registrations_create_exactly_one_user() {
    let (auth, store) = stale_lookup_service();

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let auth = Arc::clone(&auth);
            tokio::spawn(async move {
                auth.register("race@example.com", &format!("Racer {i}"), TEST_PASSWORD)
                    .await
            })
        })
        .collect();

    let mut created = 0;
    let mut duplicates = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => created += 1,
            Err(CoreError::UserAlreadyExists) => duplicates += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(duplicates, 7);
    assert_eq!(store.count_users().await.unwrap(), 1);
}

#[tokio::test]
async fn update_profile_conflict_from_store_is_user_already_exists() {
    let (auth, _store) = stale_lookup_service();
    auth.register("held@example.com", "Held", TEST_PASSWORD)
        .await
        .unwrap();
    let user = auth
        .register("mover@example.com", "Mover", TEST_PASSWORD)
        .await
        .unwrap();

    assert_matches!(
        auth.update_profile(user.id, "Mover", "held@example.com").await,
        Err(CoreError::UserAlreadyExists)
    );
    let unchanged = auth.get_user(user.id).await.unwrap();
    assert_eq!(unchanged.email, "mover@example.com");
}
