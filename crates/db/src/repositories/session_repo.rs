//! PostgreSQL repository for the `user_sessions` table.

use async_trait::async_trait;
use gatehouse_core::types::{SessionId, Timestamp, UserId};

use crate::error::StoreError;
use crate::models::session::{NewSession, Session};
use crate::repositories::SessionStore;
use crate::DbPool;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, user_id, refresh_token_hash, ip_address, user_agent, expires_at, created_at";

/// `user_sessions` table access over a shared pool.
#[derive(Clone)]
pub struct PgSessionRepo {
    pool: DbPool,
}

impl PgSessionRepo {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionRepo {
    async fn insert_session(&self, input: &NewSession) -> Result<Session, StoreError> {
        let query = format!(
            "INSERT INTO user_sessions
                (id, user_id, refresh_token_hash, ip_address, user_agent, expires_at, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        let session = sqlx::query_as::<_, Session>(&query)
            .bind(input.id)
            .bind(input.user_id)
            .bind(&input.refresh_token_hash)
            .bind(&input.ip_address)
            .bind(&input.user_agent)
            .bind(input.expires_at)
            .bind(input.created_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(session)
    }

    async fn find_session(&self, id: SessionId) -> Result<Option<Session>, StoreError> {
        let query = format!("SELECT {COLUMNS} FROM user_sessions WHERE id = $1");
        let session = sqlx::query_as::<_, Session>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(session)
    }

    async fn find_session_by_token_hash(
        &self,
        refresh_token_hash: &str,
    ) -> Result<Option<Session>, StoreError> {
        let query = format!("SELECT {COLUMNS} FROM user_sessions WHERE refresh_token_hash = $1");
        let session = sqlx::query_as::<_, Session>(&query)
            .bind(refresh_token_hash)
            .fetch_optional(&self.pool)
            .await?;
        Ok(session)
    }

    async fn list_sessions_for_user(&self, user_id: UserId) -> Result<Vec<Session>, StoreError> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_sessions WHERE user_id = $1 ORDER BY created_at DESC"
        );
        let sessions = sqlx::query_as::<_, Session>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(sessions)
    }

    async fn delete_session(&self, id: SessionId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_expired_sessions(&self, now: Timestamp) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
