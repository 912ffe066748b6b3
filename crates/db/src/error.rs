/// Failure reported by a storage implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write (e.g. duplicate live email).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The row targeted by an update does not exist (or is soft-deleted).
    #[error("Row not found")]
    NotFound,

    /// Any other database failure.
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

/// PostgreSQL unique-violation SQLSTATE.
const UNIQUE_VIOLATION: &str = "23505";

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                let constraint = db_err.constraint().unwrap_or("unknown");
                StoreError::Conflict(format!("unique constraint violated: {constraint}"))
            }
            _ => StoreError::Database(err),
        }
    }
}
