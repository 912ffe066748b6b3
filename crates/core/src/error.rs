/// Domain error taxonomy for the authentication and user lifecycle.
///
/// Every variant maps to a stable machine-readable [`code`](CoreError::code).
/// Callers should match on the variant, never on the display text.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("email format is invalid")]
    InvalidEmail,

    #[error("name is required and must be between 1 and 255 characters")]
    InvalidName,

    /// Carries the specific reason (length bounds, wrong old password, ...).
    #[error("{0}")]
    InvalidPassword(String),

    #[error("user with this email already exists")]
    UserAlreadyExists,

    #[error("user not found")]
    UserNotFound,

    #[error("session not found")]
    SessionNotFound,

    #[error("session has expired")]
    SessionExpired,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Unexpected lower-layer failure. The detail is for logs only.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Stable error code surfaced to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::InvalidEmail => "INVALID_EMAIL",
            CoreError::InvalidName => "INVALID_NAME",
            CoreError::InvalidPassword(_) => "INVALID_PASSWORD",
            CoreError::UserAlreadyExists => "USER_ALREADY_EXISTS",
            CoreError::UserNotFound => "USER_NOT_FOUND",
            CoreError::SessionNotFound => "SESSION_NOT_FOUND",
            CoreError::SessionExpired => "SESSION_EXPIRED",
            CoreError::InvalidCredentials => "INVALID_CREDENTIALS",
            CoreError::Unauthorized(_) => "UNAUTHORIZED",
            CoreError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
