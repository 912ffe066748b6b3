/// Users and sessions are keyed by random (v4) UUIDs generated by the service.
pub type UserId = uuid::Uuid;

/// Identifier of a refresh-token session.
pub type SessionId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
