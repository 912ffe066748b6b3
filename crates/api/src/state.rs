use std::sync::Arc;

use crate::auth::AuthService;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// User and session lifecycle orchestration.
    pub auth: Arc<AuthService>,
}
