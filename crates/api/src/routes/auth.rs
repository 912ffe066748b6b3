//! Route definitions for authentication and session endpoints.

use axum::routing::post;
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted directly under `/api/v1`.
///
/// ```text
/// POST /register       -> register
/// POST /login          -> login
/// POST /token/refresh  -> refresh
/// POST /logout         -> logout (requires auth)
/// POST /logout-all     -> logout_all (requires auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/token/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/logout-all", post(auth::logout_all))
}
