pub mod auth;
pub mod health;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /register                      register (public)
/// /login                         login (public)
/// /token/refresh                 refresh access token (public)
/// /logout                        delete one own session
/// /logout-all                    delete all own sessions
///
/// /users                         list
/// /users/{id}                    get, update (self), delete (self)
/// /users/{id}/password           change password (self)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .nest("/users", users::router())
}
