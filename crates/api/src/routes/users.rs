//! Route definitions for the `/users` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// Routes mounted at `/users`. All require auth; mutations are self-only.
///
/// ```text
/// GET    /                -> list_users
/// GET    /{id}            -> get_user
/// PUT    /{id}            -> update_profile
/// DELETE /{id}            -> delete_user
/// POST   /{id}/password   -> change_password
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(users::list_users))
        .route(
            "/{id}",
            get(users::get_user)
                .put(users::update_profile)
                .delete(users::delete_user),
        )
        .route("/{id}/password", post(users::change_password))
}
