//! Request extractors shared by handlers.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.
//! - [`client::ClientMeta`] -- Caller IP address and user agent for session records.

pub mod auth;
pub mod client;
