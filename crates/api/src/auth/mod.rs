//! Authentication primitives and the service that composes them.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- JWT access tokens, opaque refresh tokens, and their storage digest.
//! - [`service`] -- registration, login, refresh, logout and profile flows.

pub mod jwt;
pub mod password;
pub mod service;

pub use service::AuthService;
