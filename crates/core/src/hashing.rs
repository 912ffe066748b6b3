//! Digests for opaque tokens that are looked up but never read back.
//!
//! Refresh tokens are persisted only as [`token_digest`] output, so the
//! issuing path and the lookup path must agree byte for byte.

use sha2::{Digest, Sha256};

/// Length of a [`token_digest`] string. Matches the `refresh_token_hash` column.
pub const TOKEN_DIGEST_LEN: usize = 64;

/// Lowercase hex SHA-256 of an opaque token.
pub fn token_digest(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}
