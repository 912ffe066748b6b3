//! Argon2id password hashing and verification.
//!
//! All password hashes use the Argon2id variant with a cryptographically random
//! salt generated via [`OsRng`]. The PHC string format is used for storage so
//! that algorithm parameters and salt are embedded in the hash itself, which
//! means verification works regardless of the cost this hasher is built with.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use std::sync::OnceLock;

use argon2::{Algorithm, Argon2, Params, Version};

/// Plaintext behind the throwaway hash used by [`PasswordHasher::verify_dummy`].
const DUMMY_PASSWORD: &str = "gatehouse-dummy-password";

/// Salted, adaptive-cost password hasher.
#[derive(Debug, Clone, Default)]
pub struct PasswordHasher {
    params: Params,
    dummy_hash: OnceLock<String>,
}

impl PasswordHasher {
    /// Build a hasher with explicit Argon2 cost parameters.
    pub fn with_params(params: Params) -> Self {
        Self {
            params,
            dummy_hash: OnceLock::new(),
        }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a plaintext password with a fresh random salt.
    ///
    /// Returns the PHC-formatted hash string (algorithm, params, salt, hash).
    pub fn hash(&self, password: &str) -> Result<String, argon2::password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self.argon2().hash_password(password.as_bytes(), &salt)?;
        Ok(hash.to_string())
    }

    /// Verify a plaintext password against a stored PHC hash.
    ///
    /// Returns `Ok(false)` on mismatch; `Err` only when the stored hash is
    /// malformed.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
        let parsed_hash = PasswordHash::new(hash)?;
        match self.argon2().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Run one verification against a throwaway hash built with this
    /// hasher's cost, discarding the result.
    ///
    /// Callers with no stored hash to check use this so that a missing
    /// account costs as much as a wrong password.
    pub fn verify_dummy(&self, password: &str) {
        let dummy = self
            .dummy_hash
            .get_or_init(|| self.hash(DUMMY_PASSWORD).unwrap_or_default());
        if let Err(e) = self.verify(password, dummy) {
            tracing::debug!(error = %e, "Dummy password verification failed");
        }
    }
}
