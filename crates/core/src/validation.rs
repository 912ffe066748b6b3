//! Input validation for registration and profile updates.
//!
//! Checks run in a fixed order and the first failure wins; errors are never
//! accumulated.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

/// Minimum accepted password length in bytes.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum accepted password length in bytes.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum name length in bytes.
pub const MAX_NAME_LENGTH: usize = 255;

/// Maximum email length in bytes.
pub const MAX_EMAIL_LENGTH: usize = 255;

/// `local@domain.tld` with an alphabetic TLD of at least two characters.
const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN).expect("valid regex"));

/// Reject blank, over-long, or malformed email addresses.
pub fn validate_email(email: &str) -> Result<(), CoreError> {
    if email.trim().is_empty() || email.len() > MAX_EMAIL_LENGTH || !EMAIL_RE.is_match(email) {
        return Err(CoreError::InvalidEmail);
    }
    Ok(())
}

/// Reject blank (whitespace-only) or over-long names.
pub fn validate_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() || name.len() > MAX_NAME_LENGTH {
        return Err(CoreError::InvalidName);
    }
    Ok(())
}

/// Enforce the password length bounds.
pub fn validate_password(password: &str) -> Result<(), CoreError> {
    let len = password.len();
    if len < MIN_PASSWORD_LENGTH {
        return Err(CoreError::InvalidPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err(CoreError::InvalidPassword(format!(
            "password must be at most {MAX_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Registration input: email, then name, then password.
pub fn validate_registration(email: &str, name: &str, password: &str) -> Result<(), CoreError> {
    validate_email(email)?;
    validate_name(name)?;
    validate_password(password)
}

/// Profile update input: same email and name rules as registration.
pub fn validate_profile(email: &str, name: &str) -> Result<(), CoreError> {
    validate_email(email)?;
    validate_name(name)
}
