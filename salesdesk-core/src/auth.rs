//! Identity precondition gating all session operations.
//!
//! The core never sees credentials. The identity provider hands over a
//! verified email address; the only check here is that its domain matches
//! the configured allowed domain. This runs before any data loads.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("access denied: only @{allowed_domain} accounts are allowed")]
    AccessDenied { allowed_domain: String },

    #[error("malformed email address: {0}")]
    MalformedEmail(String),
}

/// A verified, authorized analyst identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub email: String,
}

/// Authorize a verified email against the allowed domain.
///
/// The domain comparison ignores ASCII case; everything else is exact.
pub fn authorize(email: &str, allowed_domain: &str) -> Result<UserIdentity, AuthError> {
    let (_, domain) = email
        .split_once('@')
        .ok_or_else(|| AuthError::MalformedEmail(email.to_string()))?;
    if domain.eq_ignore_ascii_case(allowed_domain) {
        Ok(UserIdentity {
            email: email.to_string(),
        })
    } else {
        Err(AuthError::AccessDenied {
            allowed_domain: allowed_domain.to_string(),
        })
    }
}
