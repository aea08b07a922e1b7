//! Access key credentials for the queue service.

use crate::error::ConfigurationError;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

#[cfg(test)]
#[path = "credentials_tests.rs"]
mod tests;

/// Environment variable holding the access key id
pub const ACCESS_KEY_ENV: &str = "AWS_ACCESS_KEY_ID";

/// Environment variable holding the secret access key
pub const SECRET_KEY_ENV: &str = "AWS_SECRET_ACCESS_KEY";

/// Secret access key, wiped from memory when dropped
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey(String);

impl SecretKey {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Expose the secret for request signing
    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

/// Access key pair used to open transport clients.
///
/// Opaque to the rest of the crate: it is handed to transports and never
/// logged or persisted.
#[derive(Clone)]
pub struct Credentials {
    access_key: String,
    secret_key: SecretKey,
}

impl Credentials {
    pub fn new(access_key: impl Into<String>, secret_key: SecretKey) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key,
        }
    }

    /// Read credentials from `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY`
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let access_key = read_env(ACCESS_KEY_ENV)?;
        // The owned value moves into the wiping wrapper without a copy.
        let secret_key = read_env(SECRET_KEY_ENV).map(SecretKey::new)?;
        Ok(Self::new(access_key, secret_key))
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    pub fn secret_key(&self) -> &SecretKey {
        &self.secret_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &"<redacted>")
            .field("secret_key", &self.secret_key)
            .finish()
    }
}

fn read_env(key: &str) -> Result<String, ConfigurationError> {
    match std::env::var(key) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigurationError::Missing {
            key: key.to_string(),
        }),
    }
}
