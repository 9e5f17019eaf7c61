use std::fmt;

use serde::{Deserialize, Deserializer};

/// Wrapper for passwords and bearer tokens.
///
/// Formats as `[REDACTED]` under both `Debug` and `Display`, so a password
/// or token embedded in a request struct cannot reach a log line by
/// accident. The value is reachable only through [`expose_secret`](Self::expose_secret).
///
/// # Examples
///
/// ```
/// use shipment_core::Secret;
///
/// let password = Secret::new("hunter22".to_string());
/// assert_eq!(format!("{:?}", password), "[REDACTED]");
/// assert_eq!(password.expose_secret(), "hunter22");
/// ```
// Do NOT derive Clone, Copy or Default: copies of credentials must be explicit.
pub struct Secret<T> {
    inner: T,
}

impl<T> Secret<T> {
    /// Wraps a sensitive value.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Explicitly exposes the secret value.
    ///
    /// Callers must not log or display the returned reference.
    pub fn expose_secret(&self) -> &T {
        &self.inner
    }
}

impl<T> From<T> for Secret<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

// No Deref/AsRef/Borrow: access goes through expose_secret only.
// No Serialize either: a secret is never written back out by accident.

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Secret<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Secret::new)
    }
}

impl<T> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}
