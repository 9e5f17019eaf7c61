use std::fmt;

/// Wrapper for request input that has not been validated yet.
///
/// Everything that crosses the request boundary (form fields, path
/// segments, status strings) arrives as `Tainted<T>`. The value can only be
/// read back by a [`Sanitizer`](crate::Sanitizer) inside this crate, which
/// turns it into a [`Verified<T>`](crate::Verified) or a rejection.
///
/// # Examples
///
/// ```
/// use shipment_core::{Sanitizer, TextSanitizer, Tainted};
///
/// let raw = Tainted::new("  Riyadh, Olaya St  ".to_string());
/// let address = TextSanitizer::new(255).sanitize(raw).unwrap();
/// assert_eq!(address.as_ref(), "Riyadh, Olaya St");
/// ```
#[derive(Clone)]
pub struct Tainted<T> {
    // Must stay private: reading it directly skips validation.
    inner: T,
}

impl<T> Tainted<T> {
    /// Wraps an untrusted value.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Extracts the value for validation.
    ///
    /// Only sanitizers call this, immediately before deciding whether to
    /// promote the value to `Verified<T>`.
    pub(crate) fn into_inner(self) -> T {
        self.inner
    }

    /// Applies `f` to the wrapped value, keeping it tainted.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Tainted<U> {
        Tainted::new(f(self.inner))
    }
}

impl<T: fmt::Debug> fmt::Debug for Tainted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tainted")
            .field("inner", &self.inner)
            .finish()
    }
}
