/// A value that passed validation.
///
/// Produced only by sanitizers in this crate; there is no public
/// constructor and no `From<T>` impl, so holding a `Verified<T>` proves the
/// value went through a validation path.
///
/// ```compile_fail
/// use shipment_core::Verified;
///
/// let forged = Verified::new("data".to_string());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified<T> {
    inner: T,
}

impl<T> Verified<T> {
    /// Wraps a value that the caller has already validated.
    pub(crate) fn new_unchecked(value: T) -> Self {
        Self { inner: value }
    }

    /// Consumes the wrapper and returns the validated value.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> AsRef<T> for Verified<T> {
    fn as_ref(&self) -> &T {
        &self.inner
    }
}
