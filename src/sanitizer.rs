use std::fmt;

use crate::{Tainted, Verified};

/// Error returned when a tainted value fails validation.
///
/// Messages describe the rule that failed, never the rejected input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizationError {
    kind: SanitizationErrorKind,
    message: String,
}

impl SanitizationError {
    /// Creates a new sanitization error.
    pub fn new(kind: SanitizationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> SanitizationErrorKind {
        self.kind
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for SanitizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sanitization failed ({}): {}", self.kind, self.message)
    }
}

impl std::error::Error for SanitizationError {}

/// Kind of sanitization error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanitizationErrorKind {
    /// Input is empty or contains only whitespace.
    Empty,
    /// Input exceeds maximum allowed length.
    TooLong,
    /// Input contains control or non-printable characters.
    ContainsControlChars,
    /// Input format is malformed.
    MalformedInput,
    /// Numeric input is NaN, infinite, or outside its range.
    OutOfRange,
}

impl fmt::Display for SanitizationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty input"),
            Self::TooLong => write!(f, "input too long"),
            Self::ContainsControlChars => write!(f, "contains control characters"),
            Self::MalformedInput => write!(f, "malformed input"),
            Self::OutOfRange => write!(f, "out of range"),
        }
    }
}

/// Converts tainted input into verified input.
///
/// Implementations validate first and only then call
/// `Verified::new_unchecked`; on failure they return a
/// [`SanitizationError`] that does not echo the input.
pub trait Sanitizer<T> {
    /// Sanitizes a tainted value, returning a verified value on success.
    ///
    /// # Errors
    ///
    /// Returns `SanitizationError` if the input fails validation.
    fn sanitize(&self, input: Tainted<T>) -> Result<Verified<T>, SanitizationError>;
}

/// Validator for free-text fields: addresses, cargo/weight/truck
/// classifications, account names, phone numbers.
///
/// - trims leading and trailing whitespace
/// - rejects empty input (after trimming)
/// - rejects control characters
/// - enforces a maximum length in characters
///
/// # Examples
///
/// ```
/// use shipment_core::{Sanitizer, Tainted, TextSanitizer};
///
/// let sanitizer = TextSanitizer::new(255);
///
/// let cargo = sanitizer.sanitize(Tainted::new(" Refrigerated ".to_string())).unwrap();
/// assert_eq!(cargo.as_ref(), "Refrigerated");
///
/// assert!(sanitizer.sanitize(Tainted::new("   ".to_string())).is_err());
/// assert!(sanitizer.sanitize(Tainted::new("a\nb".to_string())).is_err());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TextSanitizer {
    max_len: usize,
}

impl TextSanitizer {
    /// Creates a text sanitizer with the given maximum length in characters.
    ///
    /// A `max_len` of zero is raised to one.
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len: max_len.max(1),
        }
    }

    /// Returns the maximum accepted length.
    pub fn max_len(&self) -> usize {
        self.max_len
    }
}

impl Sanitizer<String> for TextSanitizer {
    fn sanitize(&self, input: Tainted<String>) -> Result<Verified<String>, SanitizationError> {
        let raw = input.into_inner();
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(SanitizationError::new(
                SanitizationErrorKind::Empty,
                "is required",
            ));
        }

        if trimmed.chars().any(char::is_control) {
            return Err(SanitizationError::new(
                SanitizationErrorKind::ContainsControlChars,
                "must not contain control characters",
            ));
        }

        if trimmed.chars().count() > self.max_len {
            return Err(SanitizationError::new(
                SanitizationErrorKind::TooLong,
                format!("must not be longer than {} characters", self.max_len),
            ));
        }

        Ok(Verified::new_unchecked(trimmed.to_string()))
    }
}

/// Which axis a [`CoordinateSanitizer`] validates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Degrees north/south, within [-90, 90]
    Latitude,
    /// Degrees east/west, within [-180, 180]
    Longitude,
}

impl Axis {
    fn bound(self) -> f64 {
        match self {
            Axis::Latitude => 90.0,
            Axis::Longitude => 180.0,
        }
    }
}

/// Validator for a latitude or longitude in decimal degrees.
///
/// # Examples
///
/// ```
/// use shipment_core::{Axis, CoordinateSanitizer, Sanitizer, Tainted};
///
/// let lat = CoordinateSanitizer::new(Axis::Latitude);
/// assert!(lat.sanitize(Tainted::new(24.7136)).is_ok());
/// assert!(lat.sanitize(Tainted::new(91.0)).is_err());
/// assert!(lat.sanitize(Tainted::new(f64::NAN)).is_err());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CoordinateSanitizer {
    axis: Axis,
}

impl CoordinateSanitizer {
    /// Creates a sanitizer for the given axis.
    pub fn new(axis: Axis) -> Self {
        Self { axis }
    }
}

impl Sanitizer<f64> for CoordinateSanitizer {
    fn sanitize(&self, input: Tainted<f64>) -> Result<Verified<f64>, SanitizationError> {
        let value = input.into_inner();

        if !value.is_finite() {
            return Err(SanitizationError::new(
                SanitizationErrorKind::OutOfRange,
                "must be a finite number",
            ));
        }

        let bound = self.axis.bound();
        if !(-bound..=bound).contains(&value) {
            return Err(SanitizationError::new(
                SanitizationErrorKind::OutOfRange,
                format!("must be between -{} and {}", bound, bound),
            ));
        }

        Ok(Verified::new_unchecked(value))
    }
}

/// Validator for account e-mail addresses.
///
/// Accepts `local@domain.tld` shapes, trims and lowercases the result so
/// uniqueness checks are case-insensitive.
#[derive(Debug, Clone, Copy)]
pub struct EmailSanitizer {
    text: TextSanitizer,
}

impl EmailSanitizer {
    /// Creates an e-mail sanitizer with the given maximum length.
    pub fn new(max_len: usize) -> Self {
        Self {
            text: TextSanitizer::new(max_len),
        }
    }

    fn well_formed(address: &str) -> bool {
        let Some((local, domain)) = address.split_once('@') else {
            return false;
        };
        !local.is_empty()
            && !domain.contains('@')
            && !address.chars().any(char::is_whitespace)
            && domain
                .split_once('.')
                .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
            && !domain.ends_with('.')
    }
}

impl Sanitizer<String> for EmailSanitizer {
    fn sanitize(&self, input: Tainted<String>) -> Result<Verified<String>, SanitizationError> {
        let text = self.text.sanitize(input)?.into_inner();

        if !Self::well_formed(&text) {
            return Err(SanitizationError::new(
                SanitizationErrorKind::MalformedInput,
                "must be a valid email address",
            ));
        }

        Ok(Verified::new_unchecked(text.to_lowercase()))
    }
}
