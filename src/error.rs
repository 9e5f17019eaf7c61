use std::fmt;

/// Errors returned by shipment lifecycle and credential operations.
///
/// Every variant is a local decision returned synchronously; policy denials
/// always surface as [`Error::Violation`], never as an empty result.
#[derive(Debug)]
pub enum Error {
    /// Malformed or missing input
    Validation(ValidationError),
    /// Bad credentials on login
    Auth(AuthError),
    /// Missing principal or a policy denial
    Violation(Violation),
    /// No such record
    NotFound(NotFound),
    /// Status value outside the enumerated set
    InvalidStatus(InvalidStatus),
    /// Infrastructure failure in the backing store
    Storage(StorageError),
}

impl Error {
    /// Returns the flat category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::Auth(_) => ErrorKind::Auth,
            Error::Violation(v) => match v.kind {
                ViolationKind::Unauthenticated => ErrorKind::Unauthenticated,
                ViolationKind::Forbidden { .. } => ErrorKind::Forbidden,
            },
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::InvalidStatus(_) => ErrorKind::InvalidStatus,
            Error::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Validation(e) => write!(f, "{}", e),
            Error::Auth(e) => write!(f, "{}", e),
            Error::Violation(v) => write!(f, "Policy violation: {}", v),
            Error::NotFound(e) => write!(f, "{}", e),
            Error::InvalidStatus(e) => write!(f, "{}", e),
            Error::Storage(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Error::Validation(e)
    }
}

impl From<AuthError> for Error {
    fn from(e: AuthError) -> Self {
        Error::Auth(e)
    }
}

impl From<Violation> for Error {
    fn from(v: Violation) -> Self {
        Error::Violation(v)
    }
}

impl From<NotFound> for Error {
    fn from(e: NotFound) -> Self {
        Error::NotFound(e)
    }
}

impl From<InvalidStatus> for Error {
    fn from(e: InvalidStatus) -> Self {
        Error::InvalidStatus(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Error::Storage(e)
    }
}

/// Flat error category, used by the request boundary to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`Error::Validation`]
    Validation,
    /// See [`Error::Auth`]
    Auth,
    /// No valid principal was presented
    Unauthenticated,
    /// Authenticated, but the policy denied the operation
    Forbidden,
    /// See [`Error::NotFound`]
    NotFound,
    /// See [`Error::InvalidStatus`]
    InvalidStatus,
    /// See [`Error::Storage`]
    Storage,
}

/// A policy violation with details about what failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// The kind of violation that occurred
    pub kind: ViolationKind,
    /// Human-readable message explaining the violation
    pub message: String,
}

impl Violation {
    /// Creates a new violation.
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Creates the denial reported for `operation`.
    ///
    /// The message is constant so a denial never describes the resource.
    pub fn forbidden(operation: &'static str) -> Self {
        Self::new(ViolationKind::Forbidden { operation }, "Forbidden")
    }

    /// Creates the violation reported when no principal is present.
    pub fn unauthenticated() -> Self {
        Self::new(ViolationKind::Unauthenticated, "Unauthenticated")
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Violation {}

/// The kind of policy violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    /// Authentication is required but missing
    Unauthenticated,
    /// The principal may not perform the operation
    Forbidden {
        /// The operation that was denied
        operation: &'static str,
    },
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::Unauthenticated => write!(f, "Unauthenticated"),
            ViolationKind::Forbidden { operation } => write!(f, "Forbidden for '{}'", operation),
        }
    }
}

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Wire name of the field (e.g. `pickup_address`)
    pub field: String,
    /// Why the value was rejected
    pub message: String,
}

/// Input rejected before any write took place.
///
/// Collects every offending field so the caller can correct them in one
/// round trip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationError {
    fields: Vec<FieldError>,
}

impl ValidationError {
    /// Creates an empty error; see [`ValidationError::into_result`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an error for a single field.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut error = Self::new();
        error.push(field, message);
        error
    }

    /// Records a rejected field.
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Returns the rejected fields in the order they were recorded.
    pub fn fields(&self) -> &[FieldError] {
        &self.fields
    }

    /// Returns `true` if `field` was rejected.
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.field == field)
    }

    /// Returns `true` if no field was rejected.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// `Ok(())` when nothing was recorded, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation failed")?;
        for (i, field) in self.fields.iter().enumerate() {
            let sep = if i == 0 { ": " } else { ", " };
            write!(f, "{}{} ({})", sep, field.field, field.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Credential check failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown account or wrong password; the two are not distinguished
    InvalidCredentials,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Invalid credentials."),
        }
    }
}

impl std::error::Error for AuthError {}

/// No record with the requested identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotFound {
    resource: &'static str,
    id: String,
}

impl NotFound {
    /// Creates a not-found error for `resource` with identifier `id`.
    pub fn new(resource: &'static str, id: impl ToString) -> Self {
        Self {
            resource,
            id: id.to_string(),
        }
    }

    /// Returns the resource kind (e.g. `"shipment"`).
    pub fn resource(&self) -> &'static str {
        self.resource
    }

    /// Returns the identifier that was looked up.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for NotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} not found", self.resource, self.id)
    }
}

impl std::error::Error for NotFound {}

/// A status string outside `pending`, `in_progress`, `delivered`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidStatus {
    value: String,
}

impl InvalidStatus {
    /// Creates an error for the rejected `value`.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Returns the rejected value.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for InvalidStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid status '{}': expected one of pending, in_progress, delivered",
            self.value
        )
    }
}

impl std::error::Error for InvalidStatus {}

/// Failure of the backing store.
///
/// The cause is kept for logging; callers only see a generic failure.
#[derive(Debug)]
pub struct StorageError {
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StorageError {
    /// Creates a storage error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a storage error wrapping an underlying cause.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "storage failure: {}: {}", self.message, source),
            None => write!(f, "storage failure: {}", self.message),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}
