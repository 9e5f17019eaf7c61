//! Framework-agnostic view of an HTTP request.

use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;

use crate::credentials::BearerToken;
use crate::error::ValidationError;
use crate::request::RequestMeta;
use crate::tainted::Tainted;

use super::{ExtractMetadata, ExtractTaintedInputs};

/// Header carrying a caller-supplied request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Adapter between a framework request and the shipment core.
///
/// Holds plain owned data: method, path, headers and body. Framework
/// integrations build one per request; header names are case-insensitive.
///
/// The request id is taken from `X-Request-Id` when present, otherwise a
/// random UUID is generated at construction.
///
/// # Examples
///
/// ```
/// use shipment_core::web::{ExtractMetadata, ExtractTaintedInputs, RequestAdapter};
///
/// let adapter = RequestAdapter::new("GET", "/shipments/12")
///     .with_header("X-Request-Id", "req-12345")
///     .with_header("Authorization", "Bearer 1|abc");
///
/// assert_eq!(adapter.extract_metadata().request_id, "req-12345");
/// assert!(adapter.extract_tainted_inputs().bearer_token().is_some());
/// ```
#[derive(Clone)]
pub struct RequestAdapter {
    method: String,
    path: String,
    generated_id: String,
    headers: HashMap<String, String>,
    body: Option<String>,
}

impl RequestAdapter {
    /// Creates an adapter for `method` and `path`.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into().to_ascii_uppercase(),
            path: path.into(),
            generated_id: uuid::Uuid::new_v4().to_string(),
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Adds a header.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Sets the raw request body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets a JSON request body.
    pub fn with_json(self, body: &serde_json::Value) -> Self {
        self.with_body(body.to_string())
    }

    /// Returns the upper-cased method.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the request path without query string.
    pub fn path(&self) -> &str {
        self.path.split('?').next().unwrap_or_default()
    }

    /// Returns the effective request id.
    pub fn request_id(&self) -> &str {
        self.headers
            .get(REQUEST_ID_HEADER)
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
            .unwrap_or(self.generated_id.as_str())
    }
}

// Header values and the body may carry bearer tokens and passwords.
impl fmt::Debug for RequestAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestAdapter")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("request_id", &self.request_id())
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

// The principal comes from the bearer token, in `extract_authed`.
impl ExtractMetadata for RequestAdapter {
    fn extract_metadata(&self) -> RequestMeta {
        RequestMeta {
            request_id: self.request_id().to_string(),
            principal: None,
        }
    }
}

impl ExtractTaintedInputs for RequestAdapter {
    fn extract_tainted_inputs(&self) -> TaintedInputs {
        TaintedInputs {
            headers: self
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), Tainted::new(v.clone())))
                .collect(),
            body: self.body.clone().map(Tainted::new),
        }
    }
}

/// Untrusted inputs of one request.
///
/// Everything is wrapped in [`Tainted`]; JSON bodies are parsed into
/// tainted forms that still need validation.
#[derive(Clone)]
pub struct TaintedInputs {
    headers: HashMap<String, Tainted<String>>,
    body: Option<Tainted<String>>,
}

impl TaintedInputs {
    /// Returns a header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<Tainted<String>> {
        self.headers.get(&name.to_ascii_lowercase()).cloned()
    }

    /// Returns the bearer token from `Authorization`, if well-formed.
    pub fn bearer_token(&self) -> Option<BearerToken> {
        self.headers
            .get("authorization")
            .and_then(|h| BearerToken::from_authorization(&h.clone().into_inner()))
    }

    /// Parses the body as a JSON form; a missing or blank body is `{}`.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` on the `body` field when the body is not
    /// a JSON object of the expected shape.
    pub fn json<T: DeserializeOwned>(&self) -> Result<Tainted<T>, ValidationError> {
        let raw = self
            .body
            .clone()
            .map(Tainted::into_inner)
            .filter(|b| !b.trim().is_empty())
            .unwrap_or_else(|| "{}".to_string());

        serde_json::from_str(&raw)
            .map(Tainted::new)
            .map_err(|e| {
                tracing::debug!(error = %e, "rejected request body");
                ValidationError::single("body", "must be a valid JSON object")
            })
    }
}

impl fmt::Debug for TaintedInputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaintedInputs")
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("body", &self.body.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
