use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Opaque identifier of an authenticated actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(u64);

impl PrincipalId {
    /// Wraps a raw identifier.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PrincipalId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// Closed set of roles a principal can hold.
///
/// Authorization dispatches on this tag through the rule table in
/// [`authorize`](crate::authorize); there is no role hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular account: sees and creates only its own shipments
    #[default]
    Standard,
    /// Administrator: reviews every shipment and moves its status
    Admin,
}

impl Role {
    /// Returns `true` for [`Role::Admin`].
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Standard => write!(f, "standard"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// An authenticated actor, produced per request by the credential store.
///
/// Never persisted by the shipment core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Unique identifier for this principal
    pub id: PrincipalId,
    /// Display name
    pub name: String,
    /// Role flag
    pub role: Role,
}

impl Principal {
    /// Creates a principal with the standard role.
    pub fn standard(id: PrincipalId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            role: Role::Standard,
        }
    }

    /// Creates a principal with the admin role.
    pub fn admin(id: PrincipalId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            role: Role::Admin,
        }
    }

    /// Returns `true` if this principal holds the admin role.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Metadata about an incoming request.
///
/// Contains the request identifier and the principal resolved from the
/// bearer token, if any.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    /// Unique identifier for this request
    pub request_id: String,
    /// Authenticated principal, if any
    pub principal: Option<Principal>,
}
