//! Access policy: the single rule table for shipment operations.

use std::fmt;

use crate::request::{Principal, PrincipalId, Role};

/// An operation a principal asks to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Create a shipment owned by the caller
    Create,
    /// List the caller's own shipments
    ListOwn,
    /// Read one shipment owned by `owner`
    ReadOne {
        /// Owner of the shipment being read
        owner: PrincipalId,
    },
    /// List every shipment in the system
    ListAll,
    /// Change the status of any shipment
    UpdateStatus,
}

impl Operation {
    /// Stable name used in violations, logs and audit events.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::ListOwn => "list_own",
            Operation::ReadOne { .. } => "read_one",
            Operation::ListAll => "list_all",
            Operation::UpdateStatus => "update_status",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of a policy check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The operation may proceed
    Allow,
    /// The operation must be rejected as `Forbidden`
    Deny,
}

impl Decision {
    /// Returns `true` for [`Decision::Allow`].
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allow)
    }

    fn from_bool(allowed: bool) -> Self {
        if allowed {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }
}

/// Decides whether `principal` may perform `operation`.
///
/// | Operation | Standard | Admin |
/// |---|---|---|
/// | `Create`, `ListOwn` | allow | allow |
/// | `ReadOne { owner }` | only if `owner == principal.id` | allow |
/// | `ListAll`, `UpdateStatus` | deny | allow |
///
/// Anonymous callers never get here: a missing principal is rejected as
/// unauthenticated when the request context is built.
///
/// # Examples
///
/// ```
/// use shipment_core::{authorize, Decision, Operation, Principal, PrincipalId};
///
/// let alice = Principal::standard(PrincipalId::new(1), "Alice");
///
/// assert_eq!(authorize(&alice, Operation::ListOwn), Decision::Allow);
/// assert_eq!(authorize(&alice, Operation::ListAll), Decision::Deny);
/// assert_eq!(
///     authorize(&alice, Operation::ReadOne { owner: PrincipalId::new(2) }),
///     Decision::Deny
/// );
/// ```
pub fn authorize(principal: &Principal, operation: Operation) -> Decision {
    match (principal.role, operation) {
        (_, Operation::Create | Operation::ListOwn) => Decision::Allow,
        (Role::Admin, _) => Decision::Allow,
        (Role::Standard, Operation::ReadOne { owner }) => Decision::from_bool(owner == principal.id),
        (Role::Standard, Operation::ListAll | Operation::UpdateStatus) => Decision::Deny,
    }
}
