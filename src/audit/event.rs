use std::fmt;

use chrono::{DateTime, Utc};

use crate::request::PrincipalId;
use crate::shipment::{ShipmentId, ShipmentStatus};

/// Kind of audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditEventKind {
    /// A shipment was created
    ShipmentCreated,
    /// A shipment status was written
    StatusChanged,
    /// The access policy denied an operation
    AccessDenied,
}

impl fmt::Display for AuditEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditEventKind::ShipmentCreated => write!(f, "shipment_created"),
            AuditEventKind::StatusChanged => write!(f, "status_changed"),
            AuditEventKind::AccessDenied => write!(f, "access_denied"),
        }
    }
}

/// Outcome of an audited operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    /// Operation succeeded
    Success,
    /// Operation was denied by policy
    Denied,
    /// Operation failed in storage
    Error,
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditOutcome::Success => write!(f, "success"),
            AuditOutcome::Denied => write!(f, "denied"),
            AuditOutcome::Error => write!(f, "error"),
        }
    }
}

/// A structured audit record.
///
/// # Example
///
/// ```
/// use shipment_core::audit::{AuditEvent, AuditEventKind, AuditOutcome};
/// use shipment_core::{PrincipalId, ShipmentId, ShipmentStatus};
///
/// let event = AuditEvent::new(
///     "req-123",
///     PrincipalId::new(1),
///     AuditEventKind::StatusChanged,
///     AuditOutcome::Success,
/// )
/// .with_action("update_status")
/// .with_shipment(ShipmentId::new(7))
/// .with_transition(ShipmentStatus::Pending, ShipmentStatus::InProgress);
///
/// assert_eq!(event.shipment(), Some(ShipmentId::new(7)));
/// assert_eq!(event.to_status(), Some(ShipmentStatus::InProgress));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEvent {
    request_id: String,
    principal: PrincipalId,
    kind: AuditEventKind,
    outcome: AuditOutcome,
    action: Option<&'static str>,
    shipment: Option<ShipmentId>,
    from_status: Option<ShipmentStatus>,
    to_status: Option<ShipmentStatus>,
    at: DateTime<Utc>,
}

impl AuditEvent {
    /// Creates an event stamped with the current time.
    pub fn new(
        request_id: impl Into<String>,
        principal: PrincipalId,
        kind: AuditEventKind,
        outcome: AuditOutcome,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            principal,
            kind,
            outcome,
            action: None,
            shipment: None,
            from_status: None,
            to_status: None,
            at: Utc::now(),
        }
    }

    /// Sets the operation name.
    pub fn with_action(mut self, action: &'static str) -> Self {
        self.action = Some(action);
        self
    }

    /// Sets the affected shipment.
    pub fn with_shipment(mut self, id: ShipmentId) -> Self {
        self.shipment = Some(id);
        self
    }

    /// Records a status change from `from` to `to`.
    pub fn with_transition(mut self, from: ShipmentStatus, to: ShipmentStatus) -> Self {
        self.from_status = Some(from);
        self.to_status = Some(to);
        self
    }

    /// Returns the request identifier.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Returns the acting principal.
    pub fn principal(&self) -> PrincipalId {
        self.principal
    }

    /// Returns the event kind.
    pub fn kind(&self) -> AuditEventKind {
        self.kind
    }

    /// Returns the outcome.
    pub fn outcome(&self) -> AuditOutcome {
        self.outcome
    }

    /// Returns the operation name, if set.
    pub fn action(&self) -> Option<&'static str> {
        self.action
    }

    /// Returns the affected shipment, if any.
    pub fn shipment(&self) -> Option<ShipmentId> {
        self.shipment
    }

    /// Returns the status before the change, if recorded.
    pub fn from_status(&self) -> Option<ShipmentStatus> {
        self.from_status
    }

    /// Returns the status after the change, if recorded.
    pub fn to_status(&self) -> Option<ShipmentStatus> {
        self.to_status
    }

    /// Returns when the event was created.
    pub fn at(&self) -> DateTime<Utc> {
        self.at
    }
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AuditEvent[kind={}, outcome={}, request_id={}, principal={}",
            self.kind, self.outcome, self.request_id, self.principal
        )?;

        if let Some(action) = self.action {
            write!(f, ", action={}", action)?;
        }
        if let Some(id) = self.shipment {
            write!(f, ", shipment={}", id)?;
        }
        if let (Some(from), Some(to)) = (self.from_status, self.to_status) {
            write!(f, ", status={}->{}", from, to)?;
        }

        write!(f, "]")
    }
}
