use parking_lot::Mutex;

use super::AuditEvent;

/// In-memory recorder for audit events.
///
/// Shared between requests behind an `Arc`; events keep recording order.
///
/// # Example
///
/// ```
/// use shipment_core::audit::{AuditEvent, AuditEventKind, AuditOutcome, AuditTrail};
/// use shipment_core::PrincipalId;
///
/// let trail = AuditTrail::new();
/// trail.record(AuditEvent::new(
///     "req-123",
///     PrincipalId::new(1),
///     AuditEventKind::ShipmentCreated,
///     AuditOutcome::Success,
/// ));
///
/// assert_eq!(trail.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct AuditTrail {
    events: Mutex<Vec<AuditEvent>>,
}

impl AuditTrail {
    /// Creates an empty trail.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event.
    pub fn record(&self, event: AuditEvent) {
        self.events.lock().push(event);
    }

    /// Returns a snapshot of all recorded events.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().clone()
    }

    /// Returns the number of recorded events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns true if no events have been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Removes all recorded events.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}
