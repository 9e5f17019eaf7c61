use std::sync::Arc;

use super::{AuditEvent, AuditTrail};

/// `tracing` target for audit records.
pub const AUDIT_TARGET: &str = "shipment_audit";

/// Writes audit events to `tracing` and an optional shared trail.
///
/// A disabled emitter drops events without logging or recording them.
#[derive(Debug, Clone)]
pub struct AuditEmitter {
    enabled: bool,
    trail: Option<Arc<AuditTrail>>,
}

impl Default for AuditEmitter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl AuditEmitter {
    /// Creates an emitter without a trail.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            trail: None,
        }
    }

    /// Also records every emitted event into `trail`.
    pub fn with_trail(mut self, trail: Arc<AuditTrail>) -> Self {
        self.trail = Some(trail);
        self
    }

    /// Returns the attached trail, if any.
    pub fn trail(&self) -> Option<&Arc<AuditTrail>> {
        self.trail.as_ref()
    }

    /// Returns whether events are emitted at all.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Emits `event`.
    pub fn emit(&self, event: AuditEvent) {
        if !self.enabled {
            return;
        }

        tracing::info!(
            target: AUDIT_TARGET,
            request_id = %event.request_id(),
            principal = %event.principal(),
            kind = %event.kind(),
            outcome = %event.outcome(),
            action = ?event.action(),
            shipment = ?event.shipment().map(|id| id.get()),
            from_status = ?event.from_status().map(|s| s.as_str()),
            to_status = ?event.to_status().map(|s| s.as_str()),
            "audit event"
        );

        if let Some(trail) = &self.trail {
            trail.record(event);
        }
    }
}
