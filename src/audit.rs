//! Audit events for shipment lifecycle decisions.
//!
//! Creations, status changes and policy denials each produce an
//! [`AuditEvent`]. [`AuditEmitter`] writes them as structured `tracing`
//! records under the `shipment_audit` target and, when given one, appends
//! them to a shared [`AuditTrail`].
//!
//! Events hold identifiers and status names only: never addresses, cargo
//! details, passwords or tokens.

mod emitter;
mod event;
mod trail;

pub use emitter::{AuditEmitter, AUDIT_TARGET};
pub use event::{AuditEvent, AuditEventKind, AuditOutcome};
pub use trail::AuditTrail;
