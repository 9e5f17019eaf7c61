//! Shipment lifecycle and access control for a freight-booking backend.
//!
//! Customers create shipment requests and read their own; administrators
//! read everything and move shipments through
//! `pending -> in_progress -> delivered`. Access is enforced through:
//! - **Explicit context**: every operation takes a [`Ctx`] carrying the
//!   request id and the authenticated [`Principal`]
//! - **A single policy table**: [`authorize`] decides, [`PolicyGate`] turns
//!   denials into `Forbidden` errors
//! - **Taint tracking**: request input stays [`Tainted<T>`] until a
//!   [`Sanitizer`] or validator accepts it
//!
//! # Core Types
//!
//! - [`ShipmentService`]: create, list, read and status-update operations
//! - [`ShipmentRepository`]: storage seam, in-memory or JSON file
//! - [`CredentialStore`]: accounts and bearer tokens
//! - [`Secret<T>`]: redacts passwords and tokens in logs
//! - [`web::Api`]: framework-agnostic HTTP boundary
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use shipment_core::{
//!     Ctx, InMemoryCredentialStore, InMemoryShipmentRepository, Principal, PrincipalId,
//!     ShipmentInput, ShipmentService, ShipmentStatus, Tainted,
//! };
//!
//! let service = ShipmentService::new(
//!     Arc::new(InMemoryShipmentRepository::new()),
//!     Arc::new(InMemoryCredentialStore::new()),
//! );
//!
//! let alice = Ctx::new("req-1")
//!     .authenticate(Some(Principal::standard(PrincipalId::new(1), "Alice")))
//!     .expect("principal present");
//!
//! let input = ShipmentInput {
//!     pickup_address: Some("King Fahd Rd, Riyadh".into()),
//!     pickup_latitude: Some(24.7136.into()),
//!     pickup_longitude: Some(46.6753.into()),
//!     dropoff_address: Some("Corniche Rd, Jeddah".into()),
//!     dropoff_latitude: Some(21.5433.into()),
//!     dropoff_longitude: Some(39.1728.into()),
//!     cargo_type: Some("General".into()),
//!     weight: Some("1000-5000 kg".into()),
//!     truck_type: Some("Flatbed".into()),
//! };
//!
//! let shipment = service.create_shipment(&alice, Tainted::new(input)).unwrap();
//! assert_eq!(shipment.status(), ShipmentStatus::Pending);
//!
//! // Only admins change status.
//! let denied = service.update_status(&alice, shipment.id(), Tainted::new("delivered".to_string()));
//! assert!(denied.is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod audit;
mod config;
mod context;
mod credentials;
mod error;
mod gate;
mod input;
mod logging;
mod policy;
mod repository;
mod request;
mod sanitizer;
mod secret;
mod service;
mod shipment;
mod state;
mod tainted;
mod verified;
pub mod web;

#[cfg(test)]
mod test_utils;

pub use config::{AuditConfig, AuthConfig, ConfigError, LimitsConfig, ServiceConfig, StorageConfig};
pub use context::Ctx;
pub use credentials::{
    Account, BearerToken, CredentialStore, InMemoryCredentialStore, IssuedToken, ProfileDirectory,
    DEFAULT_HASH_COST,
};
pub use error::{
    AuthError, Error, ErrorKind, FieldError, InvalidStatus, NotFound, StorageError,
    ValidationError, Violation, ViolationKind,
};
pub use gate::PolicyGate;
pub use input::{
    LoginInput, RawCoordinate, RegistrationInput, RegistrationValidator, ShipmentInput,
    ShipmentValidator, VerifiedRegistration,
};
pub use logging::RequestLog;
pub use policy::{authorize, Decision, Operation};
pub use repository::{
    InMemoryShipmentRepository, JsonFileShipmentRepository, ShipmentRepository, StatusChange,
};
pub use request::{Principal, PrincipalId, RequestMeta, Role};
pub use sanitizer::{
    Axis, CoordinateSanitizer, EmailSanitizer, SanitizationError, SanitizationErrorKind,
    Sanitizer, TextSanitizer,
};
pub use secret::Secret;
pub use service::ShipmentService;
pub use shipment::{
    Location, NewShipment, OwnerSummary, Shipment, ShipmentId, ShipmentStatus, ShipmentView,
};
pub use state::{Authed, Unauthed};
pub use tainted::Tainted;
pub use verified::Verified;
