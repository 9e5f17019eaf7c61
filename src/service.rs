//! Shipment lifecycle operations.
//!
//! Every operation takes an authenticated [`Ctx`], consults the access
//! policy through [`PolicyGate`], and only then touches the repository.
//! Denials, creations and status writes are audited.

use std::sync::Arc;

use chrono::Utc;

use crate::audit::{AuditEmitter, AuditEvent, AuditEventKind, AuditOutcome};
use crate::config::ServiceConfig;
use crate::context::Ctx;
use crate::credentials::ProfileDirectory;
use crate::error::{Error, NotFound, StorageError};
use crate::gate::PolicyGate;
use crate::input::{ShipmentInput, ShipmentValidator};
use crate::policy::Operation;
use crate::repository::ShipmentRepository;
use crate::request::PrincipalId;
use crate::shipment::{OwnerSummary, Shipment, ShipmentId, ShipmentStatus, ShipmentView};
use crate::tainted::Tainted;

/// The shipment lifecycle service.
///
/// Holds no per-request state: one instance serves every request, and two
/// requests only interact through the repository.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use shipment_core::{
///     Ctx, InMemoryCredentialStore, InMemoryShipmentRepository, Principal, PrincipalId,
///     ShipmentService,
/// };
///
/// let service = ShipmentService::new(
///     Arc::new(InMemoryShipmentRepository::new()),
///     Arc::new(InMemoryCredentialStore::new()),
/// );
/// let ctx = Ctx::new("req-1")
///     .authenticate(Some(Principal::standard(PrincipalId::new(1), "Alice")))
///     .unwrap();
///
/// assert!(service.list_own_shipments(&ctx).unwrap().is_empty());
/// assert!(service.list_all_shipments(&ctx).is_err());
/// ```
#[derive(Clone)]
pub struct ShipmentService {
    repository: Arc<dyn ShipmentRepository>,
    directory: Arc<dyn ProfileDirectory>,
    validator: ShipmentValidator,
    audit: AuditEmitter,
}

impl std::fmt::Debug for ShipmentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShipmentService")
            .field("validator", &self.validator)
            .field("audit", &self.audit)
            .finish_non_exhaustive()
    }
}

impl ShipmentService {
    /// Creates a service with default limits and auditing enabled.
    pub fn new(
        repository: Arc<dyn ShipmentRepository>,
        directory: Arc<dyn ProfileDirectory>,
    ) -> Self {
        Self::with_config(repository, directory, &ServiceConfig::default())
    }

    /// Creates a service using the limits and audit switch of `config`.
    pub fn with_config(
        repository: Arc<dyn ShipmentRepository>,
        directory: Arc<dyn ProfileDirectory>,
        config: &ServiceConfig,
    ) -> Self {
        Self {
            repository,
            directory,
            validator: config.shipment_validator(),
            audit: AuditEmitter::new(config.audit.enabled),
        }
    }

    /// Replaces the audit emitter, e.g. to attach an
    /// [`AuditTrail`](crate::audit::AuditTrail).
    pub fn with_audit(mut self, audit: AuditEmitter) -> Self {
        self.audit = audit;
        self
    }

    /// Creates a shipment owned by the caller, with status `pending`.
    ///
    /// # Errors
    ///
    /// - `Validation` naming every missing or invalid field; nothing is stored
    /// - `Storage` if the insert fails
    pub fn create_shipment(
        &self,
        ctx: &Ctx,
        input: Tainted<ShipmentInput>,
    ) -> Result<Shipment, Error> {
        self.require(ctx, Operation::Create, None)?;

        let principal = ctx.principal();
        let new = match self.validator.validate(input, principal.id, Utc::now()) {
            Ok(new) => new,
            Err(e) => {
                ctx.log()
                    .debug(format_args!("rejected shipment input: {}", e));
                return Err(e.into());
            }
        };

        let shipment = self
            .repository
            .insert(new)
            .map_err(|e| self.storage_failure(ctx, Operation::Create, None, e))?;

        ctx.log()
            .info(format_args!("created shipment {}", shipment.id()));
        self.audit.emit(
            self.event(ctx, AuditEventKind::ShipmentCreated, AuditOutcome::Success)
                .with_action(Operation::Create.name())
                .with_shipment(shipment.id()),
        );
        Ok(shipment)
    }

    /// Lists the caller's shipments, oldest first. Never includes another
    /// principal's records, even for admins.
    ///
    /// # Errors
    ///
    /// `Storage` if the read fails.
    pub fn list_own_shipments(&self, ctx: &Ctx) -> Result<Vec<Shipment>, Error> {
        self.require(ctx, Operation::ListOwn, None)?;

        let owner = ctx.principal().id;
        let shipments = self
            .repository
            .find_by_owner(owner)
            .map_err(|e| self.storage_failure(ctx, Operation::ListOwn, None, e))?;

        ctx.log()
            .debug(format_args!("listed {} own shipments", shipments.len()));
        Ok(shipments)
    }

    /// Fetches one shipment. Owners see their own records; admins see any
    /// record, annotated with its owner.
    ///
    /// The record is looked up before the policy check, so an unknown id is
    /// `NotFound` for every caller.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no such shipment exists
    /// - `Forbidden` if the caller is neither owner nor admin
    /// - `Storage` if the read fails
    pub fn get_shipment(&self, ctx: &Ctx, id: ShipmentId) -> Result<ShipmentView, Error> {
        let read = |owner| Operation::ReadOne { owner };

        let shipment = self
            .repository
            .find_by_id(id)
            .map_err(|e| self.storage_failure(ctx, read(ctx.principal().id), Some(id), e))?
            .ok_or_else(|| {
                ctx.log().debug(format_args!("shipment {} not found", id));
                NotFound::new("shipment", id)
            })?;

        self.require(ctx, read(shipment.owner_id()), Some(id))?;

        ctx.log().debug(format_args!("read shipment {}", id));
        Ok(self.view(ctx, shipment))
    }

    /// Lists every shipment with its owner. Admins only.
    ///
    /// # Errors
    ///
    /// - `Forbidden` for standard principals
    /// - `Storage` if the read fails
    pub fn list_all_shipments(&self, ctx: &Ctx) -> Result<Vec<ShipmentView>, Error> {
        self.require(ctx, Operation::ListAll, None)?;

        let shipments = self
            .repository
            .find_all()
            .map_err(|e| self.storage_failure(ctx, Operation::ListAll, None, e))?;

        ctx.log()
            .debug(format_args!("listed {} shipments", shipments.len()));
        Ok(shipments
            .into_iter()
            .map(|shipment| self.view(ctx, shipment))
            .collect())
    }

    /// Sets the status of any shipment. Admins only.
    ///
    /// The status text is checked first and must be exactly one of
    /// `pending`, `in_progress` or `delivered`. Any transition is allowed,
    /// including writing the current status again.
    ///
    /// # Errors
    ///
    /// - `InvalidStatus` for any other text, whatever the caller's role
    /// - `Forbidden` for standard principals
    /// - `NotFound` if no such shipment exists
    /// - `Storage` if the write fails
    pub fn update_status(
        &self,
        ctx: &Ctx,
        id: ShipmentId,
        status: Tainted<String>,
    ) -> Result<Shipment, Error> {
        let status: ShipmentStatus = status.into_inner().parse().map_err(|e| {
            ctx.log().debug(format_args!("rejected status value"));
            Error::InvalidStatus(e)
        })?;

        self.require(ctx, Operation::UpdateStatus, Some(id))?;

        let change = self
            .repository
            .update_status(id, status, Utc::now())
            .map_err(|e| self.storage_failure(ctx, Operation::UpdateStatus, Some(id), e))?
            .ok_or_else(|| NotFound::new("shipment", id))?;

        ctx.log().info(format_args!(
            "shipment {} status {} -> {}",
            id, change.previous, status
        ));
        if status.is_terminal() && !change.previous.is_terminal() {
            ctx.log().info(format_args!("shipment {} delivered", id));
        }
        self.audit.emit(
            self.event(ctx, AuditEventKind::StatusChanged, AuditOutcome::Success)
                .with_action(Operation::UpdateStatus.name())
                .with_shipment(id)
                .with_transition(change.previous, status),
        );
        Ok(change.shipment)
    }

    fn require(
        &self,
        ctx: &Ctx,
        operation: Operation,
        shipment: Option<ShipmentId>,
    ) -> Result<(), Error> {
        PolicyGate::new(ctx).require(operation).check().map_err(|violation| {
            let mut event = self
                .event(ctx, AuditEventKind::AccessDenied, AuditOutcome::Denied)
                .with_action(operation.name());
            if let Some(id) = shipment {
                event = event.with_shipment(id);
            }
            self.audit.emit(event);
            Error::Violation(violation)
        })
    }

    fn storage_failure(
        &self,
        ctx: &Ctx,
        operation: Operation,
        shipment: Option<ShipmentId>,
        error: StorageError,
    ) -> Error {
        ctx.log()
            .error(format_args!("{} failed: {}", operation, error));

        // Only mutations are audited.
        if matches!(operation, Operation::Create | Operation::UpdateStatus) {
            let kind = match operation {
                Operation::Create => AuditEventKind::ShipmentCreated,
                _ => AuditEventKind::StatusChanged,
            };
            let mut event = self
                .event(ctx, kind, AuditOutcome::Error)
                .with_action(operation.name());
            if let Some(id) = shipment {
                event = event.with_shipment(id);
            }
            self.audit.emit(event);
        }

        Error::Storage(error)
    }

    fn event(&self, ctx: &Ctx, kind: AuditEventKind, outcome: AuditOutcome) -> AuditEvent {
        AuditEvent::new(ctx.request_id(), ctx.principal().id, kind, outcome)
    }

    fn view(&self, ctx: &Ctx, shipment: Shipment) -> ShipmentView {
        if !ctx.principal().is_admin() {
            return ShipmentView::bare(shipment);
        }
        let owner = self.owner_summary(shipment.owner_id());
        ShipmentView { shipment, owner }
    }

    fn owner_summary(&self, id: PrincipalId) -> Option<OwnerSummary> {
        self.directory
            .display_name(id)
            .map(|name| OwnerSummary { id, name })
    }
}
