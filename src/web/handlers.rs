//! Request handling: route dispatch, JSON rendering and error mapping.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::config::ServiceConfig;
use crate::context::Ctx;
use crate::credentials::{CredentialStore, IssuedToken, InMemoryCredentialStore};
use crate::error::{Error, ErrorKind, StorageError, ValidationError, ViolationKind};
use crate::input::{LoginInput, RegistrationInput, RegistrationValidator, ShipmentInput};
use crate::repository::{InMemoryShipmentRepository, JsonFileShipmentRepository, ShipmentRepository};
use crate::service::ShipmentService;
use crate::shipment::{Shipment, ShipmentId, ShipmentView};
use crate::tainted::Tainted;

use super::{extract_authed, extract_unauthed, RequestAdapter, Route, TaintedInputs};

/// Status code and JSON body of a handled request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// JSON body
    pub body: Value,
}

impl ApiResponse {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    fn created(body: Value) -> Self {
        Self { status: 201, body }
    }

    fn message(status: u16, message: &str) -> Self {
        Self {
            status,
            body: json!({ "message": message }),
        }
    }

    fn not_found() -> Self {
        Self::message(404, "Not Found")
    }

    /// Maps a core error to its response.
    ///
    /// Storage causes are never exposed; forbidden responses carry the
    /// constant message `"Forbidden"`.
    pub fn from_error(error: &Error) -> Self {
        let status = status_code(error.kind());
        match error {
            Error::Validation(e) => Self::unprocessable(e),
            Error::InvalidStatus(_) => Self::unprocessable(&ValidationError::single(
                "status",
                "must be one of pending, in_progress, delivered",
            )),
            Error::Auth(e) => Self::message(status, &e.to_string()),
            Error::Violation(v) => match v.kind {
                ViolationKind::Unauthenticated => Self::message(status, "Unauthenticated."),
                ViolationKind::Forbidden { .. } => Self::message(status, "Forbidden"),
            },
            Error::NotFound(_) => Self::not_found(),
            Error::Storage(_) => Self::message(status, "Server Error"),
        }
    }

    fn unprocessable(error: &ValidationError) -> Self {
        let mut errors = Map::new();
        for field in error.fields() {
            let entry = errors
                .entry(field.field.clone())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(messages) = entry {
                messages.push(Value::String(format!(
                    "The {} field {}.",
                    field.field.replace('_', " "),
                    field.message
                )));
            }
        }

        Self {
            status: 422,
            body: json!({
                "message": "The given data was invalid.",
                "errors": errors,
            }),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StatusInput {
    status: Option<String>,
}

/// The HTTP-shaped API over the lifecycle service and credential store.
///
/// Framework integrations build a [`RequestAdapter`] per request and pass
/// it to [`Api::handle`].
///
/// # Examples
///
/// ```
/// use shipment_core::web::{Api, RequestAdapter};
/// use shipment_core::ServiceConfig;
///
/// let api = Api::from_config(&ServiceConfig::default()).unwrap();
/// let response = api.handle(RequestAdapter::new("GET", "/shipments"));
///
/// assert_eq!(response.status, 401);
/// ```
#[derive(Clone)]
pub struct Api {
    service: ShipmentService,
    credentials: Arc<dyn CredentialStore>,
    registration: RegistrationValidator,
}

impl std::fmt::Debug for Api {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Api")
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

impl Api {
    /// Assembles an API from its parts.
    pub fn new(
        service: ShipmentService,
        credentials: Arc<dyn CredentialStore>,
        config: &ServiceConfig,
    ) -> Self {
        Self {
            service,
            credentials,
            registration: config.registration_validator(),
        }
    }

    /// Builds an API with an in-memory credential store and the repository
    /// selected by `config.storage.path`.
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if the shipment file cannot be loaded.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, StorageError> {
        let repository: Arc<dyn ShipmentRepository> = match &config.storage.path {
            Some(path) => Arc::new(JsonFileShipmentRepository::open(path)?),
            None => Arc::new(InMemoryShipmentRepository::new()),
        };
        let credentials = Arc::new(
            InMemoryCredentialStore::with_token_bytes(config.auth.token_bytes)
                .with_hash_cost(config.auth.hash_cost),
        );
        let service = ShipmentService::with_config(repository, credentials.clone(), config);

        Ok(Self::new(service, credentials, config))
    }

    /// Handles one request.
    pub fn handle(&self, adapter: RequestAdapter) -> ApiResponse {
        let Some(route) = Route::resolve(adapter.method(), adapter.path()) else {
            tracing::debug!(
                request_id = %adapter.request_id(),
                method = %adapter.method(),
                path = %adapter.path(),
                "no route"
            );
            return ApiResponse::not_found();
        };

        let result = if route.is_public() {
            self.handle_public(route, &adapter)
        } else {
            self.handle_authed(route, &adapter)
        };

        let response = result.unwrap_or_else(|e| ApiResponse::from_error(&e));
        tracing::debug!(
            request_id = %adapter.request_id(),
            route = ?route,
            status = response.status,
            "handled request"
        );
        response
    }

    fn handle_public(&self, route: Route, adapter: &RequestAdapter) -> Result<ApiResponse, Error> {
        let extraction = extract_unauthed(adapter);
        let inputs = &extraction.inputs;

        match route {
            Route::Register => {
                let form = inputs.json::<RegistrationInput>()?;
                let verified = self.registration.validate(form)?;
                let issued = self.credentials.register(verified)?;
                extraction
                    .context
                    .log()
                    .info(format_args!("registered principal {}", issued.account.id));
                Ok(ApiResponse::created(issued_json(issued)))
            }
            Route::Login => {
                let (login, password) = inputs.json::<LoginInput>()?.into_inner().require()?;
                let issued = self.credentials.login(&login, &password).map_err(|e| {
                    extraction.context.log().warn(format_args!("login failed"));
                    e
                })?;
                Ok(ApiResponse::ok(issued_json(issued)))
            }
            _ => Ok(ApiResponse::not_found()),
        }
    }

    fn handle_authed(&self, route: Route, adapter: &RequestAdapter) -> Result<ApiResponse, Error> {
        let extraction = extract_authed(adapter, self.credentials.as_ref())?;
        let ctx = &extraction.context;
        let inputs = &extraction.inputs;

        match route {
            Route::Logout => {
                if !self.credentials.logout(&extraction.token) {
                    // Revoked by a concurrent logout after it was resolved.
                    ctx.log().debug(format_args!("token already revoked"));
                }
                ctx.log().info(format_args!("logged out"));
                Ok(ApiResponse::message(200, "Logged out"))
            }
            Route::ListOwnShipments => {
                let shipments = self.service.list_own_shipments(ctx)?;
                Ok(ApiResponse::ok(Value::Array(
                    shipments.iter().map(shipment_json).collect(),
                )))
            }
            Route::CreateShipment => {
                let form = inputs.json::<ShipmentInput>()?;
                let shipment = self.service.create_shipment(ctx, form)?;
                Ok(ApiResponse::created(shipment_json(&shipment)))
            }
            Route::GetShipment(id) => {
                let view = self.service.get_shipment(ctx, id)?;
                Ok(ApiResponse::ok(view_json(&view)))
            }
            Route::ListAllShipments => {
                let views = self.service.list_all_shipments(ctx)?;
                Ok(ApiResponse::ok(Value::Array(
                    views.iter().map(view_json).collect(),
                )))
            }
            Route::UpdateStatus(id) => self.update_status(ctx, id, inputs),
            Route::Register | Route::Login => Ok(ApiResponse::not_found()),
        }
    }

    fn update_status(
        &self,
        ctx: &Ctx,
        id: ShipmentId,
        inputs: &TaintedInputs,
    ) -> Result<ApiResponse, Error> {
        let form = inputs.json::<StatusInput>()?.into_inner();
        let status = form
            .status
            .ok_or_else(|| ValidationError::single("status", "is required"))?;

        let shipment = self.service.update_status(ctx, id, Tainted::new(status))?;
        Ok(ApiResponse::ok(shipment_json(&shipment)))
    }
}

/// Renders a shipment with flat field names.
pub fn shipment_json(shipment: &Shipment) -> Value {
    json!({
        "id": shipment.id(),
        "user_id": shipment.owner_id(),
        "pickup_address": shipment.pickup().address,
        "pickup_latitude": shipment.pickup().latitude,
        "pickup_longitude": shipment.pickup().longitude,
        "dropoff_address": shipment.dropoff().address,
        "dropoff_latitude": shipment.dropoff().latitude,
        "dropoff_longitude": shipment.dropoff().longitude,
        "cargo_type": shipment.cargo_type(),
        "weight": shipment.weight(),
        "truck_type": shipment.truck_type(),
        "status": shipment.status(),
        "created_at": shipment.created_at(),
        "updated_at": shipment.updated_at(),
    })
}

fn view_json(view: &ShipmentView) -> Value {
    let mut value = shipment_json(&view.shipment);
    if let (Some(owner), Value::Object(map)) = (&view.owner, &mut value) {
        map.insert("user".to_string(), json!({ "id": owner.id, "name": owner.name }));
    }
    value
}

fn issued_json(issued: IssuedToken) -> Value {
    json!({
        "is_admin": issued.account.is_admin,
        "user": issued.account,
        "token": issued.token.expose_secret(),
    })
}

/// HTTP status code for an error category.
pub fn status_code(kind: ErrorKind) -> u16 {
    match kind {
        ErrorKind::Validation | ErrorKind::InvalidStatus => 422,
        ErrorKind::Auth | ErrorKind::Unauthenticated => 401,
        ErrorKind::Forbidden => 403,
        ErrorKind::NotFound => 404,
        ErrorKind::Storage => 500,
    }
}
