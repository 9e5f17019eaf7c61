//! Integration tests for the HTTP boundary.
//!
//! These drive [`Api::handle`] with plain [`RequestAdapter`]s the way a
//! framework integration would: register, authenticate, create and read
//! shipments, and move them through their lifecycle as an admin.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use shipment_core::web::{extract_authed, Api, RequestAdapter};
use shipment_core::{
    InMemoryCredentialStore, InMemoryShipmentRepository, NewShipment, PrincipalId,
    AuthError, BearerToken, CredentialStore, ProfileDirectory, Error, IssuedToken, Principal, Secret,
    ServiceConfig, Shipment, ShipmentId, ShipmentRepository, ShipmentService, ShipmentStatus,
    StatusChange, StorageConfig, StorageError, VerifiedRegistration,
};

struct Harness {
    api: Api,
    store: Arc<InMemoryCredentialStore>,
}

impl Harness {
    fn new() -> Self {
        Self::with_repository(Arc::new(InMemoryShipmentRepository::new()))
    }

    fn with_repository(repository: Arc<dyn ShipmentRepository>) -> Self {
        let store = Arc::new(InMemoryCredentialStore::new().with_hash_cost(4));
        let config = ServiceConfig::default();
        let service = ShipmentService::with_config(repository, store.clone(), &config);
        let api = Api::new(service, store.clone(), &config);
        Self { api, store }
    }

    fn register(&self, name: &str, email: &str, phone: &str) -> (u64, String) {
        let response = self.api.handle(RequestAdapter::new("POST", "/api/register").with_json(
            &json!({
                "name": name,
                "email": email,
                "phone": phone,
                "password": "hunter22",
                "password_confirmation": "hunter22",
            }),
        ));
        assert_eq!(response.status, 201, "{}", response.body);
        let id = response.body["user"]["id"].as_u64().unwrap();
        let token = response.body["token"].as_str().unwrap().to_string();
        (id, token)
    }

    fn admin(&self) -> String {
        let (id, _) = self.register("Dispatcher", "ops@example.com", "0599999999");
        assert!(self.store.grant_admin(PrincipalId::new(id)));
        self.login("ops@example.com")
    }

    fn login(&self, login: &str) -> String {
        let response = self.api.handle(
            RequestAdapter::new("POST", "/api/login")
                .with_json(&json!({ "email_or_phone": login, "password": "hunter22" })),
        );
        assert_eq!(response.status, 200, "{}", response.body);
        response.body["token"].as_str().unwrap().to_string()
    }
}

fn authed(method: &str, path: &str, token: &str) -> RequestAdapter {
    RequestAdapter::new(method, path).with_header("Authorization", format!("Bearer {}", token))
}

fn shipment_body() -> Value {
    json!({
        "pickup_address": "King Fahd Rd, Riyadh",
        "pickup_latitude": 24.7136,
        "pickup_longitude": "46.6753",
        "dropoff_address": "Corniche Rd, Jeddah",
        "dropoff_latitude": 21.5433,
        "dropoff_longitude": 39.1728,
        "cargo_type": "General",
        "weight": "1000-5000 kg",
        "truck_type": "Flatbed",
    })
}

fn create(api: &Api, token: &str) -> u64 {
    let response = api.handle(authed("POST", "/api/shipments", token).with_json(&shipment_body()));
    assert_eq!(response.status, 201, "{}", response.body);
    response.body["id"].as_u64().unwrap()
}

#[test]
fn register_returns_token_and_standard_role() {
    let harness = Harness::new();
    let response = harness.api.handle(RequestAdapter::new("POST", "/register").with_json(&json!({
        "name": "Alice",
        "email": "alice@example.com",
        "phone": "0500000001",
        "password": "hunter22",
        "password_confirmation": "hunter22",
    })));

    assert_eq!(response.status, 201);
    assert_eq!(response.body["is_admin"], false);
    assert_eq!(response.body["user"]["email"], "alice@example.com");
    assert!(response.body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(response.body["user"].get("password").is_none());
}

#[test]
fn duplicate_email_is_unprocessable() {
    let harness = Harness::new();
    harness.register("Alice", "alice@example.com", "0500000001");

    let response = harness.api.handle(RequestAdapter::new("POST", "/register").with_json(&json!({
        "name": "Mallory",
        "email": "alice@example.com",
        "phone": "0500000002",
        "password": "hunter22",
        "password_confirmation": "hunter22",
    })));

    assert_eq!(response.status, 422);
    assert_eq!(
        response.body["errors"]["email"][0],
        "The email field has already been taken."
    );
}

#[test]
fn login_by_email_or_phone_and_bad_password() {
    let harness = Harness::new();
    harness.register("Alice", "alice@example.com", "0500000001");

    harness.login("alice@example.com");
    harness.login("0500000001");

    let response = harness.api.handle(RequestAdapter::new("POST", "/login").with_json(
        &json!({ "email_or_phone": "alice@example.com", "password": "wrong-one" }),
    ));
    assert_eq!(response.status, 401);
    assert_eq!(response.body, json!({ "message": "Invalid credentials." }));
}

#[test]
fn logout_revokes_only_the_presented_token() {
    let harness = Harness::new();
    let (_, first) = harness.register("Alice", "alice@example.com", "0500000001");
    let second = harness.login("alice@example.com");

    let response = harness.api.handle(authed("POST", "/logout", &first));
    assert_eq!(response.status, 200);
    assert_eq!(response.body, json!({ "message": "Logged out" }));

    assert_eq!(harness.api.handle(authed("GET", "/shipments", &first)).status, 401);
    assert_eq!(harness.api.handle(authed("GET", "/shipments", &second)).status, 200);
}

/// Revokes the token itself just before the handler's own logout, as a
/// concurrent logout of the same token would.
struct RacingLogout(InMemoryCredentialStore);

impl ProfileDirectory for RacingLogout {
    fn display_name(&self, id: PrincipalId) -> Option<String> {
        self.0.display_name(id)
    }
}

impl CredentialStore for RacingLogout {
    fn register(&self, registration: VerifiedRegistration) -> Result<IssuedToken, Error> {
        self.0.register(registration)
    }
    fn login(&self, login: &str, password: &Secret<String>) -> Result<IssuedToken, AuthError> {
        self.0.login(login, password)
    }
    fn logout(&self, token: &BearerToken) -> bool {
        self.0.logout(token);
        self.0.logout(token)
    }
    fn resolve(&self, token: &BearerToken) -> Option<Principal> {
        self.0.resolve(token)
    }
}

#[test]
fn logout_of_an_already_revoked_token_still_succeeds() {
    let store = Arc::new(RacingLogout(InMemoryCredentialStore::new().with_hash_cost(4)));
    let config = ServiceConfig::default();
    let service = ShipmentService::with_config(
        Arc::new(InMemoryShipmentRepository::new()),
        Arc::new(InMemoryCredentialStore::new()),
        &config,
    );
    let api = Api::new(service, store.clone(), &config);

    let registered = api.handle(RequestAdapter::new("POST", "/register").with_json(&json!({
        "name": "Alice",
        "email": "alice@example.com",
        "phone": "0500000001",
        "password": "hunter22",
        "password_confirmation": "hunter22",
    })));
    let token = registered.body["token"].as_str().unwrap().to_string();

    let response = api.handle(authed("POST", "/logout", &token));
    assert_eq!(response.status, 200);
    assert_eq!(response.body, json!({ "message": "Logged out" }));
    assert!(store.resolve(&BearerToken::new(token.clone())).is_none());
    assert_eq!(api.handle(authed("GET", "/shipments", &token)).status, 401);
}

#[test]
fn protected_routes_require_a_token() {
    let harness = Harness::new();

    for (method, path) in [
        ("GET", "/shipments"),
        ("POST", "/shipments"),
        ("GET", "/shipments/1"),
        ("PUT", "/shipments/1"),
        ("GET", "/admin/shipments"),
        ("POST", "/logout"),
    ] {
        let response = harness.api.handle(RequestAdapter::new(method, path));
        assert_eq!(response.status, 401, "{} {}", method, path);
        assert_eq!(response.body, json!({ "message": "Unauthenticated." }));
    }
}

#[test]
fn create_renders_flat_fields() {
    let harness = Harness::new();
    let (alice, token) = harness.register("Alice", "alice@example.com", "0500000001");

    let response = harness
        .api
        .handle(authed("POST", "/shipments", &token).with_json(&shipment_body()));

    assert_eq!(response.status, 201);
    let body = &response.body;
    assert_eq!(body["user_id"], alice);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["pickup_longitude"], 46.6753);
    assert_eq!(body["truck_type"], "Flatbed");
    assert_eq!(body["created_at"], body["updated_at"]);
}

#[test]
fn create_with_missing_fields_lists_each_error() {
    let harness = Harness::new();
    let (_, token) = harness.register("Alice", "alice@example.com", "0500000001");

    let mut body = shipment_body();
    body.as_object_mut().unwrap().remove("pickup_address");
    body["dropoff_latitude"] = json!("north");

    let response = harness
        .api
        .handle(authed("POST", "/shipments", &token).with_json(&body));

    assert_eq!(response.status, 422);
    assert_eq!(response.body["message"], "The given data was invalid.");
    assert_eq!(
        response.body["errors"]["pickup_address"][0],
        "The pickup address field is required."
    );
    assert_eq!(
        response.body["errors"]["dropoff_latitude"][0],
        "The dropoff latitude field must be a number."
    );

    let listed = harness.api.handle(authed("GET", "/shipments", &token));
    assert_eq!(listed.body, json!([]));
}

#[test]
fn malformed_body_is_unprocessable() {
    let harness = Harness::new();
    let (_, token) = harness.register("Alice", "alice@example.com", "0500000001");

    let response = harness
        .api
        .handle(authed("POST", "/shipments", &token).with_body("{not json"));

    assert_eq!(response.status, 422);
    assert!(response.body["errors"]["body"].is_array());
}

#[test]
fn owners_read_their_shipment_others_are_forbidden() {
    let harness = Harness::new();
    let (_, alice) = harness.register("Alice", "alice@example.com", "0500000001");
    let (_, bob) = harness.register("Bob", "bob@example.com", "0500000002");
    let id = create(&harness.api, &alice);

    let own = harness.api.handle(authed("GET", &format!("/shipments/{}", id), &alice));
    assert_eq!(own.status, 200);
    assert!(own.body.get("user").is_none());

    let other = harness.api.handle(authed("GET", &format!("/shipments/{}", id), &bob));
    assert_eq!(other.status, 403);
    assert_eq!(other.body, json!({ "message": "Forbidden" }));

    let bobs = harness.api.handle(authed("GET", "/shipments", &bob));
    assert_eq!(bobs.body, json!([]));
}

#[test]
fn admin_sees_owner_details() {
    let harness = Harness::new();
    let (alice_id, alice) = harness.register("Alice", "alice@example.com", "0500000001");
    let id = create(&harness.api, &alice);
    let root = harness.admin();

    let one = harness.api.handle(authed("GET", &format!("/shipments/{}", id), &root));
    assert_eq!(one.status, 200);
    assert_eq!(one.body["user"], json!({ "id": alice_id, "name": "Alice" }));

    let all = harness.api.handle(authed("GET", "/admin/shipments", &root));
    assert_eq!(all.status, 200);
    assert_eq!(all.body.as_array().unwrap().len(), 1);
    assert_eq!(all.body[0]["user"]["name"], "Alice");
}

#[test]
fn list_all_is_admin_only() {
    let harness = Harness::new();
    let (_, alice) = harness.register("Alice", "alice@example.com", "0500000001");

    let response = harness.api.handle(authed("GET", "/admin/shipments", &alice));
    assert_eq!(response.status, 403);
    assert_eq!(response.body, json!({ "message": "Forbidden" }));
}

#[test]
fn status_update_flow() {
    let harness = Harness::new();
    let (_, alice) = harness.register("Alice", "alice@example.com", "0500000001");
    let id = create(&harness.api, &alice);
    let root = harness.admin();
    let path = format!("/shipments/{}", id);

    let denied = harness
        .api
        .handle(authed("PUT", &path, &alice).with_json(&json!({ "status": "delivered" })));
    assert_eq!(denied.status, 403);

    let invalid = harness
        .api
        .handle(authed("PUT", &path, &root).with_json(&json!({ "status": "shipped" })));
    assert_eq!(invalid.status, 422);
    assert_eq!(
        invalid.body["errors"]["status"][0],
        "The status field must be one of pending, in_progress, delivered."
    );

    let missing = harness
        .api
        .handle(authed("PUT", &path, &root).with_json(&json!({})));
    assert_eq!(missing.status, 422);

    let updated = harness
        .api
        .handle(authed("PUT", &path, &root).with_json(&json!({ "status": "in_progress" })));
    assert_eq!(updated.status, 200);
    assert_eq!(updated.body["status"], "in_progress");

    let seen = harness.api.handle(authed("GET", &path, &alice));
    assert_eq!(seen.body["status"], "in_progress");

    let unknown = harness.api.handle(
        authed("PUT", "/shipments/999", &root).with_json(&json!({ "status": "delivered" })),
    );
    assert_eq!(unknown.status, 404);
}

#[test]
fn bad_ids_and_unknown_routes_are_not_found() {
    let harness = Harness::new();
    let (_, alice) = harness.register("Alice", "alice@example.com", "0500000001");

    for (method, path) in [
        ("GET", "/shipments/abc"),
        ("GET", "/shipments/0"),
        ("GET", "/shipments/42"),
        ("DELETE", "/shipments/1"),
        ("GET", "/nowhere"),
    ] {
        let response = harness.api.handle(authed(method, path, &alice));
        assert_eq!(response.status, 404, "{} {}", method, path);
    }
}

#[test]
fn request_id_header_reaches_the_context() {
    let harness = Harness::new();
    let (_, alice) = harness.register("Alice", "alice@example.com", "0500000001");

    let adapter = authed("GET", "/shipments", &alice).with_header("X-Request-Id", "req-trace-7");
    let extraction = extract_authed(&adapter, harness.store.as_ref()).unwrap();
    assert_eq!(extraction.context.request_id(), "req-trace-7");

    let generated = RequestAdapter::new("GET", "/shipments");
    assert!(!generated.request_id().is_empty());
}

struct FailingRepository;

impl ShipmentRepository for FailingRepository {
    fn insert(&self, _: NewShipment) -> Result<Shipment, StorageError> {
        Err(StorageError::new("writing /srv/shipments.json"))
    }

    fn find_by_id(&self, _: ShipmentId) -> Result<Option<Shipment>, StorageError> {
        Err(StorageError::new("reading /srv/shipments.json"))
    }

    fn find_by_owner(&self, _: PrincipalId) -> Result<Vec<Shipment>, StorageError> {
        Err(StorageError::new("reading /srv/shipments.json"))
    }

    fn find_all(&self) -> Result<Vec<Shipment>, StorageError> {
        Err(StorageError::new("reading /srv/shipments.json"))
    }

    fn update_status(
        &self,
        _: ShipmentId,
        _: ShipmentStatus,
        _: DateTime<Utc>,
    ) -> Result<Option<StatusChange>, StorageError> {
        Err(StorageError::new("writing /srv/shipments.json"))
    }
}

#[test]
fn storage_failures_are_opaque() {
    let harness = Harness::with_repository(Arc::new(FailingRepository));
    let (_, alice) = harness.register("Alice", "alice@example.com", "0500000001");

    let listed = harness.api.handle(authed("GET", "/shipments", &alice));
    assert_eq!(listed.status, 500);
    assert_eq!(listed.body, json!({ "message": "Server Error" }));

    let created = harness
        .api
        .handle(authed("POST", "/shipments", &alice).with_json(&shipment_body()));
    assert_eq!(created.status, 500);
    assert!(!created.body.to_string().contains("/srv"));
}

#[test]
fn from_config_persists_shipments_to_the_configured_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shipments.json");
    let config = ServiceConfig {
        storage: StorageConfig {
            path: Some(path.clone()),
        },
        ..ServiceConfig::default()
    };

    let api = Api::from_config(&config).unwrap();
    let register = api.handle(RequestAdapter::new("POST", "/register").with_json(&json!({
        "name": "Alice",
        "email": "alice@example.com",
        "phone": "0500000001",
        "password": "hunter22",
        "password_confirmation": "hunter22",
    })));
    let token = register.body["token"].as_str().unwrap().to_string();
    create(&api, &token);

    let stored: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(stored["shipments"].as_array().unwrap().len(), 1);
    assert_eq!(stored["shipments"][0]["status"], "pending");
}
