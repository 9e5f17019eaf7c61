//! Framework-agnostic HTTP boundary.
//!
//! Maps requests onto the lifecycle service and credential store without
//! depending on any web framework:
//!
//! 1. A framework integration builds a [`RequestAdapter`] (method, path,
//!    headers, body).
//! 2. [`Api::handle`] matches a [`Route`], resolves the bearer token into a
//!    `Ctx<Authed>` through [`extract_authed`], and parses the JSON body as a
//!    tainted form.
//! 3. The service validates and authorizes; errors become an
//!    [`ApiResponse`] via [`ApiResponse::from_error`].
//!
//! Every value read from the request stays [`Tainted`](crate::Tainted)
//! until a validator accepts it. No handler grants anything: authorization
//! stays with [`PolicyGate`](crate::PolicyGate).
//!
//! # Example Flow
//!
//! ```
//! use serde_json::json;
//! use shipment_core::web::{Api, RequestAdapter};
//! use shipment_core::ServiceConfig;
//!
//! let api = Api::from_config(&ServiceConfig::default()).unwrap();
//!
//! let registered = api.handle(RequestAdapter::new("POST", "/register").with_json(&json!({
//!     "name": "Alice",
//!     "email": "alice@example.com",
//!     "phone": "0500000001",
//!     "password": "hunter22",
//!     "password_confirmation": "hunter22",
//! })));
//! assert_eq!(registered.status, 201);
//!
//! let token = registered.body["token"].as_str().unwrap();
//! let listed = api.handle(
//!     RequestAdapter::new("GET", "/shipments")
//!         .with_header("Authorization", format!("Bearer {}", token)),
//! );
//! assert_eq!(listed.status, 200);
//! assert_eq!(listed.body, json!([]));
//! ```

mod adapter;
mod extract;
mod handlers;
mod middleware;
mod routes;

pub use adapter::{RequestAdapter, TaintedInputs, REQUEST_ID_HEADER};
pub use extract::{ExtractMetadata, ExtractTaintedInputs};
pub use handlers::{shipment_json, status_code, Api, ApiResponse};
pub use middleware::{
    extract_authed, extract_unauthed, AuthenticatedExtraction, UnauthenticatedExtraction,
};
pub use routes::Route;
