//! Building request contexts from adapters.
//!
//! ```text
//! RequestAdapter
//!   -> extract_unauthed            (register, login)
//!   -> extract_authed + bearer     (everything else)
//!        Ctx<Authed> + TaintedInputs + BearerToken
//!   -> ShipmentService / PolicyGate
//! ```
//!
//! Nothing here authorizes an operation; that is left to the policy gate.

use crate::context::Ctx;
use crate::credentials::{BearerToken, CredentialStore};
use crate::error::Violation;
use crate::state::{Authed, Unauthed};

use super::{ExtractMetadata, ExtractTaintedInputs, RequestAdapter, TaintedInputs};

/// Context and inputs of a request that needs no principal.
#[derive(Debug)]
pub struct UnauthenticatedExtraction {
    /// Context without a principal
    pub context: Ctx<Unauthed>,
    /// All untrusted inputs from the request
    pub inputs: TaintedInputs,
}

/// Context, inputs and presented token of an authenticated request.
#[derive(Debug)]
pub struct AuthenticatedExtraction {
    /// Context with the resolved principal
    pub context: Ctx<Authed>,
    /// All untrusted inputs from the request
    pub inputs: TaintedInputs,
    /// The token the principal was resolved from
    pub token: BearerToken,
}

/// Builds an unauthenticated context.
///
/// # Examples
///
/// ```
/// use shipment_core::web::{extract_unauthed, RequestAdapter};
///
/// let adapter = RequestAdapter::new("POST", "/login").with_header("X-Request-Id", "req-001");
/// let extraction = extract_unauthed(&adapter);
///
/// assert_eq!(extraction.context.request_id(), "req-001");
/// ```
pub fn extract_unauthed(adapter: &RequestAdapter) -> UnauthenticatedExtraction {
    let meta = adapter.extract_metadata();
    UnauthenticatedExtraction {
        context: Ctx::new(meta.request_id),
        inputs: adapter.extract_tainted_inputs(),
    }
}

/// Resolves the bearer token through `store` and builds an authenticated
/// context.
///
/// # Errors
///
/// Returns an `Unauthenticated` violation if the `Authorization` header is
/// missing or malformed, or the token is unknown or revoked.
pub fn extract_authed(
    adapter: &RequestAdapter,
    store: &dyn CredentialStore,
) -> Result<AuthenticatedExtraction, Violation> {
    let inputs = adapter.extract_tainted_inputs();
    let mut meta = adapter.extract_metadata();

    let Some(token) = inputs.bearer_token() else {
        Ctx::new(meta.request_id)
            .log()
            .debug(format_args!("no bearer token on {}", adapter.path()));
        return Err(Violation::unauthenticated());
    };

    meta.principal = store.resolve(&token);
    let context = Ctx::from_meta(meta)?;

    Ok(AuthenticatedExtraction {
        context,
        inputs,
        token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViolationKind;
    use crate::input::{fixtures::registration, RegistrationValidator};
    use crate::request::PrincipalId;
    use crate::tainted::Tainted;
    use crate::InMemoryCredentialStore;

    fn store_with_alice() -> (InMemoryCredentialStore, String) {
        let store = InMemoryCredentialStore::new().with_hash_cost(4);
        let verified = RegistrationValidator::new(255, 6)
            .validate(Tainted::new(registration("alice@example.com", "0500000001")))
            .unwrap();
        let token = store.register(verified).unwrap().token.expose_secret().clone();
        (store, token)
    }

    #[test]
    fn unauthed_extraction_keeps_inputs() {
        let adapter = RequestAdapter::new("POST", "/login")
            .with_header("X-Request-Id", "req-1")
            .with_body("{}");
        let extraction = extract_unauthed(&adapter);

        assert_eq!(extraction.context.request_id(), "req-1");
        assert!(extraction.inputs.header("x-request-id").is_some());
    }

    #[test]
    fn valid_token_yields_authed_context() {
        let (store, token) = store_with_alice();
        let adapter = RequestAdapter::new("GET", "/shipments")
            .with_header("Authorization", format!("Bearer {}", token));

        let extraction = extract_authed(&adapter, &store).unwrap();
        assert_eq!(extraction.context.principal().id, PrincipalId::new(1));
        assert_eq!(extraction.token.expose_secret(), token);
    }

    #[test]
    fn authed_context_keeps_the_request_id() {
        let (store, token) = store_with_alice();
        let adapter = RequestAdapter::new("GET", "/shipments")
            .with_header("X-Request-Id", "req-77")
            .with_header("Authorization", format!("Bearer {}", token));

        let extraction = extract_authed(&adapter, &store).unwrap();
        assert_eq!(extraction.context.request_id(), "req-77");
    }

    #[test]
    fn missing_or_unknown_token_is_unauthenticated() {
        let (store, _) = store_with_alice();

        let missing = RequestAdapter::new("GET", "/shipments");
        let err = extract_authed(&missing, &store).unwrap_err();
        assert_eq!(err.kind, ViolationKind::Unauthenticated);

        let unknown = RequestAdapter::new("GET", "/shipments")
            .with_header("Authorization", "Bearer 1|0000");
        let err = extract_authed(&unknown, &store).unwrap_err();
        assert_eq!(err.kind, ViolationKind::Unauthenticated);
    }
}
