use crate::error::Violation;
use crate::logging::RequestLog;
use crate::request::{Principal, RequestMeta};
use crate::state::{Authed, Unauthed};

/// Per-request execution context.
///
/// `Ctx<S>` is generic over its authentication state:
/// - `Ctx<Unauthed>`: request id only
/// - `Ctx<Authed>`: request id and a resolved principal
///
/// ```text
/// Ctx<Unauthed> --authenticate--> Ctx<Authed>
/// ```
///
/// Every lifecycle operation takes `&Ctx<Authed>`; the principal is passed
/// explicitly rather than read from ambient request state.
///
/// # Examples
///
/// ```
/// use shipment_core::{Ctx, Principal, PrincipalId};
///
/// let ctx = Ctx::new("req-1")
///     .authenticate(Some(Principal::standard(PrincipalId::new(7), "Alice")))
///     .expect("principal present");
///
/// assert_eq!(ctx.principal().id, PrincipalId::new(7));
///
/// assert!(Ctx::new("req-2").authenticate(None).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Ctx<S = Authed> {
    request_id: String,
    state: S,
}

impl<S> Ctx<S> {
    /// Returns the request ID for this context.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

impl Ctx<Unauthed> {
    /// Creates an unauthenticated context for `request_id`.
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            state: Unauthed::new(),
        }
    }

    /// Returns a logger scoped to this request.
    pub fn log(&self) -> RequestLog<'_> {
        RequestLog::new(&self.request_id, None)
    }

    /// Moves to `Ctx<Authed>` when a principal is present.
    ///
    /// # Errors
    ///
    /// Returns an `Unauthenticated` violation if `principal` is `None`.
    pub fn authenticate(self, principal: Option<Principal>) -> Result<Ctx<Authed>, Violation> {
        match principal {
            Some(principal) => Ok(Ctx {
                request_id: self.request_id,
                state: Authed { principal },
            }),
            None => {
                self.log()
                    .debug(format_args!("rejecting request without principal"));
                Err(Violation::unauthenticated())
            }
        }
    }
}

impl Ctx<Authed> {
    /// Builds an authenticated context straight from request metadata.
    ///
    /// # Errors
    ///
    /// Returns an `Unauthenticated` violation if `meta` has no principal.
    pub fn from_meta(meta: RequestMeta) -> Result<Self, Violation> {
        Ctx::new(meta.request_id).authenticate(meta.principal)
    }

    /// Returns the authenticated principal.
    pub fn principal(&self) -> &Principal {
        &self.state.principal
    }

    /// Returns a logger scoped to this request and principal.
    pub fn log(&self) -> RequestLog<'_> {
        RequestLog::new(&self.request_id, Some(self.state.principal.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViolationKind;
    use crate::request::PrincipalId;

    fn alice() -> Principal {
        Principal::standard(PrincipalId::new(1), "Alice")
    }

    #[test]
    fn authenticate_with_principal_succeeds() {
        let ctx = Ctx::new("req-1").authenticate(Some(alice())).unwrap();

        assert_eq!(ctx.request_id(), "req-1");
        assert_eq!(ctx.principal().name, "Alice");
    }

    #[test]
    fn authenticate_without_principal_fails() {
        let err = Ctx::new("req-2").authenticate(None).unwrap_err();
        assert_eq!(err.kind, ViolationKind::Unauthenticated);
    }

    #[test]
    fn from_meta_preserves_request_id() {
        let ctx = Ctx::from_meta(RequestMeta {
            request_id: "req-3".to_string(),
            principal: Some(alice()),
        })
        .unwrap();

        assert_eq!(ctx.request_id(), "req-3");
        assert_eq!(ctx.log().request_id(), "req-3");
    }

    #[test]
    fn from_meta_requires_principal() {
        let result = Ctx::from_meta(RequestMeta {
            request_id: "req-4".to_string(),
            principal: None,
        });
        assert!(result.is_err());
    }

    #[test]
    fn ctx_cannot_skip_authentication() {
        // Neither compiles outside this crate:
        // let ctx: Ctx<Authed> = Ctx { request_id: "x".into(), state: Authed { principal } };
        // let ctx: Ctx<Authed> = Ctx::new("x");
        let unauthed = Ctx::new("req-5");
        assert_eq!(unauthed.log().request_id(), "req-5");
    }
}
