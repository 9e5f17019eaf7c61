//! Extraction traits between framework request types and the core.

use crate::request::RequestMeta;

use super::TaintedInputs;

/// Extracts request metadata from a framework-specific request.
///
/// Implementations only map types: they neither authenticate nor
/// authorize. Principal resolution happens in
/// [`extract_authed`](super::extract_authed), authorization in
/// [`PolicyGate`](crate::PolicyGate).
///
/// # Examples
///
/// ```
/// use shipment_core::web::ExtractMetadata;
/// use shipment_core::RequestMeta;
///
/// struct MyFrameworkRequest {
///     trace_id: String,
/// }
///
/// impl ExtractMetadata for MyFrameworkRequest {
///     fn extract_metadata(&self) -> RequestMeta {
///         RequestMeta {
///             request_id: self.trace_id.clone(),
///             principal: None,
///         }
///     }
/// }
/// ```
pub trait ExtractMetadata {
    /// Returns the request id and, if already resolved, the principal.
    fn extract_metadata(&self) -> RequestMeta;
}

/// Extracts every user-controlled value of a request as tainted input.
pub trait ExtractTaintedInputs {
    /// Returns headers and body, all tainted.
    fn extract_tainted_inputs(&self) -> TaintedInputs;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{Principal, PrincipalId};
    use crate::web::RequestAdapter;

    struct TestRequest {
        id: String,
        user: Option<u64>,
    }

    impl ExtractMetadata for TestRequest {
        fn extract_metadata(&self) -> RequestMeta {
            RequestMeta {
                request_id: self.id.clone(),
                principal: self
                    .user
                    .map(|u| Principal::standard(PrincipalId::new(u), "test")),
            }
        }
    }

    impl ExtractTaintedInputs for TestRequest {
        fn extract_tainted_inputs(&self) -> TaintedInputs {
            RequestAdapter::new("GET", "/")
                .with_header("x-request-id", self.id.clone())
                .extract_tainted_inputs()
        }
    }

    #[test]
    fn custom_request_types_can_implement_extraction() {
        let req = TestRequest {
            id: "test-1".to_string(),
            user: Some(3),
        };

        let meta = req.extract_metadata();
        assert_eq!(meta.request_id, "test-1");
        assert_eq!(meta.principal.unwrap().id, PrincipalId::new(3));
        assert!(req.extract_tainted_inputs().header("X-Request-Id").is_some());
    }
}
