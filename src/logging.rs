use std::fmt;

use crate::request::PrincipalId;

/// Request-scoped logging facade.
///
/// Obtained from [`Ctx::log`](crate::Ctx::log); every record carries the
/// request id, and the principal id once the request is authenticated.
/// Lifetime-bound to the context that produced it.
///
/// Pass secrets only as [`Secret<T>`](crate::Secret): they format as
/// `[REDACTED]`.
#[derive(Debug, Clone, Copy)]
pub struct RequestLog<'a> {
    request_id: &'a str,
    principal: Option<PrincipalId>,
}

impl<'a> RequestLog<'a> {
    pub(crate) fn new(request_id: &'a str, principal: Option<PrincipalId>) -> Self {
        Self {
            request_id,
            principal,
        }
    }

    /// Returns the request ID associated with this logger.
    pub fn request_id(&self) -> &str {
        self.request_id
    }

    /// Logs an info-level message.
    ///
    /// ```
    /// # use shipment_core::{Ctx, Principal, PrincipalId};
    /// # let ctx = Ctx::new("req-1")
    /// #     .authenticate(Some(Principal::standard(PrincipalId::new(1), "Alice")))
    /// #     .unwrap();
    /// ctx.log().info(format_args!("created shipment {}", 42));
    /// ```
    pub fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(request_id = %self.request_id, principal = ?self.principal, "{}", args);
    }

    /// Logs a warning-level message.
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(request_id = %self.request_id, principal = ?self.principal, "{}", args);
    }

    /// Logs an error-level message.
    pub fn error(&self, args: fmt::Arguments<'_>) {
        tracing::error!(request_id = %self.request_id, principal = ?self.principal, "{}", args);
    }

    /// Logs a debug-level message.
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(request_id = %self.request_id, principal = ?self.principal, "{}", args);
    }
}
