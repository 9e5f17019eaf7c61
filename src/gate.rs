use crate::context::Ctx;
use crate::error::Violation;
use crate::policy::{authorize, Decision, Operation};

/// Checks a set of operations against the access policy for one request.
///
/// The gate is the only place lifecycle code turns a policy [`Decision`]
/// into an error: the first denied operation becomes a `Forbidden`
/// violation and is logged at warn level.
///
/// # Examples
///
/// ```
/// use shipment_core::{Ctx, Operation, PolicyGate, Principal, PrincipalId};
///
/// let ctx = Ctx::new("req-1")
///     .authenticate(Some(Principal::standard(PrincipalId::new(1), "Alice")))
///     .unwrap();
///
/// assert!(PolicyGate::new(&ctx).require(Operation::ListOwn).check().is_ok());
/// assert!(PolicyGate::new(&ctx).require(Operation::ListAll).check().is_err());
/// ```
pub struct PolicyGate<'a> {
    ctx: &'a Ctx,
    requirements: Vec<Operation>,
}

impl<'a> PolicyGate<'a> {
    /// Creates a gate for the principal of `ctx`.
    pub fn new(ctx: &'a Ctx) -> Self {
        Self {
            ctx,
            requirements: Vec::new(),
        }
    }

    /// Adds an operation to check; identical operations are kept once.
    pub fn require(mut self, operation: Operation) -> Self {
        if !self.requirements.contains(&operation) {
            self.requirements.push(operation);
        }
        self
    }

    /// Evaluates every required operation in order.
    ///
    /// # Errors
    ///
    /// Returns a `Forbidden` violation naming the first denied operation.
    pub fn check(self) -> Result<(), Violation> {
        let principal = self.ctx.principal();

        for operation in &self.requirements {
            if authorize(principal, *operation) == Decision::Deny {
                self.ctx.log().warn(format_args!(
                    "denied {} for {} principal",
                    operation, principal.role
                ));
                return Err(Violation::forbidden(operation.name()));
            }
        }

        Ok(())
    }
}
