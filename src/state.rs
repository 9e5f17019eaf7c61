//! Type-state markers for context progression.
//!
//! A request context starts as [`Unauthed`] and becomes [`Authed`] once a
//! principal has been resolved. Lifecycle operations only accept
//! `Ctx<Authed>`, so an anonymous call cannot reach them.

use crate::request::Principal;

/// Marker type for an unauthenticated context.
#[derive(Debug, Clone, Copy)]
pub struct Unauthed {
    _private: (),
}

impl Unauthed {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

/// State of an authenticated context: carries the resolved principal.
#[derive(Debug, Clone)]
pub struct Authed {
    pub(crate) principal: Principal,
}
