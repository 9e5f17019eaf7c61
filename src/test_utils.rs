//! Shared proptest strategies for unit tests.

use proptest::prelude::*;

use crate::{Principal, PrincipalId, Role};

/// Printable text without control characters or surrounding whitespace,
/// 1 to `max_len` characters long.
pub(crate) fn arb_clean_text(max_len: usize) -> impl Strategy<Value = String> {
    let tail = max_len.saturating_sub(1);
    prop::string::string_regex(&format!("[A-Za-z0-9][A-Za-z0-9 ,.#-]{{0,{}}}", tail))
        .expect("valid regex")
        .prop_map(|s| s.trim_end().to_string())
}

/// Any principal, either role.
pub(crate) fn arb_principal() -> impl Strategy<Value = Principal> {
    (1u64..64, "[A-Z][a-z]{2,10}", any::<bool>()).prop_map(|(id, name, admin)| Principal {
        id: PrincipalId::new(id),
        name,
        role: if admin { Role::Admin } else { Role::Standard },
    })
}
