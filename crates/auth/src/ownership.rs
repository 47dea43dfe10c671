//! Ownership checks for `owns`, `has_role_and_owns` and `can_and_owns`.

use std::str::FromStr;

use serde_json::Value as JsonValue;

use entrust_core::PrincipalId;

use crate::Principal;

/// Something that records which principal owns it.
pub trait Ownable {
    /// The owner id stored under `foreign_key`, if any.
    fn owner_key(&self, foreign_key: &str) -> Option<PrincipalId>;

    /// Override to implement ownership rules that are not a single field.
    fn is_owned_by(&self, principal: &Principal, foreign_key: &str) -> bool {
        self.owner_key(foreign_key) == Some(principal.id)
    }
}

/// JSON objects are owned through a string field holding the principal id.
impl Ownable for JsonValue {
    fn owner_key(&self, foreign_key: &str) -> Option<PrincipalId> {
        self.get(foreign_key)
            .and_then(JsonValue::as_str)
            .and_then(|raw| PrincipalId::from_str(raw).ok())
    }
}

/// Options for the `*_and_owns` checks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OwnsOptions {
    pub require_all: bool,
    /// Field holding the owner id; the configured user foreign key when `None`.
    pub foreign_key: Option<String>,
}

impl OwnsOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require_all(mut self, require_all: bool) -> Self {
        self.require_all = require_all;
        self
    }

    pub fn foreign_key(mut self, foreign_key: impl Into<String>) -> Self {
        self.foreign_key = Some(foreign_key.into());
        self
    }
}
