use serde::{Deserialize, Serialize};

use entrust_core::PrincipalId;

/// An authenticated actor (human user, service account, etc).
///
/// The resolver only reads principals; creating and deleting them belongs to
/// the repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    pub id: PrincipalId,
    pub name: String,
}

impl Principal {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: PrincipalId::new(),
            name: name.into(),
        }
    }

    pub fn with_id(id: PrincipalId, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }
}

impl core::fmt::Display for Principal {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}
