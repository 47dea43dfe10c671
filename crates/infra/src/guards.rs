//! Guard provider backed by a map of signed-in principals.

use std::collections::HashMap;
use std::sync::RwLock;

use entrust_auth::{GuardProvider, Principal};

/// Who is signed in on each named guard.
///
/// Stands in for the host's authentication layer in tests and embedded use.
#[derive(Debug, Default)]
pub struct StaticGuardProvider {
    sessions: RwLock<HashMap<String, Principal>>,
}

impl StaticGuardProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sign_in(&self, guard: impl Into<String>, principal: Principal) {
        match self.sessions.write() {
            Ok(mut sessions) => {
                sessions.insert(guard.into(), principal);
            }
            Err(_) => tracing::warn!("guard sessions lock poisoned; sign-in dropped"),
        }
    }

    pub fn sign_out(&self, guard: &str) {
        if let Ok(mut sessions) = self.sessions.write() {
            sessions.remove(guard);
        }
    }
}

impl GuardProvider for StaticGuardProvider {
    /// A poisoned session map reads as signed out.
    fn current_principal(&self, guard: &str) -> Option<Principal> {
        self.sessions.read().ok()?.get(guard).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_in_and_out_per_guard() {
        let guards = StaticGuardProvider::new();
        let alice = Principal::new("alice");
        guards.sign_in("web", alice.clone());

        assert_eq!(guards.current_principal("web"), Some(alice));
        assert!(guards.is_guest("api"));

        guards.sign_out("web");
        assert!(guards.is_guest("web"));
    }
}
