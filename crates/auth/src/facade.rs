//! Decision API bound to whoever is signed in on the default guard.

use std::sync::Arc;

use serde_json::Value as JsonValue;

use entrust_core::{EntrustConfig, EntrustResult};

use crate::ability::{AbilityOptions, AbilityOutcome};
use crate::cache::CacheBackend;
use crate::guard::{GuardProvider, GuardSelector};
use crate::names::Names;
use crate::ownership::{Ownable, OwnsOptions};
use crate::repository::RbacRepository;
use crate::{Principal, Resolver};

/// Every check answers `false` when nobody is signed in.
pub struct Entrust<R, B, G> {
    resolver: Arc<Resolver<R, B>>,
    guards: Arc<GuardSelector<G>>,
    require_all: bool,
}

impl<R, B, G> Entrust<R, B, G>
where
    R: RbacRepository,
    B: CacheBackend,
    G: GuardProvider,
{
    pub fn new(resolver: Arc<Resolver<R, B>>, guards: Arc<GuardSelector<G>>, config: &EntrustConfig) -> Self {
        Self {
            resolver,
            guards,
            require_all: config.require_all_default,
        }
    }

    /// The principal signed in on the default guard.
    pub fn user(&self) -> Option<Principal> {
        self.guards.current(None)
    }

    pub fn has_role(&self, names: impl Into<Names>) -> EntrustResult<bool> {
        match self.user() {
            Some(user) => self.resolver.has_role(&user, names, self.require_all),
            None => Ok(false),
        }
    }

    pub fn can(&self, names: impl Into<Names>) -> EntrustResult<bool> {
        match self.user() {
            Some(user) => self.resolver.can(&user, names, self.require_all),
            None => Ok(false),
        }
    }

    /// A signed-out caller gets `Boolean(false)` whatever shape was asked for.
    pub fn ability(
        &self,
        roles: impl Into<Names>,
        permissions: impl Into<Names>,
        options: &JsonValue,
    ) -> EntrustResult<AbilityOutcome> {
        let options = AbilityOptions::from_value(options)?;
        match self.user() {
            Some(user) => self.resolver.ability(&user, roles, permissions, options),
            None => Ok(AbilityOutcome::Boolean(false)),
        }
    }

    pub fn owns<T: Ownable + ?Sized>(&self, thing: &T, foreign_key: Option<&str>) -> bool {
        self.user()
            .is_some_and(|user| self.resolver.owns(&user, thing, foreign_key))
    }

    pub fn has_role_and_owns<T: Ownable + ?Sized>(
        &self,
        names: impl Into<Names>,
        thing: &T,
        options: &OwnsOptions,
    ) -> EntrustResult<bool> {
        match self.user() {
            Some(user) => self.resolver.has_role_and_owns(&user, names, thing, options),
            None => Ok(false),
        }
    }

    pub fn can_and_owns<T: Ownable + ?Sized>(
        &self,
        names: impl Into<Names>,
        thing: &T,
        options: &OwnsOptions,
    ) -> EntrustResult<bool> {
        match self.user() {
            Some(user) => self.resolver.can_and_owns(&user, names, thing, options),
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;
    use crate::testing::{FakeCache, FakeGuards, FakeRepository, resolver};
    use entrust_core::EntrustError;
    use serde_json::json;

    fn facade(guards: FakeGuards, repository: Arc<FakeRepository>) -> Entrust<FakeRepository, FakeCache, FakeGuards> {
        let config = EntrustConfig::default();
        let selector = Arc::new(GuardSelector::new(Arc::new(guards), "web"));
        Entrust::new(Arc::new(resolver(repository)), selector, &config)
    }

    #[test]
    fn signed_out_caller_is_refused_everything() {
        let entrust = facade(FakeGuards::default(), Arc::new(FakeRepository::default()));
        let thing = json!({ "user_id": "anything" });

        assert!(entrust.user().is_none());
        assert!(!entrust.has_role("admin").unwrap());
        assert!(!entrust.can("post-*").unwrap());
        assert_eq!(entrust.ability("admin", "post-edit", &JsonValue::Null).unwrap(), AbilityOutcome::Boolean(false));
        assert!(!entrust.owns(&thing, None));
        assert!(!entrust.has_role_and_owns("admin", &thing, &OwnsOptions::new()).unwrap());
        assert!(!entrust.can_and_owns("post-edit", &thing, &OwnsOptions::new()).unwrap());
    }

    #[test]
    fn signed_in_user_is_checked() {
        let repository = Arc::new(FakeRepository::default());
        let alice = Principal::new("alice");
        repository.grant(&alice, &Role::new("editor"), &["post-edit"]);
        let entrust = facade(FakeGuards::default().sign_in("web", &alice), repository);
        let post = json!({ "user_id": alice.id.to_string() });

        assert_eq!(entrust.user(), Some(alice));
        assert!(entrust.has_role("editor").unwrap());
        assert!(entrust.can("post-*").unwrap());
        assert!(entrust.owns(&post, None));
        assert!(entrust.can_and_owns("post-edit", &post, &OwnsOptions::new()).unwrap());
        assert_eq!(
            entrust
                .ability("admin", "post-edit", &json!({ "validate_all": true }))
                .unwrap(),
            AbilityOutcome::Boolean(false)
        );
    }

    #[test]
    fn invalid_options_fail_even_when_signed_out() {
        let entrust = facade(FakeGuards::default(), Arc::new(FakeRepository::default()));
        let err = entrust
            .ability("admin", "post-edit", &json!({ "return_type": "csv" }))
            .unwrap_err();
        assert!(matches!(err, EntrustError::InvalidConfiguration(_)));
    }
}
