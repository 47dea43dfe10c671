use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use entrust_core::{EntrustConfig, EntrustResult};

use crate::ability::{AbilityOptions, AbilityOutcome, AbilityReport};
use crate::cache::{CacheBackend, RbacCache};
use crate::combinator::Requirement;
use crate::names::{ABILITY_DELIMITERS, Names};
use crate::ownership::{Ownable, OwnsOptions};
use crate::repository::RbacRepository;
use crate::wildcard::PermissionPattern;
use crate::{Permission, Principal, Role};

/// Authorization decisions for a principal.
///
/// Stateless per call: everything it knows comes from the cache (and, on a
/// miss, the repository). Collaborator errors propagate unchanged.
pub struct Resolver<R, B> {
    cache: Arc<RbacCache<R, B>>,
    owner_foreign_key: String,
}

impl<R, B> Resolver<R, B>
where
    R: RbacRepository,
    B: CacheBackend,
{
    pub fn new(cache: Arc<RbacCache<R, B>>, config: &EntrustConfig) -> Self {
        Self {
            cache,
            owner_foreign_key: config.foreign_keys.user.clone(),
        }
    }

    pub fn cache(&self) -> &Arc<RbacCache<R, B>> {
        &self.cache
    }

    /// Whether the principal holds the named role(s).
    ///
    /// A single name is an exact membership test. A list is evaluated in order
    /// under `require_all` (all must hold) or not (any must hold).
    pub fn has_role(&self, principal: &Principal, names: impl Into<Names>, require_all: bool) -> EntrustResult<bool> {
        let names = names.into();
        let roles = self.cache.roles_for(principal.id)?;

        let decision = match names {
            Names::Single(name) => holds_role(&roles, &name),
            Names::List(names) => Requirement::from(require_all).evaluate(names.iter(), |name| holds_role(&roles, name)),
        };
        tracing::debug!(principal = %principal.id, decision, "has_role");
        Ok(decision)
    }

    /// Whether any of the principal's roles grants the named permission(s).
    ///
    /// Queries may contain `*` wildcards.
    pub fn has_permission(
        &self,
        principal: &Principal,
        names: impl Into<Names>,
        require_all: bool,
    ) -> EntrustResult<bool> {
        let names = names.into();
        let granted = self.granted_permissions(principal)?;

        let decision = match names {
            Names::Single(name) => grants(&granted, &name),
            Names::List(names) => Requirement::from(require_all).evaluate(names.iter(), |name| grants(&granted, name)),
        };
        tracing::debug!(principal = %principal.id, decision, "has_permission");
        Ok(decision)
    }

    /// Alias of [`Resolver::has_permission`].
    pub fn can(&self, principal: &Principal, names: impl Into<Names>, require_all: bool) -> EntrustResult<bool> {
        self.has_permission(principal, names, require_all)
    }

    /// Alias of [`Resolver::has_permission`].
    pub fn is_able_to(&self, principal: &Principal, names: impl Into<Names>, require_all: bool) -> EntrustResult<bool> {
        self.has_permission(principal, names, require_all)
    }

    /// Joint role and permission check.
    ///
    /// Every requested name is evaluated and recorded (no short-circuit).
    /// With `validate_all` the decision is true iff every outcome is true
    /// (vacuously true when nothing was requested); otherwise iff at least
    /// one outcome is true.
    pub fn ability(
        &self,
        principal: &Principal,
        roles: impl Into<Names>,
        permissions: impl Into<Names>,
        options: AbilityOptions,
    ) -> EntrustResult<AbilityOutcome> {
        let roles = roles.into().into_list_with(&ABILITY_DELIMITERS);
        let permissions = permissions.into().into_list_with(&ABILITY_DELIMITERS);

        let mut report = AbilityReport::default();

        if !roles.is_empty() {
            let held = self.cache.roles_for(principal.id)?;
            for name in roles {
                let outcome = holds_role(&held, &name);
                report.roles.insert(name, outcome);
            }
        }

        if !permissions.is_empty() {
            let granted = self.granted_permissions(principal)?;
            for name in permissions {
                let outcome = grants(&granted, &name);
                report.permissions.insert(name, outcome);
            }
        }

        let outcome = AbilityOutcome::shape(report, &options);
        tracing::debug!(
            principal = %principal.id,
            validate_all = options.validate_all,
            return_type = ?options.return_type,
            "ability evaluated"
        );
        Ok(outcome)
    }

    /// [`Resolver::ability`] with loosely-typed options, validated before any lookup.
    pub fn ability_with(
        &self,
        principal: &Principal,
        roles: impl Into<Names>,
        permissions: impl Into<Names>,
        options: &JsonValue,
    ) -> EntrustResult<AbilityOutcome> {
        let options = AbilityOptions::from_value(options)?;
        self.ability(principal, roles, permissions, options)
    }

    /// Whether `thing` belongs to the principal.
    pub fn owns<T: Ownable + ?Sized>(&self, principal: &Principal, thing: &T, foreign_key: Option<&str>) -> bool {
        thing.is_owned_by(principal, foreign_key.unwrap_or(&self.owner_foreign_key))
    }

    pub fn has_role_and_owns<T: Ownable + ?Sized>(
        &self,
        principal: &Principal,
        names: impl Into<Names>,
        thing: &T,
        options: &OwnsOptions,
    ) -> EntrustResult<bool> {
        Ok(self.has_role(principal, names, options.require_all)?
            && self.owns(principal, thing, options.foreign_key.as_deref()))
    }

    pub fn can_and_owns<T: Ownable + ?Sized>(
        &self,
        principal: &Principal,
        names: impl Into<Names>,
        thing: &T,
        options: &OwnsOptions,
    ) -> EntrustResult<bool> {
        Ok(self.has_permission(principal, names, options.require_all)?
            && self.owns(principal, thing, options.foreign_key.as_deref()))
    }

    /// Exact-name permission check on a single role.
    pub fn role_has_permission(&self, role: &Role, names: impl Into<Names>, require_all: bool) -> EntrustResult<bool> {
        let permissions = self.cache.permissions_for(role.id)?;
        let has = |name: &str| permissions.iter().any(|p| p.name == name);

        Ok(match names.into() {
            Names::Single(name) => has(name.as_str()),
            Names::List(names) => Requirement::from(require_all).evaluate(names.iter(), |name| has(name.as_str())),
        })
    }

    /// Every permission granted through the principal's roles, unique by
    /// name, in first-seen order.
    pub fn all_permissions(&self, principal: &Principal) -> EntrustResult<Vec<Permission>> {
        let mut seen = HashSet::new();
        Ok(self
            .granted_permissions(principal)?
            .into_iter()
            .filter(|p| seen.insert(p.name.clone()))
            .collect())
    }

    fn granted_permissions(&self, principal: &Principal) -> EntrustResult<Vec<Permission>> {
        let mut granted = Vec::new();
        for role in self.cache.roles_for(principal.id)? {
            granted.extend(self.cache.permissions_for(role.id)?);
        }
        Ok(granted)
    }
}

fn holds_role(roles: &[Role], name: &str) -> bool {
    roles.iter().any(|r| r.name == name)
}

fn grants(granted: &[Permission], query: &str) -> bool {
    let pattern = PermissionPattern::new(query);
    granted.iter().any(|p| pattern.matches(&p.name))
}
