//! Request gating by role, permission or ability, independent of any HTTP stack.
//!
//! Arguments arrive as route-style strings (`"admin|editor"`, `"api|web"`,
//! `"true"`), are parsed here, and the outcome is either an allowed identity
//! or a [`Denial`] carrying the configured unauthorized handler.

use std::sync::Arc;

use serde::Serialize;

use entrust_core::{EntrustConfig, EntrustError, EntrustResult, UnauthorizedHandler};

use crate::ability::AbilityOptions;
use crate::cache::CacheBackend;
use crate::guard::{GuardProvider, GuardResolution, GuardSelection, GuardSelector};
use crate::names::Names;
use crate::repository::RbacRepository;
use crate::{Principal, Resolver};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Denial {
    /// Last guard evaluated, if any.
    pub guard: Option<String>,
    pub handler: UnauthorizedHandler,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow { guard: String, principal: Principal },
    Deny(Denial),
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow { .. })
    }
}

pub struct Gate<R, B, G> {
    resolver: Arc<Resolver<R, B>>,
    guards: Arc<GuardSelector<G>>,
    require_all: bool,
    handler: UnauthorizedHandler,
}

impl<R, B, G> Gate<R, B, G>
where
    R: RbacRepository,
    B: CacheBackend,
    G: GuardProvider,
{
    /// Fails if the configured unauthorized handling is unknown.
    pub fn new(
        resolver: Arc<Resolver<R, B>>,
        guards: Arc<GuardSelector<G>>,
        config: &EntrustConfig,
    ) -> EntrustResult<Self> {
        Ok(Self {
            resolver,
            guards,
            require_all: config.require_all_default,
            handler: config.middleware.handler()?,
        })
    }

    /// Allow when the selected principal holds the role(s) in `roles`.
    pub fn authorize_roles(&self, roles: &str, guards: impl Into<GuardSelection>) -> EntrustResult<GateDecision> {
        let names = Names::parse_list(roles);
        let resolution = self.guards.resolve(&guards.into(), |principal| {
            self.resolver.has_role(principal, names.clone(), self.require_all)
        })?;
        Ok(self.decide(resolution))
    }

    /// Allow when the selected principal holds the permission(s) in `permissions`.
    pub fn authorize_permissions(
        &self,
        permissions: &str,
        guards: impl Into<GuardSelection>,
    ) -> EntrustResult<GateDecision> {
        let names = Names::parse_list(permissions);
        let resolution = self.guards.resolve(&guards.into(), |principal| {
            self.resolver.has_permission(principal, names.clone(), self.require_all)
        })?;
        Ok(self.decide(resolution))
    }

    /// Allow when `ability(roles, permissions)` holds for the selected principal.
    ///
    /// `validate_all` is coerced like a boolean filter and rejected before any
    /// lookup when it is not boolean-like.
    pub fn authorize_ability(
        &self,
        roles: &str,
        permissions: &str,
        guards: impl Into<GuardSelection>,
        validate_all: Option<&str>,
    ) -> EntrustResult<GateDecision> {
        let validate_all = match validate_all {
            Some(raw) => coerce_bool(raw)?,
            None => false,
        };
        let options = AbilityOptions::new().validate_all(validate_all);
        let roles = Names::parse_list(roles);
        let permissions = Names::parse_list(permissions);

        let resolution = self.guards.resolve(&guards.into(), |principal| {
            let outcome = self
                .resolver
                .ability(principal, roles.clone(), permissions.clone(), options)?;
            Ok(outcome.granted().unwrap_or(false))
        })?;
        Ok(self.decide(resolution))
    }

    fn decide(&self, resolution: GuardResolution) -> GateDecision {
        match resolution {
            GuardResolution {
                guard: Some(guard),
                principal: Some(principal),
                authorized: true,
            } => GateDecision::Allow { guard, principal },
            GuardResolution { guard, .. } => {
                tracing::info!(guard = ?guard, "request denied");
                GateDecision::Deny(Denial {
                    guard,
                    handler: self.handler.clone(),
                })
            }
        }
    }
}

/// Boolean coercion for route arguments.
pub fn coerce_bool(raw: &str) -> EntrustResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" | "" => Ok(false),
        other => Err(EntrustError::invalid_configuration(format!(
            "validate_all must be boolean-like (got '{other}')"
        ))),
    }
}
