//! Memoization of role and permission lookups.
//!
//! Entries are grouped under a scope per relation (the link-table name), and
//! any mutation of a relation flushes its whole scope: a single decision reads
//! many roles' permissions at once, so per-row invalidation would leave other
//! entries stale.
//!
//! Backends without tag support are bypassed entirely; every read then goes to
//! the repository.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use entrust_core::{CacheError, EntrustConfig, EntrustResult, PrincipalId, RepositoryError, RoleId};

use crate::repository::RbacRepository;
use crate::{Permission, Role};

/// Invalidation tag covering every entry derived from one relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheScope(String);

impl CacheScope {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for CacheScope {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The cached relations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// Principal -> roles.
    PrincipalRoles,
    /// Role -> permissions.
    RolePermissions,
}

/// Key/value store with scoped invalidation.
///
/// Each scope carries a generation that `flush_scope` advances. A value is
/// only stored by `set` if the scope is still at the generation the caller
/// read before loading it, so a load that raced a flush is never cached.
///
/// `flush_scope` must be atomic with respect to concurrent `get` and `set`:
/// a reader sees either the old entry or none at all.
pub trait CacheBackend: Send + Sync {
    /// Whether entries can be grouped and flushed by scope.
    fn supports_tagging(&self) -> bool;

    /// Current generation of `scope`.
    fn generation(&self, scope: &CacheScope) -> Result<u64, CacheError>;

    fn get(&self, scope: &CacheScope, key: &str) -> Result<Option<JsonValue>, CacheError>;

    /// Store `value` unless `scope` has moved past `generation`. Returns
    /// whether the value was stored.
    fn set(
        &self,
        scope: &CacheScope,
        key: &str,
        value: JsonValue,
        ttl: Duration,
        generation: u64,
    ) -> Result<bool, CacheError>;

    fn flush_scope(&self, scope: &CacheScope) -> Result<(), CacheError>;
}

/// Read-through cache of the two relations the resolver needs.
pub struct RbacCache<R, B> {
    repository: Arc<R>,
    backend: Arc<B>,
    principal_roles: CacheScope,
    role_permissions: CacheScope,
    ttl: Duration,
}

impl<R, B> RbacCache<R, B>
where
    R: RbacRepository,
    B: CacheBackend,
{
    pub fn new(repository: Arc<R>, backend: Arc<B>, config: &EntrustConfig) -> Self {
        Self {
            repository,
            backend,
            principal_roles: CacheScope::new(config.tables.role_user.clone()),
            role_permissions: CacheScope::new(config.tables.permission_role.clone()),
            ttl: Duration::from_secs(config.cache_ttl_seconds),
        }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    pub fn scope(&self, relation: Relation) -> &CacheScope {
        match relation {
            Relation::PrincipalRoles => &self.principal_roles,
            Relation::RolePermissions => &self.role_permissions,
        }
    }

    pub fn roles_for(&self, principal_id: PrincipalId) -> EntrustResult<Vec<Role>> {
        let key = format!("roles_for_principal:{principal_id}");
        self.remember(Relation::PrincipalRoles, &key, || {
            self.repository.list_roles_for_principal(principal_id)
        })
    }

    pub fn permissions_for(&self, role_id: RoleId) -> EntrustResult<Vec<Permission>> {
        let key = format!("permissions_for_role:{role_id}");
        self.remember(Relation::RolePermissions, &key, || {
            self.repository.list_permissions_for_role(role_id)
        })
    }

    /// Flush every entry of `relation`. A no-op on backends without tagging.
    pub fn invalidate(&self, relation: Relation) -> EntrustResult<()> {
        if !self.backend.supports_tagging() {
            return Ok(());
        }
        let scope = self.scope(relation);
        self.backend.flush_scope(scope)?;
        tracing::info!(scope = %scope, "flushed rbac cache scope");
        Ok(())
    }

    fn remember<T, F>(&self, relation: Relation, key: &str, load: F) -> EntrustResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T, RepositoryError>,
    {
        if !self.backend.supports_tagging() {
            return Ok(load()?);
        }

        let scope = self.scope(relation);
        // Read before loading: a flush after this point voids the load.
        let generation = self.backend.generation(scope)?;
        if let Some(raw) = self.backend.get(scope, key)? {
            match serde_json::from_value::<T>(raw) {
                Ok(value) => {
                    tracing::debug!(scope = %scope, key, "rbac cache hit");
                    return Ok(value);
                }
                Err(e) => {
                    tracing::warn!(scope = %scope, key, error = %e, "discarding undecodable rbac cache entry");
                }
            }
        }

        tracing::debug!(scope = %scope, key, "rbac cache miss");
        let value = load()?;
        let raw = serde_json::to_value(&value).map_err(CacheError::from)?;
        if !self.backend.set(scope, key, raw, self.ttl, generation)? {
            tracing::debug!(scope = %scope, key, "scope flushed during load; result not cached");
        }
        Ok(value)
    }
}
