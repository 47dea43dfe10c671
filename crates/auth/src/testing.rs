//! Minimal collaborators for unit tests in this crate.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::Value as JsonValue;

use entrust_core::{CacheError, EntrustConfig, PermissionId, PrincipalId, RepositoryError, RoleId};

use crate::cache::{CacheBackend, CacheScope, RbacCache};
use crate::guard::GuardProvider;
use crate::repository::{DeleteMode, RbacRepository};
use crate::{Permission, Principal, Resolver, Role};

#[derive(Default)]
pub struct FakeRepository {
    pub roles: Mutex<HashMap<PrincipalId, Vec<Role>>>,
    pub permissions: Mutex<HashMap<RoleId, Vec<Permission>>>,
    pub role_reads: AtomicUsize,
    pub permission_reads: AtomicUsize,
    pub fail: Mutex<Option<RepositoryError>>,
    pub mutations: AtomicUsize,
    mutation_limit: Mutex<Option<usize>>,
    after_permission_read: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl FakeRepository {
    pub fn grant(&self, principal: &Principal, role: &Role, permissions: &[&str]) {
        self.roles
            .lock()
            .unwrap()
            .entry(principal.id)
            .or_default()
            .push(role.clone());
        self.permissions
            .lock()
            .unwrap()
            .entry(role.id)
            .or_default()
            .extend(permissions.iter().map(|p| Permission::new(*p)));
    }

    pub fn fail_with(&self, err: RepositoryError) {
        *self.fail.lock().unwrap() = Some(err);
    }

    /// Let the first `n` mutations succeed and fail every later one.
    pub fn fail_mutations_after(&self, n: usize) {
        *self.mutation_limit.lock().unwrap() = Some(n);
    }

    /// Run `hook` once, right after the next permission read has loaded.
    pub fn after_next_permission_read(&self, hook: impl FnOnce() + Send + 'static) {
        *self.after_permission_read.lock().unwrap() = Some(Box::new(hook));
    }

    fn mutate(&self) -> Result<(), RepositoryError> {
        self.check()?;
        let n = self.mutations.fetch_add(1, Ordering::SeqCst);
        match *self.mutation_limit.lock().unwrap() {
            Some(limit) if n >= limit => Err(RepositoryError::unavailable("write rejected")),
            _ => Ok(()),
        }
    }

    fn check(&self) -> Result<(), RepositoryError> {
        match self.fail.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl RbacRepository for FakeRepository {
    fn list_roles_for_principal(&self, principal_id: PrincipalId) -> Result<Vec<Role>, RepositoryError> {
        self.check()?;
        self.role_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.roles.lock().unwrap().get(&principal_id).cloned().unwrap_or_default())
    }

    fn list_permissions_for_role(&self, role_id: RoleId) -> Result<Vec<Permission>, RepositoryError> {
        self.check()?;
        self.permission_reads.fetch_add(1, Ordering::SeqCst);
        let permissions = self.permissions.lock().unwrap().get(&role_id).cloned().unwrap_or_default();
        let hook = self.after_permission_read.lock().unwrap().take();
        if let Some(hook) = hook {
            hook();
        }
        Ok(permissions)
    }

    fn list_principals_for_role(&self, _role_id: RoleId) -> Result<Vec<Principal>, RepositoryError> {
        Ok(Vec::new())
    }

    fn find_role_by_name(&self, _name: &str) -> Result<Option<Role>, RepositoryError> {
        Ok(None)
    }

    fn attach_role_to_principal(&self, _: PrincipalId, _: RoleId) -> Result<(), RepositoryError> {
        self.mutate()
    }

    fn detach_role_from_principal(&self, _: PrincipalId, _: RoleId) -> Result<(), RepositoryError> {
        self.mutate()
    }

    fn sync_roles_for_principal(&self, _: PrincipalId, _: &[RoleId]) -> Result<(), RepositoryError> {
        self.mutate()
    }

    fn attach_permission_to_role(&self, role_id: RoleId, _: PermissionId) -> Result<(), RepositoryError> {
        self.mutate()?;
        self.permissions
            .lock()
            .unwrap()
            .entry(role_id)
            .or_default()
            .push(Permission::new("attached"));
        Ok(())
    }

    fn detach_permission_from_role(&self, role_id: RoleId, permission_id: PermissionId) -> Result<(), RepositoryError> {
        self.mutate()?;
        if let Some(held) = self.permissions.lock().unwrap().get_mut(&role_id) {
            held.retain(|p| p.id != permission_id);
        }
        Ok(())
    }

    fn sync_permissions_for_role(&self, _: RoleId, _: &[PermissionId]) -> Result<(), RepositoryError> {
        self.mutate()
    }

    fn before_delete_role(&self, _: RoleId) -> Result<(), RepositoryError> {
        self.mutate()
    }

    fn before_delete_principal(&self, _: PrincipalId) -> Result<(), RepositoryError> {
        self.mutate()
    }

    fn before_delete_permission(&self, _: PermissionId) -> Result<(), RepositoryError> {
        self.mutate()
    }

    fn delete_role(&self, _: RoleId, _: DeleteMode) -> Result<(), RepositoryError> {
        self.mutate()
    }

    fn delete_principal(&self, _: PrincipalId, _: DeleteMode) -> Result<(), RepositoryError> {
        self.mutate()
    }

    fn delete_permission(&self, _: PermissionId, _: DeleteMode) -> Result<(), RepositoryError> {
        self.mutate()
    }
}

/// Tag-aware map without expiry.
pub struct FakeCache {
    pub tagging: bool,
    pub entries: Mutex<HashMap<(CacheScope, String), JsonValue>>,
    pub generations: Mutex<HashMap<CacheScope, u64>>,
    pub flushes: AtomicUsize,
}

impl FakeCache {
    pub fn tagged() -> Self {
        Self {
            tagging: true,
            entries: Mutex::new(HashMap::new()),
            generations: Mutex::new(HashMap::new()),
            flushes: AtomicUsize::new(0),
        }
    }

    pub fn untagged() -> Self {
        Self {
            tagging: false,
            ..Self::tagged()
        }
    }
}

impl CacheBackend for FakeCache {
    fn supports_tagging(&self) -> bool {
        self.tagging
    }

    fn generation(&self, scope: &CacheScope) -> Result<u64, CacheError> {
        Ok(self.generations.lock().unwrap().get(scope).copied().unwrap_or(0))
    }

    fn get(&self, scope: &CacheScope, key: &str) -> Result<Option<JsonValue>, CacheError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .get(&(scope.clone(), key.to_string()))
            .cloned())
    }

    fn set(
        &self,
        scope: &CacheScope,
        key: &str,
        value: JsonValue,
        _ttl: Duration,
        generation: u64,
    ) -> Result<bool, CacheError> {
        let generations = self.generations.lock().unwrap();
        if generations.get(scope).copied().unwrap_or(0) != generation {
            return Ok(false);
        }
        self.entries
            .lock()
            .unwrap()
            .insert((scope.clone(), key.to_string()), value);
        Ok(true)
    }

    fn flush_scope(&self, scope: &CacheScope) -> Result<(), CacheError> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        let mut generations = self.generations.lock().unwrap();
        *generations.entry(scope.clone()).or_insert(0) += 1;
        self.entries.lock().unwrap().retain(|(s, _), _| s != scope);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeGuards {
    pub signed_in: HashMap<String, Principal>,
}

impl FakeGuards {
    pub fn sign_in(mut self, guard: &str, principal: &Principal) -> Self {
        self.signed_in.insert(guard.to_string(), principal.clone());
        self
    }
}

impl GuardProvider for FakeGuards {
    fn current_principal(&self, guard: &str) -> Option<Principal> {
        self.signed_in.get(guard).cloned()
    }
}

pub fn resolver(repository: Arc<FakeRepository>) -> Resolver<FakeRepository, FakeCache> {
    let config = EntrustConfig::default();
    let cache = Arc::new(RbacCache::new(repository, Arc::new(FakeCache::tagged()), &config));
    Resolver::new(cache, &config)
}
