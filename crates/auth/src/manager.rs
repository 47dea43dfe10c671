//! Link mutations and deletes, each followed by the matching cache flush.
//!
//! Repository implementations don't need to know about the cache: going
//! through [`RbacManager`] is what keeps cached decisions from going stale.

use std::sync::Arc;

use entrust_core::{EntrustResult, PermissionId, PrincipalId, RepositoryError, RoleId};

use crate::Principal;
use crate::cache::{CacheBackend, RbacCache, Relation};
use crate::repository::{DeleteMode, RbacRepository};

pub struct RbacManager<R, B> {
    cache: Arc<RbacCache<R, B>>,
}

impl<R, B> RbacManager<R, B>
where
    R: RbacRepository,
    B: CacheBackend,
{
    pub fn new(cache: Arc<RbacCache<R, B>>) -> Self {
        Self { cache }
    }

    fn repository(&self) -> &R {
        self.cache.repository()
    }

    /// Flush `relations` whether or not `outcome` succeeded, then report the
    /// first failure. A multi-step mutation that fails halfway has still
    /// changed the store.
    fn flush_after(&self, outcome: Result<(), RepositoryError>, relations: &[Relation]) -> EntrustResult<()> {
        let mut flushed = Ok(());
        for relation in relations {
            let result = self.cache.invalidate(*relation);
            if flushed.is_ok() {
                flushed = result;
            }
        }
        if let Err(err) = &outcome {
            tracing::warn!(error = %err, "rbac mutation failed; flushed cache anyway");
        }
        outcome?;
        flushed
    }

    // ─────────────────────────────────────────────────────────────────────
    // Principal <-> Role
    // ─────────────────────────────────────────────────────────────────────

    pub fn attach_role(&self, principal_id: PrincipalId, role_id: RoleId) -> EntrustResult<()> {
        let outcome = self.repository().attach_role_to_principal(principal_id, role_id);
        self.flush_after(outcome, &[Relation::PrincipalRoles])
    }

    pub fn attach_roles(&self, principal_id: PrincipalId, role_ids: &[RoleId]) -> EntrustResult<()> {
        let outcome = role_ids
            .iter()
            .try_for_each(|role_id| self.repository().attach_role_to_principal(principal_id, *role_id));
        self.flush_after(outcome, &[Relation::PrincipalRoles])
    }

    pub fn detach_role(&self, principal_id: PrincipalId, role_id: RoleId) -> EntrustResult<()> {
        let outcome = self.repository().detach_role_from_principal(principal_id, role_id);
        self.flush_after(outcome, &[Relation::PrincipalRoles])
    }

    /// Detach `role_ids`, or every current role when the slice is empty.
    pub fn detach_roles(&self, principal_id: PrincipalId, role_ids: &[RoleId]) -> EntrustResult<()> {
        let role_ids = if role_ids.is_empty() {
            self.repository()
                .list_roles_for_principal(principal_id)?
                .into_iter()
                .map(|r| r.id)
                .collect()
        } else {
            role_ids.to_vec()
        };

        let outcome = role_ids
            .into_iter()
            .try_for_each(|role_id| self.repository().detach_role_from_principal(principal_id, role_id));
        self.flush_after(outcome, &[Relation::PrincipalRoles])
    }

    pub fn sync_roles(&self, principal_id: PrincipalId, role_ids: &[RoleId]) -> EntrustResult<()> {
        let outcome = self.repository().sync_roles_for_principal(principal_id, role_ids);
        self.flush_after(outcome, &[Relation::PrincipalRoles])
    }

    // ─────────────────────────────────────────────────────────────────────
    // Role <-> Permission
    // ─────────────────────────────────────────────────────────────────────

    pub fn attach_permission(&self, role_id: RoleId, permission_id: PermissionId) -> EntrustResult<()> {
        let outcome = self.repository().attach_permission_to_role(role_id, permission_id);
        self.flush_after(outcome, &[Relation::RolePermissions])
    }

    pub fn attach_permissions(&self, role_id: RoleId, permission_ids: &[PermissionId]) -> EntrustResult<()> {
        let outcome = permission_ids
            .iter()
            .try_for_each(|permission_id| self.repository().attach_permission_to_role(role_id, *permission_id));
        self.flush_after(outcome, &[Relation::RolePermissions])
    }

    pub fn detach_permission(&self, role_id: RoleId, permission_id: PermissionId) -> EntrustResult<()> {
        let outcome = self.repository().detach_permission_from_role(role_id, permission_id);
        self.flush_after(outcome, &[Relation::RolePermissions])
    }

    /// Detach `permission_ids`, or every permission of the role when `None`.
    pub fn detach_permissions(&self, role_id: RoleId, permission_ids: Option<&[PermissionId]>) -> EntrustResult<()> {
        let permission_ids = match permission_ids {
            Some(ids) => ids.to_vec(),
            None => self
                .repository()
                .list_permissions_for_role(role_id)?
                .into_iter()
                .map(|p| p.id)
                .collect(),
        };

        let outcome = permission_ids
            .into_iter()
            .try_for_each(|permission_id| self.repository().detach_permission_from_role(role_id, permission_id));
        self.flush_after(outcome, &[Relation::RolePermissions])
    }

    /// Replace the role's permissions; an empty slice detaches them all.
    pub fn sync_permissions(&self, role_id: RoleId, permission_ids: &[PermissionId]) -> EntrustResult<()> {
        let outcome = self.repository().sync_permissions_for_role(role_id, permission_ids);
        self.flush_after(outcome, &[Relation::RolePermissions])
    }

    // ─────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────

    /// Delete a role. A forced delete removes its principal and permission
    /// links first; a soft delete cascades nothing.
    pub fn delete_role(&self, role_id: RoleId, mode: DeleteMode) -> EntrustResult<()> {
        let repository = self.repository();
        let outcome = match mode {
            DeleteMode::Force => repository
                .before_delete_role(role_id)
                .and_then(|()| repository.delete_role(role_id, mode)),
            DeleteMode::Soft => repository.delete_role(role_id, mode),
        };
        if outcome.is_ok() {
            tracing::info!(role = %role_id, ?mode, "deleted role");
        }
        self.flush_after(outcome, &[Relation::PrincipalRoles, Relation::RolePermissions])
    }

    pub fn delete_principal(&self, principal_id: PrincipalId, mode: DeleteMode) -> EntrustResult<()> {
        let repository = self.repository();
        let outcome = match mode {
            DeleteMode::Force => repository
                .before_delete_principal(principal_id)
                .and_then(|()| repository.delete_principal(principal_id, mode)),
            DeleteMode::Soft => repository.delete_principal(principal_id, mode),
        };
        if outcome.is_ok() {
            tracing::info!(principal = %principal_id, ?mode, "deleted principal");
        }
        self.flush_after(outcome, &[Relation::PrincipalRoles])
    }

    pub fn delete_permission(&self, permission_id: PermissionId, mode: DeleteMode) -> EntrustResult<()> {
        let repository = self.repository();
        let outcome = match mode {
            DeleteMode::Force => repository
                .before_delete_permission(permission_id)
                .and_then(|()| repository.delete_permission(permission_id, mode)),
            DeleteMode::Soft => repository.delete_permission(permission_id, mode),
        };
        if outcome.is_ok() {
            tracing::info!(permission = %permission_id, ?mode, "deleted permission");
        }
        self.flush_after(outcome, &[Relation::RolePermissions])
    }

    // ─────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────

    /// Principals holding the role named `name` (empty when no such role).
    pub fn principals_with_role(&self, name: &str) -> EntrustResult<Vec<Principal>> {
        match self.repository().find_role_by_name(name)? {
            Some(role) => Ok(self.repository().list_principals_for_role(role.id)?),
            None => Ok(Vec::new()),
        }
    }
}
