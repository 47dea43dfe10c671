//! The persistence boundary for principals, roles, permissions and their links.
//!
//! The resolver only ever reads through [`RbacRepository::list_roles_for_principal`]
//! and [`RbacRepository::list_permissions_for_role`]. Mutations are issued by
//! [`crate::manager::RbacManager`], which pairs each one with a cache flush.

use entrust_core::{PermissionId, PrincipalId, RepositoryError, RoleId};

use crate::{Permission, Principal, Role};

/// How an entity is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    /// Mark as deleted; link rows are left untouched.
    Soft,
    /// Remove permanently; link rows are removed first.
    Force,
}

pub trait RbacRepository: Send + Sync {
    fn list_roles_for_principal(&self, principal_id: PrincipalId) -> Result<Vec<Role>, RepositoryError>;

    fn list_permissions_for_role(&self, role_id: RoleId) -> Result<Vec<Permission>, RepositoryError>;

    fn list_principals_for_role(&self, role_id: RoleId) -> Result<Vec<Principal>, RepositoryError>;

    fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, RepositoryError>;

    // Principal <-> Role links.

    fn attach_role_to_principal(&self, principal_id: PrincipalId, role_id: RoleId) -> Result<(), RepositoryError>;

    fn detach_role_from_principal(&self, principal_id: PrincipalId, role_id: RoleId) -> Result<(), RepositoryError>;

    /// Replace the principal's role set with exactly `role_ids`.
    fn sync_roles_for_principal(&self, principal_id: PrincipalId, role_ids: &[RoleId]) -> Result<(), RepositoryError>;

    // Role <-> Permission links.

    fn attach_permission_to_role(&self, role_id: RoleId, permission_id: PermissionId) -> Result<(), RepositoryError>;

    fn detach_permission_from_role(&self, role_id: RoleId, permission_id: PermissionId) -> Result<(), RepositoryError>;

    /// Replace the role's permission set with exactly `permission_ids`.
    fn sync_permissions_for_role(&self, role_id: RoleId, permission_ids: &[PermissionId]) -> Result<(), RepositoryError>;

    // Lifecycle hooks, invoked before a forced delete.

    /// Remove every principal and permission link of the role.
    fn before_delete_role(&self, role_id: RoleId) -> Result<(), RepositoryError>;

    /// Remove every role link of the principal.
    fn before_delete_principal(&self, principal_id: PrincipalId) -> Result<(), RepositoryError>;

    /// Remove every role link of the permission.
    fn before_delete_permission(&self, permission_id: PermissionId) -> Result<(), RepositoryError>;

    fn delete_role(&self, role_id: RoleId, mode: DeleteMode) -> Result<(), RepositoryError>;

    fn delete_principal(&self, principal_id: PrincipalId, mode: DeleteMode) -> Result<(), RepositoryError>;

    fn delete_permission(&self, permission_id: PermissionId, mode: DeleteMode) -> Result<(), RepositoryError>;
}
