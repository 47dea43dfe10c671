use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use entrust_auth::{DeleteMode, Permission, Principal, RbacRepository, Role};
use entrust_core::{PermissionId, PrincipalId, RepositoryError, RoleId};

/// A stored entity plus its soft-delete flag.
#[derive(Debug, Clone)]
struct Record<T> {
    value: T,
    deleted: bool,
}

impl<T> Record<T> {
    fn live(value: T) -> Self {
        Self { value, deleted: false }
    }
}

#[derive(Debug, Default)]
struct State {
    principals: HashMap<PrincipalId, Record<Principal>>,
    roles: HashMap<RoleId, Record<Role>>,
    permissions: HashMap<PermissionId, Record<Permission>>,
    /// `role_user` rows in attach order.
    role_user: Vec<(PrincipalId, RoleId)>,
    /// `permission_role` rows in attach order.
    permission_role: Vec<(PermissionId, RoleId)>,
}

impl State {
    fn live_principal(&self, id: PrincipalId) -> Result<&Principal, RepositoryError> {
        match self.principals.get(&id) {
            Some(record) if !record.deleted => Ok(&record.value),
            _ => Err(RepositoryError::not_found(format!("principal {id}"))),
        }
    }

    fn live_role(&self, id: RoleId) -> Result<&Role, RepositoryError> {
        match self.roles.get(&id) {
            Some(record) if !record.deleted => Ok(&record.value),
            _ => Err(RepositoryError::not_found(format!("role {id}"))),
        }
    }

    fn live_permission(&self, id: PermissionId) -> Result<&Permission, RepositoryError> {
        match self.permissions.get(&id) {
            Some(record) if !record.deleted => Ok(&record.value),
            _ => Err(RepositoryError::not_found(format!("permission {id}"))),
        }
    }

    fn link_role(&mut self, principal_id: PrincipalId, role_id: RoleId) {
        if !self.role_user.contains(&(principal_id, role_id)) {
            self.role_user.push((principal_id, role_id));
        }
    }

    fn link_permission(&mut self, permission_id: PermissionId, role_id: RoleId) {
        if !self.permission_role.contains(&(permission_id, role_id)) {
            self.permission_role.push((permission_id, role_id));
        }
    }
}

/// In-memory principals, roles, permissions and link tables.
///
/// Intended for tests/dev. Role and permission names are unique; soft-deleted
/// entities are hidden from every query but keep their link rows.
#[derive(Debug, Default)]
pub struct InMemoryRbacRepository {
    state: RwLock<State>,
}

impl InMemoryRbacRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, RepositoryError> {
        self.state
            .read()
            .map_err(|_| RepositoryError::unavailable("lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, RepositoryError> {
        self.state
            .write()
            .map_err(|_| RepositoryError::unavailable("lock poisoned"))
    }

    pub fn insert_principal(&self, principal: Principal) -> Result<(), RepositoryError> {
        let mut state = self.write()?;
        if state.principals.contains_key(&principal.id) {
            return Err(RepositoryError::conflict(format!("principal {} already exists", principal.id)));
        }
        state.principals.insert(principal.id, Record::live(principal));
        Ok(())
    }

    pub fn insert_role(&self, role: Role) -> Result<(), RepositoryError> {
        let mut state = self.write()?;
        if state.roles.contains_key(&role.id) || state.roles.values().any(|r| r.value.name == role.name) {
            return Err(RepositoryError::conflict(format!("role '{}' already exists", role.name)));
        }
        state.roles.insert(role.id, Record::live(role));
        Ok(())
    }

    pub fn insert_permission(&self, permission: Permission) -> Result<(), RepositoryError> {
        let mut state = self.write()?;
        if state.permissions.contains_key(&permission.id)
            || state.permissions.values().any(|p| p.value.name == permission.name)
        {
            return Err(RepositoryError::conflict(format!(
                "permission '{}' already exists",
                permission.name
            )));
        }
        state.permissions.insert(permission.id, Record::live(permission));
        Ok(())
    }

    /// Number of link rows `(role_user, permission_role)`, soft-deleted endpoints included.
    pub fn link_counts(&self) -> Result<(usize, usize), RepositoryError> {
        let state = self.read()?;
        Ok((state.role_user.len(), state.permission_role.len()))
    }
}

impl RbacRepository for InMemoryRbacRepository {
    fn list_roles_for_principal(&self, principal_id: PrincipalId) -> Result<Vec<Role>, RepositoryError> {
        let state = self.read()?;
        // A soft-deleted principal keeps its rows but holds nothing.
        if state.live_principal(principal_id).is_err() {
            return Ok(Vec::new());
        }
        Ok(state
            .role_user
            .iter()
            .filter(|(p, _)| *p == principal_id)
            .filter_map(|(_, r)| state.live_role(*r).ok().cloned())
            .collect())
    }

    fn list_permissions_for_role(&self, role_id: RoleId) -> Result<Vec<Permission>, RepositoryError> {
        let state = self.read()?;
        Ok(state
            .permission_role
            .iter()
            .filter(|(_, r)| *r == role_id)
            .filter_map(|(p, _)| state.live_permission(*p).ok().cloned())
            .collect())
    }

    fn list_principals_for_role(&self, role_id: RoleId) -> Result<Vec<Principal>, RepositoryError> {
        let state = self.read()?;
        Ok(state
            .role_user
            .iter()
            .filter(|(_, r)| *r == role_id)
            .filter_map(|(p, _)| state.live_principal(*p).ok().cloned())
            .collect())
    }

    fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, RepositoryError> {
        let state = self.read()?;
        Ok(state
            .roles
            .values()
            .find(|r| !r.deleted && r.value.name == name)
            .map(|r| r.value.clone()))
    }

    fn attach_role_to_principal(&self, principal_id: PrincipalId, role_id: RoleId) -> Result<(), RepositoryError> {
        let mut state = self.write()?;
        state.live_principal(principal_id)?;
        state.live_role(role_id)?;
        state.link_role(principal_id, role_id);
        Ok(())
    }

    fn detach_role_from_principal(&self, principal_id: PrincipalId, role_id: RoleId) -> Result<(), RepositoryError> {
        let mut state = self.write()?;
        state.role_user.retain(|link| *link != (principal_id, role_id));
        Ok(())
    }

    fn sync_roles_for_principal(&self, principal_id: PrincipalId, role_ids: &[RoleId]) -> Result<(), RepositoryError> {
        let mut state = self.write()?;
        state.live_principal(principal_id)?;
        for role_id in role_ids {
            state.live_role(*role_id)?;
        }

        state.role_user.retain(|(p, _)| *p != principal_id);
        for role_id in role_ids {
            state.link_role(principal_id, *role_id);
        }
        Ok(())
    }

    fn attach_permission_to_role(&self, role_id: RoleId, permission_id: PermissionId) -> Result<(), RepositoryError> {
        let mut state = self.write()?;
        state.live_role(role_id)?;
        state.live_permission(permission_id)?;
        state.link_permission(permission_id, role_id);
        Ok(())
    }

    fn detach_permission_from_role(&self, role_id: RoleId, permission_id: PermissionId) -> Result<(), RepositoryError> {
        let mut state = self.write()?;
        state.permission_role.retain(|link| *link != (permission_id, role_id));
        Ok(())
    }

    fn sync_permissions_for_role(&self, role_id: RoleId, permission_ids: &[PermissionId]) -> Result<(), RepositoryError> {
        let mut state = self.write()?;
        state.live_role(role_id)?;
        for permission_id in permission_ids {
            state.live_permission(*permission_id)?;
        }

        state.permission_role.retain(|(_, r)| *r != role_id);
        for permission_id in permission_ids {
            state.link_permission(*permission_id, role_id);
        }
        Ok(())
    }

    fn before_delete_role(&self, role_id: RoleId) -> Result<(), RepositoryError> {
        let mut state = self.write()?;
        state.role_user.retain(|(_, r)| *r != role_id);
        state.permission_role.retain(|(_, r)| *r != role_id);
        Ok(())
    }

    fn before_delete_principal(&self, principal_id: PrincipalId) -> Result<(), RepositoryError> {
        let mut state = self.write()?;
        state.role_user.retain(|(p, _)| *p != principal_id);
        Ok(())
    }

    fn before_delete_permission(&self, permission_id: PermissionId) -> Result<(), RepositoryError> {
        let mut state = self.write()?;
        state.permission_role.retain(|(p, _)| *p != permission_id);
        Ok(())
    }

    fn delete_role(&self, role_id: RoleId, mode: DeleteMode) -> Result<(), RepositoryError> {
        let mut state = self.write()?;
        match mode {
            DeleteMode::Soft => {
                state.live_role(role_id)?;
                if let Some(record) = state.roles.get_mut(&role_id) {
                    record.deleted = true;
                }
            }
            DeleteMode::Force => {
                state
                    .roles
                    .remove(&role_id)
                    .ok_or_else(|| RepositoryError::not_found(format!("role {role_id}")))?;
            }
        }
        Ok(())
    }

    fn delete_principal(&self, principal_id: PrincipalId, mode: DeleteMode) -> Result<(), RepositoryError> {
        let mut state = self.write()?;
        match mode {
            DeleteMode::Soft => {
                state.live_principal(principal_id)?;
                if let Some(record) = state.principals.get_mut(&principal_id) {
                    record.deleted = true;
                }
            }
            DeleteMode::Force => {
                state
                    .principals
                    .remove(&principal_id)
                    .ok_or_else(|| RepositoryError::not_found(format!("principal {principal_id}")))?;
            }
        }
        Ok(())
    }

    fn delete_permission(&self, permission_id: PermissionId, mode: DeleteMode) -> Result<(), RepositoryError> {
        let mut state = self.write()?;
        match mode {
            DeleteMode::Soft => {
                state.live_permission(permission_id)?;
                if let Some(record) = state.permissions.get_mut(&permission_id) {
                    record.deleted = true;
                }
            }
            DeleteMode::Force => {
                state
                    .permissions
                    .remove(&permission_id)
                    .ok_or_else(|| RepositoryError::not_found(format!("permission {permission_id}")))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> (InMemoryRbacRepository, Principal, Role, Permission) {
        let repo = InMemoryRbacRepository::new();
        let alice = Principal::new("alice");
        let editor = Role::new("editor");
        let edit = Permission::new("post-edit");
        repo.insert_principal(alice.clone()).unwrap();
        repo.insert_role(editor.clone()).unwrap();
        repo.insert_permission(edit.clone()).unwrap();
        repo.attach_role_to_principal(alice.id, editor.id).unwrap();
        repo.attach_permission_to_role(editor.id, edit.id).unwrap();
        (repo, alice, editor, edit)
    }

    #[test]
    fn duplicate_names_conflict() {
        let (repo, _, _, _) = seeded();
        let err = repo.insert_role(Role::new("editor")).unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        let err = repo.insert_permission(Permission::new("post-edit")).unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[test]
    fn links_to_unknown_entities_are_rejected() {
        let (repo, alice, editor, _) = seeded();
        assert!(matches!(
            repo.attach_role_to_principal(alice.id, RoleId::new()),
            Err(RepositoryError::NotFound(_))
        ));
        assert!(matches!(
            repo.attach_permission_to_role(editor.id, PermissionId::new()),
            Err(RepositoryError::NotFound(_))
        ));
        assert!(matches!(
            repo.sync_roles_for_principal(alice.id, &[editor.id, RoleId::new()]),
            Err(RepositoryError::NotFound(_))
        ));
        // A rejected sync leaves the existing links alone.
        assert_eq!(repo.list_roles_for_principal(alice.id).unwrap(), vec![editor]);
    }

    #[test]
    fn attach_is_idempotent_and_ordered() {
        let (repo, alice, editor, _) = seeded();
        let admin = Role::new("admin");
        repo.insert_role(admin.clone()).unwrap();
        repo.attach_role_to_principal(alice.id, admin.id).unwrap();
        repo.attach_role_to_principal(alice.id, editor.id).unwrap();

        let names: Vec<_> = repo
            .list_roles_for_principal(alice.id)
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["editor", "admin"]);
    }

    #[test]
    fn sync_replaces_the_set() {
        let (repo, _, editor, edit) = seeded();
        let read = Permission::new("post-read");
        repo.insert_permission(read.clone()).unwrap();

        repo.sync_permissions_for_role(editor.id, &[read.id]).unwrap();
        assert_eq!(repo.list_permissions_for_role(editor.id).unwrap(), vec![read]);

        repo.sync_permissions_for_role(editor.id, &[]).unwrap();
        assert!(repo.list_permissions_for_role(editor.id).unwrap().is_empty());
        assert!(repo.attach_permission_to_role(editor.id, edit.id).is_ok());
    }

    #[test]
    fn soft_delete_hides_but_keeps_links() {
        let (repo, alice, editor, _) = seeded();
        repo.delete_role(editor.id, DeleteMode::Soft).unwrap();

        assert!(repo.list_roles_for_principal(alice.id).unwrap().is_empty());
        assert!(repo.find_role_by_name("editor").unwrap().is_none());
        assert_eq!(repo.link_counts().unwrap(), (1, 1));
        assert!(matches!(
            repo.delete_role(editor.id, DeleteMode::Soft),
            Err(RepositoryError::NotFound(_))
        ));
    }

    #[test]
    fn forced_delete_after_hook_leaves_no_links() {
        let (repo, alice, editor, _) = seeded();
        repo.before_delete_role(editor.id).unwrap();
        repo.delete_role(editor.id, DeleteMode::Force).unwrap();

        assert_eq!(repo.link_counts().unwrap(), (0, 0));
        assert!(repo.list_roles_for_principal(alice.id).unwrap().is_empty());
        assert!(matches!(
            repo.delete_role(editor.id, DeleteMode::Force),
            Err(RepositoryError::NotFound(_))
        ));
    }

    #[test]
    fn principals_for_role_skip_deleted_principals() {
        let (repo, alice, editor, _) = seeded();
        let bob = Principal::new("bob");
        repo.insert_principal(bob.clone()).unwrap();
        repo.attach_role_to_principal(bob.id, editor.id).unwrap();

        repo.delete_principal(alice.id, DeleteMode::Soft).unwrap();
        assert_eq!(repo.list_principals_for_role(editor.id).unwrap(), vec![bob]);
    }

    #[test]
    fn soft_deleted_principal_holds_no_roles() {
        let (repo, alice, editor, _) = seeded();
        repo.delete_principal(alice.id, DeleteMode::Soft).unwrap();

        assert!(repo.list_roles_for_principal(alice.id).unwrap().is_empty());
        assert_eq!(repo.link_counts().unwrap(), (1, 1));
        assert_eq!(repo.list_permissions_for_role(editor.id).unwrap().len(), 1);
    }
}
