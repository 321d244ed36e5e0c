use crate::permission::Permission;
use crate::registry::RoleRegistry;
use crate::store::RoleStore;
use crate::types::UserRecord;
use std::collections::HashSet;

/// The single authorization primitive every other check is built from.
///
/// Grants are resolved in layers: a disabled user is denied outright, an
/// explicit grant short-circuits, and role names are resolved through the
/// registry otherwise. Grants are monotonic: adding an explicit permission
/// or extending a role's set can only add grants, never remove previously
/// granted ones.
pub struct PermissionResolver<'a, R> {
    registry: &'a RoleRegistry<R>,
}

impl<'a, R: RoleStore> PermissionResolver<'a, R> {
    /// Creates a resolver over a role registry.
    pub fn new(registry: &'a RoleRegistry<R>) -> Self {
        Self { registry }
    }

    /// Returns whether the user holds `permission`, directly or via a role.
    ///
    /// Fails closed: disabled users and registry failures resolve to false.
    pub async fn has_permission(&self, user: &UserRecord, permission: &Permission) -> bool {
        if user.disabled {
            return false;
        }
        if user.explicit_permissions.contains(permission) {
            return true;
        }
        for role_name in &user.role_names {
            if self.registry.lookup(role_name).await.contains(permission) {
                return true;
            }
        }
        false
    }

    /// Returns the full effective permission set: explicit grants unioned
    /// with every resolvable role's permissions. Empty for disabled users.
    pub async fn effective_permissions(&self, user: &UserRecord) -> HashSet<Permission> {
        if user.disabled {
            return HashSet::new();
        }
        let mut out = user.explicit_permissions.clone();
        for role_name in &user.role_names {
            out.extend(self.registry.lookup(role_name).await);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RoleStore;
    use crate::types::{RoleDefinition, UserId};
    use async_trait::async_trait;
    use futures::executor::block_on;
    use std::time::Duration;

    struct TestRoleStore {
        roles: Vec<RoleDefinition>,
    }

    #[async_trait]
    impl RoleStore for TestRoleStore {
        async fn list_roles(
            &self,
        ) -> std::result::Result<Vec<RoleDefinition>, crate::error::StoreError> {
            Ok(self.roles.clone())
        }
    }

    fn registry(roles: Vec<RoleDefinition>) -> RoleRegistry<TestRoleStore> {
        RoleRegistry::new(TestRoleStore { roles }, Duration::from_secs(30))
    }

    fn perm(value: &str) -> Permission {
        Permission::try_from(value).unwrap()
    }

    fn user(id: &str) -> UserRecord {
        UserRecord::new(UserId::try_from(id).unwrap())
    }

    #[test]
    fn explicit_grant_should_allow() {
        let registry = registry(Vec::new());
        let resolver = PermissionResolver::new(&registry);
        let mut user = user("user_1");
        user.explicit_permissions.insert(perm("requests:approve"));

        assert!(block_on(resolver.has_permission(&user, &perm("requests:approve"))));
        assert!(!block_on(resolver.has_permission(&user, &perm("requests:delete"))));
    }

    #[test]
    fn role_grant_should_allow_through_name_normalization() {
        let registry = registry(vec![RoleDefinition::new("qa_tester", ["requests:approve"])]);
        let resolver = PermissionResolver::new(&registry);
        let mut user = user("user_1");
        user.role_names.push("QA Tester".to_string());

        assert!(block_on(resolver.has_permission(&user, &perm("requests:approve"))));
    }

    #[test]
    fn disabled_user_should_be_denied_despite_grants() {
        let registry = registry(vec![RoleDefinition::new("admin", ["requests:approve"])]);
        let resolver = PermissionResolver::new(&registry);
        let mut user = user("user_1");
        user.explicit_permissions.insert(perm("requests:approve"));
        user.role_names.push("admin".to_string());
        user.disabled = true;

        assert!(!block_on(resolver.has_permission(&user, &perm("requests:approve"))));
        assert!(block_on(resolver.effective_permissions(&user)).is_empty());
    }

    #[test]
    fn grants_should_be_monotonic_under_added_permissions() {
        let registry = registry(Vec::new());
        let resolver = PermissionResolver::new(&registry);
        let mut user = user("user_1");
        user.explicit_permissions.insert(perm("invoices:read"));
        assert!(block_on(resolver.has_permission(&user, &perm("invoices:read"))));

        user.explicit_permissions.insert(perm("invoices:update"));
        // The earlier grant survives the addition.
        assert!(block_on(resolver.has_permission(&user, &perm("invoices:read"))));
        assert!(block_on(resolver.has_permission(&user, &perm("invoices:update"))));
    }

    #[test]
    fn effective_permissions_should_union_explicit_and_roles() {
        let registry = registry(vec![
            RoleDefinition::new("accountant", ["invoices:create", "invoices:read"]),
            RoleDefinition::new("auditor", ["reports:view"]),
        ]);
        let resolver = PermissionResolver::new(&registry);
        let mut user = user("user_1");
        user.explicit_permissions.insert(perm("requests:create"));
        user.role_names.push("Accountant".to_string());
        user.role_names.push("Auditor".to_string());

        let effective = block_on(resolver.effective_permissions(&user));
        for expected in [
            "requests:create",
            "invoices:create",
            "invoices:read",
            "reports:view",
        ] {
            assert!(effective.contains(expected), "missing {expected}");
        }
    }

    #[test]
    fn unknown_role_should_not_grant_anything() {
        let registry = registry(Vec::new());
        let resolver = PermissionResolver::new(&registry);
        let mut user = user("user_1");
        user.role_names.push("contractor".to_string());

        assert!(!block_on(resolver.has_permission(&user, &perm("projects:read"))));
    }
}
