use crate::builtin::{
    ADMIN_ALIAS_SUBSTRINGS, ADMIN_INDICATOR_PERMISSIONS, PROJECT_MANAGER_PERMISSIONS,
    PROJECT_MANAGER_ROLE_KEYS, builtin_role_permissions,
};
use crate::normalize::variations;
use crate::permission::Permission;
use crate::resolver::PermissionResolver;
use crate::store::RoleStore;
use crate::types::UserRecord;
use std::collections::HashSet;

/// Derives coarse capability flags from layered, OR-combined grant rules.
///
/// Each capability is an ordered list of independent grant-rule strategies;
/// any single rule granting the capability grants it overall. The
/// redundancy is intentional: during a migration from free-text role
/// strings to structured roles, over-granting admin is preferred to falsely
/// locking an admin out.
pub struct CapabilityDeriver<'a, R> {
    resolver: PermissionResolver<'a, R>,
}

/// One fallback path in a capability derivation.
///
/// Rules run over the user record plus the precomputed effective permission
/// set, so they stay synchronous; the async registry work happens once in
/// the deriver.
trait GrantRule: Send + Sync {
    fn grants(&self, user: &UserRecord, effective: &HashSet<Permission>) -> bool;
}

/// Grants when any indicator permission is effectively held.
struct IndicatorPermissionRule {
    indicators: &'static [&'static str],
}

impl GrantRule for IndicatorPermissionRule {
    fn grants(&self, _user: &UserRecord, effective: &HashSet<Permission>) -> bool {
        self.indicators
            .iter()
            .any(|indicator| effective.contains(*indicator))
    }
}

/// Grants when any role-name variation contains an alias substring.
struct AliasSubstringRule {
    aliases: &'static [&'static str],
}

impl GrantRule for AliasSubstringRule {
    fn grants(&self, user: &UserRecord, _effective: &HashSet<Permission>) -> bool {
        user.role_names.iter().any(|name| {
            variations(name)
                .iter()
                .any(|variation| self.aliases.iter().any(|alias| variation.contains(alias)))
        })
    }
}

/// Grants when any role-name variation equals one of the expected keys.
struct RoleKeyRule {
    keys: &'static [&'static str],
}

impl GrantRule for RoleKeyRule {
    fn grants(&self, user: &UserRecord, _effective: &HashSet<Permission>) -> bool {
        user.role_names.iter().any(|name| {
            variations(name)
                .iter()
                .any(|variation| self.keys.contains(&variation.as_str()))
        })
    }
}

/// Grants when the built-in table entry for any role name holds one of the
/// required permissions, even if the registry never resolved that role.
struct BuiltinTableRule {
    required: &'static [&'static str],
}

impl GrantRule for BuiltinTableRule {
    fn grants(&self, user: &UserRecord, _effective: &HashSet<Permission>) -> bool {
        user.role_names.iter().any(|name| {
            variations(name).iter().any(|variation| {
                builtin_role_permissions(variation).is_some_and(|perms| {
                    perms
                        .iter()
                        .any(|permission| self.required.contains(permission))
                })
            })
        })
    }
}

const ADMIN_RULES: &[&dyn GrantRule] = &[
    &IndicatorPermissionRule {
        indicators: ADMIN_INDICATOR_PERMISSIONS,
    },
    &AliasSubstringRule {
        aliases: ADMIN_ALIAS_SUBSTRINGS,
    },
];

const PROJECT_MANAGER_RULES: &[&dyn GrantRule] = &[
    &IndicatorPermissionRule {
        indicators: PROJECT_MANAGER_PERMISSIONS,
    },
    &RoleKeyRule {
        keys: PROJECT_MANAGER_ROLE_KEYS,
    },
    &BuiltinTableRule {
        required: PROJECT_MANAGER_PERMISSIONS,
    },
];

impl<'a, R: RoleStore> CapabilityDeriver<'a, R> {
    /// Creates a deriver over a permission resolver.
    pub fn new(resolver: PermissionResolver<'a, R>) -> Self {
        Self { resolver }
    }

    /// Returns whether the user is an administrator.
    pub async fn is_admin(&self, user: &UserRecord) -> bool {
        self.derive(user, ADMIN_RULES).await
    }

    /// Returns whether the user is a project manager.
    pub async fn is_project_manager(&self, user: &UserRecord) -> bool {
        self.derive(user, PROJECT_MANAGER_RULES).await
    }

    async fn derive(&self, user: &UserRecord, rules: &[&dyn GrantRule]) -> bool {
        if user.disabled {
            return false;
        }
        let effective = self.resolver.effective_permissions(user).await;
        rules.iter().any(|rule| rule.grants(user, &effective))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RoleRegistry;
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

    fn user(id: &str) -> UserRecord {
        UserRecord::new(UserId::try_from(id).unwrap())
    }

    fn perm(value: &str) -> Permission {
        Permission::try_from(value).unwrap()
    }

    #[test]
    fn indicator_permission_should_imply_admin() {
        let registry = registry(Vec::new());
        let deriver = CapabilityDeriver::new(PermissionResolver::new(&registry));
        let mut user = user("user_1");
        user.explicit_permissions.insert(perm("users:manage"));

        assert!(block_on(deriver.is_admin(&user)));
    }

    #[test]
    fn alias_substring_should_imply_admin_without_permissions() {
        let registry = registry(Vec::new());
        let deriver = CapabilityDeriver::new(PermissionResolver::new(&registry));
        let mut user = user("user_1");
        user.role_names.push("HR Admin".to_string());

        assert!(block_on(deriver.is_admin(&user)));
    }

    #[test]
    fn alias_match_is_substring_based_by_design() {
        let registry = registry(Vec::new());
        let deriver = CapabilityDeriver::new(PermissionResolver::new(&registry));
        let mut user = user("user_1");
        user.role_names.push("administrator-trainee-readonly".to_string());

        assert!(block_on(deriver.is_admin(&user)));
    }

    #[test]
    fn plain_role_should_not_imply_admin() {
        let registry = registry(Vec::new());
        let deriver = CapabilityDeriver::new(PermissionResolver::new(&registry));
        let mut user = user("user_1");
        user.role_names.push("employee".to_string());

        assert!(!block_on(deriver.is_admin(&user)));
    }

    #[test]
    fn project_permission_should_imply_project_manager() {
        let registry = registry(vec![RoleDefinition::new("team_lead", ["projects:update"])]);
        let deriver = CapabilityDeriver::new(PermissionResolver::new(&registry));
        let mut user = user("user_1");
        user.role_names.push("Team Lead".to_string());

        assert!(block_on(deriver.is_project_manager(&user)));
    }

    #[test]
    fn role_key_should_imply_project_manager_without_registry_entry() {
        let registry = registry(Vec::new());
        let deriver = CapabilityDeriver::new(PermissionResolver::new(&registry));
        let mut user = user("user_1");
        user.role_names.push("Project Manager".to_string());

        assert!(block_on(deriver.is_project_manager(&user)));
    }

    #[test]
    fn builtin_table_should_back_project_manager_fallback() {
        let mut user = user("user_1");
        user.role_names.push("Project Manager".to_string());
        let effective = HashSet::new();

        // Exercise the table rule in isolation: no effective permissions,
        // yet the static table entry carries a project permission.
        let rule = BuiltinTableRule {
            required: PROJECT_MANAGER_PERMISSIONS,
        };
        assert!(rule.grants(&user, &effective));

        user.role_names[0] = "designer".to_string();
        assert!(!rule.grants(&user, &effective));
    }

    #[test]
    fn disabled_user_should_derive_nothing() {
        let registry = registry(Vec::new());
        let deriver = CapabilityDeriver::new(PermissionResolver::new(&registry));
        let mut user = user("user_1");
        user.role_names.push("admin".to_string());
        user.explicit_permissions.insert(perm("users:manage"));
        user.disabled = true;

        assert!(!block_on(deriver.is_admin(&user)));
        assert!(!block_on(deriver.is_project_manager(&user)));
    }
}
