//! Hardcoded fallback tables.
//!
//! These predate the admin-editable role registry and survive as a safety
//! net for partially migrated data: the registry overlays them additively,
//! and the capability deriver consults them directly when a role name has
//! no registry entry.

/// Built-in role permissions, keyed by canonical role name.
pub const PERMISSIONS_BY_ROLE: &[(&str, &[&str])] = &[
    (
        "admin",
        &[
            "users:manage",
            "roles:manage",
            "settings:manage",
            "projects:create",
            "projects:update",
            "projects:delete",
            "invoices:create",
            "invoices:read",
            "invoices:update",
            "requests:approve",
            "reports:view",
        ],
    ),
    (
        "project_manager",
        &[
            "projects:create",
            "projects:update",
            "projects:delete",
            "tasks:assign",
            "requests:approve",
            "reports:view",
        ],
    ),
    (
        "hr_manager",
        &[
            "employees:read",
            "employees:update",
            "leave:approve",
            "requests:approve",
        ],
    ),
    (
        "accountant",
        &[
            "invoices:create",
            "invoices:read",
            "invoices:update",
            "payments:record",
            "reports:view",
        ],
    ),
    (
        "employee",
        &[
            "projects:read",
            "tasks:read",
            "tasks:update",
            "requests:create",
        ],
    ),
];

/// Permissions whose presence alone marks a user as an administrator.
pub const ADMIN_INDICATOR_PERMISSIONS: &[&str] =
    &["users:manage", "roles:manage", "settings:manage"];

/// Role-name substrings that mark a user as an administrator.
///
/// Matched against every lowercased variation of the user's role names.
/// Deliberately broad: a role merely containing one of these substrings
/// (including something like "administrator-trainee-readonly") grants the
/// admin capability. Narrowing this is a policy change, not a refactor.
pub const ADMIN_ALIAS_SUBSTRINGS: &[&str] = &["admin", "superadmin", "hr_admin"];

/// Permissions any of which mark a user as a project manager.
pub const PROJECT_MANAGER_PERMISSIONS: &[&str] =
    &["projects:create", "projects:delete", "projects:update"];

/// Canonical-key spellings recognized as the project-manager role.
pub const PROJECT_MANAGER_ROLE_KEYS: &[&str] =
    &["project_manager", "project manager", "projectmanager"];

/// Looks up a built-in role's permissions by an already-normalized key.
pub(crate) fn builtin_role_permissions(key: &str) -> Option<&'static [&'static str]> {
    PERMISSIONS_BY_ROLE
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, perms)| *perms)
}
