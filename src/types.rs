use crate::error::{Error, Result};
use crate::permission::Permission;
use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;

const MAX_ID_LEN: usize = 128;

/// User identifier.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct UserId(String);

impl UserId {
    /// Creates a validated identifier.
    pub fn new(value: impl AsRef<str>) -> Result<Self> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidId("user id must not be empty".to_string()));
        }
        if trimmed.len() > MAX_ID_LEN {
            return Err(Error::InvalidId(format!(
                "user id length must be <= {MAX_ID_LEN}"
            )));
        }
        if !trimmed
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, ':' | '_' | '-'))
        {
            return Err(Error::InvalidId(
                "user id contains invalid characters".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Creates an identifier from a trusted string without validation.
    pub fn from_string(value: String) -> Self {
        Self(value)
    }

    /// Returns the underlying string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for UserId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for UserId {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self::from_string(value)
    }
}

/// User record as consumed by the authorization engine.
///
/// `role_names` is free text as entered by administrators; the resolver
/// matches it through name normalization. `primary_role` is a separate
/// single-valued field used only by coarse role gates such as
/// [`Engine::require_role`](crate::Engine::require_role).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UserRecord {
    /// User identifier.
    pub id: UserId,
    /// Permissions granted directly, bypassing any role.
    pub explicit_permissions: HashSet<Permission>,
    /// Role names held by the user. Zero, one, or many; free-text.
    pub role_names: Vec<String>,
    /// Primary role field checked by coarse role gates.
    pub primary_role: Option<String>,
    /// Disabled users have an empty effective permission set and fail
    /// authentication.
    pub disabled: bool,
}

impl UserRecord {
    /// Creates an enabled user with no grants.
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            explicit_permissions: HashSet::new(),
            role_names: Vec::new(),
            primary_role: None,
            disabled: false,
        }
    }
}

/// Role definition as returned by an external role store.
///
/// Permissions are raw strings; the registry validates their shape at load
/// time and drops malformed entries with a warning.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoleDefinition {
    /// Role name, free-text as entered by administrators.
    pub name: String,
    /// Raw permission strings in `module:action` form.
    pub permissions: Vec<String>,
}

impl RoleDefinition {
    /// Creates a role definition from a name and raw permission strings.
    pub fn new(
        name: impl Into<String>,
        permissions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }
}
