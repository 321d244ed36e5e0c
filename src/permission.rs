use crate::error::{Error, Result};
use std::borrow::Borrow;
use std::fmt;

/// Permission string wrapper (`module:action`).
///
/// Permissions are opaque tokens compared by exact value. Validation happens
/// once at the boundary where a permission enters the system; after that the
/// string is canonical (trimmed, lowercased) and never re-parsed.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Permission(String);

impl Permission {
    /// Parses and validates a permission.
    ///
    /// This trims whitespace and normalizes to lowercase.
    pub fn new(value: impl AsRef<str>) -> Result<Self> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidPermission(
                "permission must not be empty".to_string(),
            ));
        }
        let normalized = trimmed.to_ascii_lowercase();
        let Some((module, action)) = normalized.split_once(':') else {
            return Err(Error::InvalidPermission(format!(
                "permission must be in module:action format: {normalized}"
            )));
        };
        if !is_valid_segment(module) || !is_valid_segment(action) {
            return Err(Error::InvalidPermission(format!(
                "permission has an invalid segment: {normalized}"
            )));
        }
        Ok(Self(normalized))
    }

    /// Creates a permission from a trusted string without validation.
    pub fn from_string(value: String) -> Self {
        Self(value)
    }

    /// Returns the underlying string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|ch| matches!(ch, 'a'..='z' | '0'..='9' | '_' | '-'))
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Permission {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Permission {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for Permission {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<String> for Permission {
    fn from(value: String) -> Self {
        Self::from_string(value)
    }
}
