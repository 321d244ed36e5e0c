use thiserror::Error;

/// Store-layer error type.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Crate result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Authentication failed. The cause (missing/bad token, unknown user,
    /// disabled user, store failure) is never distinguished to the caller.
    #[error("invalid token")]
    Unauthorized,
    /// The caller is authenticated but lacks the required role.
    #[error("forbidden")]
    Forbidden,
    /// Store error wrapper.
    #[error("store error: {0}")]
    Store(#[source] StoreError),
    /// Invalid identifier input.
    #[error("invalid id: {0}")]
    InvalidId(String),
    /// Invalid permission input.
    #[error("invalid permission: {0}")]
    InvalidPermission(String),
}

impl From<StoreError> for Error {
    fn from(error: StoreError) -> Self {
        Self::Store(error)
    }
}
