use thiserror::Error;

use crate::repositories::account_repository::RepositoryError;

pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Public error taxonomy of the core.
///
/// Storage and network faults are caught at the boundary of each operation
/// and converted into one of these kinds; the display strings are generic on
/// purpose and never carry internal error text. Sources are kept for logs.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("account not found")]
    NotFound,

    #[error("email already registered")]
    DuplicateEmail,

    /// Unknown email and wrong password are deliberately not distinguished
    /// to avoid account enumeration.
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("account not verified")]
    NotVerified,

    #[error("a reset request is already pending for this account")]
    AlreadyPending,

    #[error("token is expired")]
    Expired,

    #[error("storage unavailable, please try again")]
    StorageUnavailable(#[source] sqlx::Error),

    #[error("service unavailable, please try again")]
    Upstream(#[source] reqwest::Error),

    #[error("reply missing from inference response")]
    MalformedReply,

    #[error("validation error: {0}")]
    Validation(String),

    #[error("internal error")]
    Internal(String),
}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        CoreError::StorageUnavailable(err)
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(err: reqwest::Error) -> Self {
        CoreError::Upstream(err)
    }
}

impl From<RepositoryError> for CoreError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Database(e) => CoreError::StorageUnavailable(e),
            RepositoryError::NotFound => CoreError::NotFound,
            RepositoryError::AlreadyExists => CoreError::DuplicateEmail,
        }
    }
}
