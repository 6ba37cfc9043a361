//! Error types shared by the storage layer and the services
//!
//! The API crate maps [`ServiceError`] onto HTTP statuses; nothing below the
//! service layer knows about HTTP.

use crate::auth::authorization::AuthzError;
use crate::auth::jwt::JwtError;
use crate::auth::password::PasswordError;

/// Errors raised by a [`BoardStore`](crate::store::BoardStore) backend
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A stored value could not be turned back into a model
    #[error("Corrupt stored value: {0}")]
    Decode(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Errors returned by the board, column, card and account services
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Referenced entity does not exist
    #[error("{0}")]
    NotFound(String),

    /// Caller is authenticated but not allowed to do this
    #[error("{0}")]
    Forbidden(String),

    /// Duplicate email at registration
    #[error("{0}")]
    Conflict(String),

    /// Bad credentials or an unusable token
    #[error("{0}")]
    Unauthorized(String),

    /// Input rejected by a domain rule the DTO layer cannot express
    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Jwt(#[from] JwtError),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self {
        ServiceError::NotFound(format!("{} not found", entity))
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(msg) => ServiceError::Conflict(msg),
            other => ServiceError::Store(other),
        }
    }
}

impl From<AuthzError> for ServiceError {
    fn from(e: AuthzError) -> Self {
        ServiceError::Forbidden(e.to_string())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
