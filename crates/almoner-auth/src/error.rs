use thiserror::Error;

use almoner_core::error::CoreError;
use almoner_core::models::user::Permission;
use almoner_core::validation::ValidationErrors;
use almoner_storage::error::StorageError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("no user is registered for subject {0}")]
    UnknownSubject(String),

    #[error("user {0} is deactivated")]
    Inactive(String),

    #[error("missing permission: {permission}")]
    Forbidden { permission: Permission },

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("{0}")]
    Duplicate(String),

    #[error("the last active administrator cannot be demoted or deactivated")]
    LastAdministrator,

    #[error("user was modified concurrently")]
    Conflict,

    #[error("core error: {0}")]
    Core(CoreError),

    #[error("storage error: {0}")]
    Storage(StorageError),

    #[error("audit error: {0}")]
    Audit(#[from] almoner_audit::error::AuditError),
}

impl From<StorageError> for AuthError {
    fn from(err: StorageError) -> Self {
        if err.is_precondition_failed() {
            AuthError::Conflict
        } else {
            AuthError::Storage(err)
        }
    }
}

impl From<CoreError> for AuthError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(errors) => AuthError::Validation(errors),
            other => AuthError::Core(other),
        }
    }
}
