use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use almoner_audit::error::AuditError;
use almoner_auth::error::AuthError;
use almoner_cases::error::CaseError;
use almoner_core::validation::{ValidationError, ValidationErrors};
use almoner_export::error::ExportError;
use almoner_search::error::SearchError;
use almoner_storage::error::StorageError;

/// Unified API error type for all route handlers.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    /// Stale `If-Match`, duplicate, or a state that refuses the operation.
    Conflict(String),
    Validation(ValidationErrors),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<ValidationError>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, fields) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, Vec::new()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, Vec::new()),
            ApiError::Unauthorized(msg) => {
                tracing::debug!(reason = %msg, "request rejected as unauthenticated");
                (
                    StatusCode::UNAUTHORIZED,
                    "authentication required".to_string(),
                    Vec::new(),
                )
            }
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, Vec::new()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg, Vec::new()),
            ApiError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation failed".to_string(),
                errors.0,
            ),
            ApiError::Internal(msg) => {
                tracing::error!("internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                    Vec::new(),
                )
            }
        };

        (
            status,
            Json(ErrorBody {
                error: message,
                fields,
            }),
        )
            .into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound { key } => ApiError::NotFound(format!("object not found: {key}")),
            StorageError::PreconditionFailed { key } => {
                ApiError::Conflict(format!("{key} was modified concurrently"))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<AuditError> for ApiError {
    fn from(e: AuditError) -> Self {
        match e {
            AuditError::InvalidFilter(msg) => ApiError::BadRequest(msg),
            AuditError::Storage(err) => err.into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::TokenExpired
            | AuthError::InvalidToken(_)
            | AuthError::Jwt(_)
            | AuthError::UnknownSubject(_)
            | AuthError::Inactive(_) => ApiError::Unauthorized(e.to_string()),
            AuthError::Forbidden { .. } => ApiError::Forbidden(e.to_string()),
            AuthError::UserNotFound(_) => ApiError::NotFound(e.to_string()),
            AuthError::Validation(errors) => ApiError::Validation(errors),
            AuthError::Duplicate(_) | AuthError::LastAdministrator | AuthError::Conflict => {
                ApiError::Conflict(e.to_string())
            }
            AuthError::Core(err) => ApiError::Internal(err.to_string()),
            AuthError::Storage(err) => err.into(),
            AuthError::Audit(err) => err.into(),
        }
    }
}

impl From<CaseError> for ApiError {
    fn from(e: CaseError) -> Self {
        match e {
            CaseError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            CaseError::Validation(errors) => ApiError::Validation(errors),
            CaseError::Conflict(msg) | CaseError::InvalidState(msg) => ApiError::Conflict(msg),
            CaseError::Core(err) => ApiError::Internal(err.to_string()),
            CaseError::Storage(err) => err.into(),
            CaseError::Audit(err) => err.into(),
        }
    }
}

impl From<SearchError> for ApiError {
    fn from(e: SearchError) -> Self {
        match e {
            SearchError::QueryParse(msg) => ApiError::BadRequest(format!("invalid query: {msg}")),
            SearchError::ETagMismatch => ApiError::Conflict(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ExportError> for ApiError {
    fn from(e: ExportError) -> Self {
        ApiError::Internal(e.to_string())
    }
}
