use axum::Json;
use axum::http::{HeaderMap, HeaderValue, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use almoner_storage::repository::Versioned;

use crate::error::ApiError;

pub mod activity;
pub mod admin;
pub mod assignments;
pub mod departments;
pub mod health;
pub mod me;
pub mod patients;
pub mod summary;
pub mod users;

/// A document returned with its `ETag` header.
pub struct Tagged<T>(pub Versioned<T>);

impl<T: Serialize> IntoResponse for Tagged<T> {
    fn into_response(self) -> Response {
        let Versioned { value, etag } = self.0;
        let mut response = Json(value).into_response();
        match HeaderValue::from_str(&etag) {
            Ok(value) if !etag.is_empty() => {
                response.headers_mut().insert(header::ETAG, value);
            }
            Ok(_) => {}
            Err(_) => tracing::warn!(%etag, "etag is not a valid header value"),
        }
        response
    }
}

/// The `If-Match` value every update must carry.
pub(crate) fn if_match(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get(header::IF_MATCH)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::BadRequest("If-Match header is required".to_string()))
}

pub(crate) fn values<T>(docs: Vec<Versioned<T>>) -> Vec<T> {
    docs.into_iter().map(Versioned::into_inner).collect()
}
