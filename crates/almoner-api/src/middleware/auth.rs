use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ApiError;
use crate::state::AppState;

/// Bearer token middleware.
///
/// Extracts the `Authorization: Bearer <token>` header, verifies the JWT and
/// resolves it to an active user. On success, inserts the
/// [`almoner_auth::principal::Principal`] into request extensions for
/// handlers to use.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?
        .to_string();

    let principal = state.auth.authenticate(&token).await?;
    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}
