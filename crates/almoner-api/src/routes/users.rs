use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use almoner_auth::principal::Principal;
use almoner_auth::users::{NewUser, ProfileUpdate};
use almoner_core::models::user::{Permission, Role, UserAccount};

use crate::error::ApiError;
use crate::routes::{Tagged, if_match, values};
use crate::state::AppState;

pub async fn list_users(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<UserAccount>>, ApiError> {
    principal.require(Permission::ViewUsers)?;
    Ok(Json(values(state.users.list().await?)))
}

pub async fn register_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(new): Json<NewUser>,
) -> Result<(StatusCode, Tagged<UserAccount>), ApiError> {
    principal.require(Permission::ManageUsers)?;
    let user = state.users.register(&principal.actor(), new).await?;
    Ok((StatusCode::CREATED, Tagged(user)))
}

/// Anyone may read their own account.
pub async fn get_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Tagged<UserAccount>, ApiError> {
    if principal.id() != id {
        principal.require(Permission::ViewUsers)?;
    }
    Ok(Tagged(state.users.get(id).await?))
}

pub async fn update_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(update): Json<ProfileUpdate>,
) -> Result<Tagged<UserAccount>, ApiError> {
    principal.require(Permission::ManageUsers)?;
    let etag = if_match(&headers)?;
    let user = state
        .users
        .update_profile(&principal.actor(), id, &etag, update)
        .await?;
    Ok(Tagged(user))
}

#[derive(Deserialize)]
pub struct RolesBody {
    pub roles: Vec<Role>,
}

pub async fn set_roles(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<RolesBody>,
) -> Result<Tagged<UserAccount>, ApiError> {
    principal.require(Permission::ManageUsers)?;
    let etag = if_match(&headers)?;
    let user = state
        .users
        .set_roles(&principal.actor(), id, &etag, body.roles)
        .await?;
    Ok(Tagged(user))
}

pub async fn deactivate_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Tagged<UserAccount>, ApiError> {
    principal.require(Permission::ManageUsers)?;
    let etag = if_match(&headers)?;
    let user = state
        .users
        .deactivate(&principal.actor(), id, &etag)
        .await?;
    Ok(Tagged(user))
}

pub async fn activate_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Tagged<UserAccount>, ApiError> {
    principal.require(Permission::ManageUsers)?;
    let etag = if_match(&headers)?;
    let user = state.users.activate(&principal.actor(), id, &etag).await?;
    Ok(Tagged(user))
}

/// Active holders of a role.
pub async fn users_in_role(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(role): Path<Role>,
) -> Result<Json<Vec<UserAccount>>, ApiError> {
    principal.require(Permission::ViewUsers)?;
    Ok(Json(state.users.users_in_role(role).await?))
}
