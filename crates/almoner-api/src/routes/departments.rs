use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use almoner_auth::principal::Principal;
use almoner_core::models::department::Department;
use almoner_core::models::user::Permission;

use crate::error::ApiError;
use crate::routes::{Tagged, if_match, values};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

pub async fn list_departments(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Department>>, ApiError> {
    principal.require(Permission::ViewDepartments)?;
    let departments = state.departments.list(query.include_inactive).await?;
    Ok(Json(values(departments)))
}

#[derive(Deserialize)]
pub struct NewDepartment {
    pub code: String,
    pub name: String,
}

pub async fn create_department(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(new): Json<NewDepartment>,
) -> Result<(StatusCode, Tagged<Department>), ApiError> {
    principal.require(Permission::ManageDepartments)?;
    let department = state
        .departments
        .create(&principal.actor(), &new.code, &new.name)
        .await?;
    Ok((StatusCode::CREATED, Tagged(department)))
}

pub async fn get_department(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Tagged<Department>, ApiError> {
    principal.require(Permission::ViewDepartments)?;
    Ok(Tagged(state.departments.get(id).await?))
}

#[derive(Deserialize)]
pub struct RenameBody {
    pub name: String,
}

pub async fn rename_department(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<RenameBody>,
) -> Result<Tagged<Department>, ApiError> {
    principal.require(Permission::ManageDepartments)?;
    let etag = if_match(&headers)?;
    let department = state
        .departments
        .rename(&principal.actor(), id, &etag, &body.name)
        .await?;
    Ok(Tagged(department))
}

pub async fn deactivate_department(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Tagged<Department>, ApiError> {
    principal.require(Permission::ManageDepartments)?;
    let etag = if_match(&headers)?;
    let department = state
        .departments
        .deactivate(&principal.actor(), id, &etag)
        .await?;
    Ok(Tagged(department))
}

pub async fn activate_department(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Tagged<Department>, ApiError> {
    principal.require(Permission::ManageDepartments)?;
    let etag = if_match(&headers)?;
    let department = state
        .departments
        .activate(&principal.actor(), id, &etag)
        .await?;
    Ok(Tagged(department))
}
