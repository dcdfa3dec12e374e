use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use almoner_auth::principal::Principal;
use almoner_cases::assignments::{AssignmentFilter, NewAssignment};
use almoner_core::models::assignment::{Assignment, AssignmentStatus};
use almoner_core::models::user::Permission;

use crate::error::ApiError;
use crate::routes::{Tagged, if_match, values};
use crate::state::AppState;

pub async fn list_assignments(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(filter): Query<AssignmentFilter>,
) -> Result<Json<Vec<Assignment>>, ApiError> {
    principal.require(Permission::ViewAssignments)?;
    let assignments = state.assignments.list(&filter).await?;
    Ok(Json(values(assignments)))
}

pub async fn create_assignment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(new): Json<NewAssignment>,
) -> Result<(StatusCode, Tagged<Assignment>), ApiError> {
    principal.require(Permission::RequestAssignments)?;
    let assignment = state.assignments.create(&principal.actor(), new).await?;
    Ok((StatusCode::CREATED, Tagged(assignment)))
}

pub async fn get_assignment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Tagged<Assignment>, ApiError> {
    principal.require(Permission::ViewAssignments)?;
    Ok(Tagged(state.assignments.get(id).await?))
}

#[derive(Deserialize)]
pub struct AssigneeBody {
    /// `null` hands the assignment back to the queue.
    pub assignee_id: Option<Uuid>,
}

pub async fn set_assignee(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<AssigneeBody>,
) -> Result<Tagged<Assignment>, ApiError> {
    principal.require(Permission::WorkAssignments)?;
    let etag = if_match(&headers)?;
    let assignment = state
        .assignments
        .assign(&principal.actor(), id, &etag, body.assignee_id)
        .await?;
    Ok(Tagged(assignment))
}

#[derive(Deserialize)]
pub struct StatusBody {
    pub status: AssignmentStatus,
}

pub async fn change_status(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<StatusBody>,
) -> Result<Tagged<Assignment>, ApiError> {
    principal.require(Permission::WorkAssignments)?;
    let etag = if_match(&headers)?;
    let assignment = state
        .assignments
        .transition(&principal.actor(), id, &etag, body.status)
        .await?;
    Ok(Tagged(assignment))
}

#[derive(Deserialize)]
pub struct NoteBody {
    pub body: String,
}

/// Both sides of an assignment may comment on it.
pub async fn add_note(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(note): Json<NoteBody>,
) -> Result<Tagged<Assignment>, ApiError> {
    if !principal.can(Permission::RequestAssignments) {
        principal.require(Permission::WorkAssignments)?;
    }
    let etag = if_match(&headers)?;
    let assignment = state
        .assignments
        .add_note(&principal.actor(), id, &etag, &note.body)
        .await?;
    Ok(Tagged(assignment))
}
