use axum::extract::{Query, State};
use axum::{Extension, Json};

use almoner_audit::trail::{ActivityFilter, ActivityPage};
use almoner_auth::principal::Principal;
use almoner_core::models::user::Permission;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn list_activity(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(filter): Query<ActivityFilter>,
) -> Result<Json<ActivityPage>, ApiError> {
    principal.require(Permission::ViewActivity)?;
    Ok(Json(state.trail.query(&filter).await?))
}
