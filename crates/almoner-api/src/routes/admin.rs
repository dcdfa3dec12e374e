use axum::extract::State;
use axum::{Extension, Json};
use serde::Serialize;
use serde_json::json;

use almoner_audit::events::AuditEvent;
use almoner_auth::principal::Principal;
use almoner_core::models::activity::{ActivityAction, ResourceType};
use almoner_core::models::user::Permission;
use almoner_search::flush::flush;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct RebuildReport {
    pub patients: u64,
    pub etag: String,
}

/// Re-index every patient from the store and persist the result.
pub async fn rebuild_index(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<RebuildReport>, ApiError> {
    principal.require(Permission::ManageSystem)?;
    let patients = state.patients.all().await?;

    let count = state
        .with_index(move |index| index.rebuild(&patients))
        .await?;
    let etag = {
        let mut index = state.index.lock().await;
        flush(state.store.as_ref(), &mut index).await?
    };

    let event = AuditEvent::new(
        ActivityAction::Update,
        ResourceType::SearchIndex,
        &principal.actor(),
    )
    .summary(format!("rebuilt the patient index ({count} patients)"))
    .with_details(json!({ "patients": count, "etag": etag }));
    state.trail.record(event).await?;

    Ok(Json(RebuildReport {
        patients: count,
        etag,
    }))
}
