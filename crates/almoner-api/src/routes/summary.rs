use axum::extract::{Query, State};
use axum::{Extension, Json};
use jiff::Zoned;
use jiff::civil::Date;
use serde::Deserialize;

use almoner_auth::principal::Principal;
use almoner_cases::summary::CaseloadSummary;
use almoner_core::models::user::Permission;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SummaryQuery {
    pub as_of: Option<Date>,
}

pub async fn caseload_summary(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<CaseloadSummary>, ApiError> {
    principal.require(Permission::ViewPatients)?;
    let as_of = query.as_of.unwrap_or_else(|| Zoned::now().date());
    Ok(Json(state.summary.summarize(as_of).await?))
}
