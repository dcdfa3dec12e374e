use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use jiff::Zoned;
use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use almoner_audit::events::AuditEvent;
use almoner_auth::principal::Principal;
use almoner_cases::error::CaseError;
use almoner_cases::patients::{NewPatient, PatientFilter, PatientUpdate};
use almoner_core::keys;
use almoner_core::models::activity::{ActivityAction, ResourceType};
use almoner_core::models::documents::DocumentKind;
use almoner_core::models::patient::Patient;
use almoner_core::models::user::Permission;
use almoner_export::DOCX_CONTENT_TYPE;
use almoner_export::card::PatientCard;
use almoner_export::docx::generate_docx;
use almoner_export::render::{DEFAULT_CARD_TEMPLATE, render_card};
use almoner_search::query::PatientHit;
use almoner_storage::store::Precondition;

use crate::error::ApiError;
use crate::routes::{Tagged, if_match, values};
use crate::state::AppState;

const DEFAULT_SEARCH_LIMIT: usize = 20;
const MAX_SEARCH_LIMIT: usize = 100;

pub async fn list_patients(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(filter): Query<PatientFilter>,
) -> Result<Json<Vec<Patient>>, ApiError> {
    principal.require(Permission::ViewPatients)?;
    let patients = state.patients.list(&filter).await?;
    Ok(Json(values(patients)))
}

pub async fn create_patient(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(new): Json<NewPatient>,
) -> Result<(StatusCode, Tagged<Patient>), ApiError> {
    principal.require(Permission::EditPatients)?;
    let patient = state.patients.register(&principal.actor(), new).await?;
    reindex(&state, &patient.value).await;
    Ok((StatusCode::CREATED, Tagged(patient)))
}

/// Reading a record is itself audited.
pub async fn get_patient(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Tagged<Patient>, ApiError> {
    principal.require(Permission::ViewPatients)?;
    let patient = state.patients.get(id).await?;

    let event = AuditEvent::new(ActivityAction::View, ResourceType::Patient, &principal.actor())
        .resource(id)
        .summary(format!("viewed patient {}", patient.value.name.full()));
    state.trail.record(event).await?;

    Ok(Tagged(patient))
}

pub async fn update_patient(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(update): Json<PatientUpdate>,
) -> Result<Tagged<Patient>, ApiError> {
    principal.require(Permission::EditPatients)?;
    let etag = if_match(&headers)?;
    let patient = state
        .patients
        .update(&principal.actor(), id, &etag, update)
        .await?;
    reindex(&state, &patient.value).await;
    Ok(Tagged(patient))
}

#[derive(Serialize)]
pub struct DeletedPatient {
    pub id: Uuid,
    pub assignments: Vec<Uuid>,
    pub exports: usize,
}

/// Delete an archived patient, their assignments and any stored exports.
pub async fn delete_patient(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedPatient>, ApiError> {
    principal.require(Permission::DeletePatients)?;
    let assignments = state.patients.delete(&principal.actor(), id).await?;

    let exports = state
        .store
        .delete_prefix(&keys::patient_exports_prefix(id))
        .await?;

    let result = state
        .with_index(move |index| {
            index.remove_patient(id)?;
            index.commit()
        })
        .await;
    if let Err(e) = result {
        warn!(patient_id = %id, error = %e, "failed to drop patient from the index");
    }

    Ok(Json(DeletedPatient {
        id,
        assignments,
        exports,
    }))
}

#[derive(Deserialize)]
pub struct DateBody {
    pub on: Date,
}

pub async fn discharge_patient(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<DateBody>,
) -> Result<Tagged<Patient>, ApiError> {
    principal.require(Permission::EditPatients)?;
    let etag = if_match(&headers)?;
    let patient = state
        .patients
        .discharge(&principal.actor(), id, &etag, body.on)
        .await?;
    reindex(&state, &patient.value).await;
    Ok(Tagged(patient))
}

pub async fn record_death(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<DateBody>,
) -> Result<Tagged<Patient>, ApiError> {
    principal.require(Permission::EditPatients)?;
    let etag = if_match(&headers)?;
    let patient = state
        .patients
        .record_death(&principal.actor(), id, &etag, body.on)
        .await?;
    reindex(&state, &patient.value).await;
    Ok(Tagged(patient))
}

pub async fn archive_patient(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Tagged<Patient>, ApiError> {
    principal.require(Permission::ArchivePatients)?;
    let etag = if_match(&headers)?;
    let patient = state
        .patients
        .archive(&principal.actor(), id, &etag)
        .await?;
    reindex(&state, &patient.value).await;
    Ok(Tagged(patient))
}

pub async fn restore_patient(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Tagged<Patient>, ApiError> {
    principal.require(Permission::ArchivePatients)?;
    let etag = if_match(&headers)?;
    let patient = state
        .patients
        .restore(&principal.actor(), id, &etag)
        .await?;
    reindex(&state, &patient.value).await;
    Ok(Tagged(patient))
}

pub async fn missing_documents(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<DocumentKind>>, ApiError> {
    principal.require(Permission::ViewPatients)?;
    Ok(Json(state.patients.missing_documents(id).await?))
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<usize>,
    #[serde(default)]
    pub include_archived: bool,
}

pub async fn search_patients(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<PatientHit>>, ApiError> {
    principal.require(Permission::ViewPatients)?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT);

    let index = state.index.lock().await;
    let hits = index.search(&query.q, limit, query.include_archived)?;
    Ok(Json(hits))
}

/// Render the patient card to DOCX, keep a copy under `exports/` and
/// return the file.
pub async fn export_card(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    principal.require(Permission::ExportRecords)?;
    let patient = state.patients.get(id).await?.into_inner();
    let department = match patient.department_id {
        Some(dep) => match state.departments.get(dep).await {
            Ok(found) => Some(found.into_inner()),
            Err(CaseError::NotFound { .. }) => None,
            Err(e) => return Err(e.into()),
        },
        None => None,
    };
    let assignments = state.patients.assignments_of(id).await?;

    let today = Zoned::now().date();
    let card = PatientCard::build(
        &patient,
        department.as_ref(),
        &assignments,
        &principal.user.display_name,
        today,
    );
    let rendered = render_card(DEFAULT_CARD_TEMPLATE, &card)?;
    let bytes = generate_docx(&rendered, &state.styles)?;

    let key = keys::patient_card(id);
    state
        .store
        .put(&key, bytes.clone(), Some(DOCX_CONTENT_TYPE), Precondition::None)
        .await?;

    let event = AuditEvent::new(ActivityAction::Export, ResourceType::Patient, &principal.actor())
        .resource(id)
        .summary(format!("exported card of {}", patient.name.full()))
        .with_details(json!({ "key": key, "bytes": bytes.len() }));
    state.trail.record(event).await?;
    info!(patient_id = %id, key = %key, "patient card exported");

    let disposition = format!("attachment; filename=\"patient-{id}.docx\"");
    let mut response = bytes.into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(DOCX_CONTENT_TYPE));
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    Ok(response)
}

/// Bring the patient's index entry up to date. The record is already
/// saved, so a failure here is logged and left for the next rebuild.
async fn reindex(state: &AppState, patient: &Patient) {
    let id = patient.id;
    let patient = patient.clone();
    let result = state
        .with_index(move |index| {
            if index.upsert_if_newer(&patient)? {
                index.commit()?;
            }
            Ok(())
        })
        .await;
    if let Err(e) = result {
        warn!(patient_id = %id, error = %e, "failed to index patient");
    }
}
