//! Object key conventions.
//!
//! Pure string functions. These define the canonical layout of documents in
//! the case register bucket, independent of the backend holding them.

use jiff::civil::Date;
use uuid::Uuid;

use crate::error::CoreError;

pub const PATIENTS: &str = "patients/";
pub const ASSIGNMENTS: &str = "assignments/";
pub const DEPARTMENTS: &str = "departments/";
pub const USERS: &str = "users/";
pub const ACTIVITY: &str = "activity/";

pub const PATIENT_INDEX: &str = "_index/patients.tar.zst";

// Uniqueness claims sit inside their collection's prefix but never parse as
// `{collection}{id}.json`, so collection listings skip them.
pub const SUBJECT_CLAIMS: &str = "users/by-subject/";
pub const USERNAME_CLAIMS: &str = "users/by-username/";
pub const DEPARTMENT_CODE_CLAIMS: &str = "departments/by-code/";

/// Ids of the active administrators.
pub const ADMIN_ROSTER: &str = "users/_roster/administrators.json";

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Key of a JSON document inside a collection prefix.
pub fn document(collection: &str, id: Uuid) -> String {
    format!("{collection}{id}.json")
}

pub fn patient(id: Uuid) -> String {
    document(PATIENTS, id)
}

pub fn assignment(id: Uuid) -> String {
    document(ASSIGNMENTS, id)
}

pub fn department(id: Uuid) -> String {
    document(DEPARTMENTS, id)
}

pub fn user(id: Uuid) -> String {
    document(USERS, id)
}

pub fn subject_claim(subject: &str) -> String {
    claim(SUBJECT_CLAIMS, subject)
}

/// Usernames are unique regardless of case.
pub fn username_claim(username: &str) -> String {
    claim(USERNAME_CLAIMS, &username.to_lowercase())
}

pub fn department_code_claim(code: &str) -> String {
    claim(DEPARTMENT_CODE_CLAIMS, &code.to_uppercase())
}

fn claim(prefix: &str, value: &str) -> String {
    format!("{prefix}{}.json", urlencoding::encode(value))
}

/// Activity records are partitioned by UTC day: `activity/2024/03/09/{id}.json`.
pub fn activity(day: Date, id: Uuid) -> String {
    format!("{}{id}.json", activity_day_prefix(day))
}

pub fn activity_day_prefix(day: Date) -> String {
    format!(
        "{ACTIVITY}{:04}/{:02}/{:02}/",
        day.year(),
        day.month(),
        day.day()
    )
}

/// Recover the UTC day from an activity key.
pub fn activity_day(key: &str) -> Result<Date, CoreError> {
    let invalid = || CoreError::InvalidKey(key.to_string());

    let rest = key.strip_prefix(ACTIVITY).ok_or_else(invalid)?;
    let mut parts = rest.splitn(4, '/');
    let year: i16 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
    let month: i8 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
    let day: i8 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;

    Date::new(year, month, day).map_err(|_| invalid())
}

pub fn patient_exports_prefix(id: Uuid) -> String {
    format!("exports/patients/{id}/")
}

pub fn patient_card(id: Uuid) -> String {
    format!("exports/patients/{id}/card.docx")
}

/// Extract the document id from a `{collection}{id}.json` key.
pub fn document_id(collection: &str, key: &str) -> Option<Uuid> {
    key.strip_prefix(collection)?
        .strip_suffix(".json")?
        .parse()
        .ok()
}
