//! Field-level validation for domain records.
//!
//! Rules are deliberately shallow: they reject records that are internally
//! inconsistent or obviously mistyped. Cross-record rules (unique codes,
//! existing departments) belong to the services that own the collections.

use jiff::civil::{Date, date};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::error::CoreError;
use crate::models::assignment::Assignment;
use crate::models::department::Department;
use crate::models::legal::{CourtDecision, Guardian, LegalCapacity};
use crate::models::patient::{Patient, PatientStatus};
use crate::models::pension::PensionRecipient;
use crate::models::user::UserAccount;

/// Earliest plausible date of birth.
pub const MIN_BIRTH_DATE: Date = date(1900, 1, 1);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, Error)]
#[ts(export)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A non-empty list of validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

pub trait Validate {
    fn validate(&self, today: Date) -> Vec<ValidationError>;
}

/// Run a record's rules and fold any failures into a [`CoreError`].
pub fn validate_all<T: Validate>(record: &T, today: Date) -> Result<(), CoreError> {
    let errors = record.validate(today);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Validation(ValidationErrors(errors)))
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

impl Validate for Patient {
    fn validate(&self, today: Date) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if is_blank(&self.name.last) {
            errors.push(ValidationError::new("name.last", "last name is required"));
        }
        if is_blank(&self.name.first) {
            errors.push(ValidationError::new("name.first", "first name is required"));
        }

        if self.date_of_birth > today {
            errors.push(ValidationError::new(
                "date_of_birth",
                "date of birth is in the future",
            ));
        }
        if self.date_of_birth < MIN_BIRTH_DATE {
            errors.push(ValidationError::new(
                "date_of_birth",
                format!("date of birth is before {MIN_BIRTH_DATE}"),
            ));
        }

        if self.admitted_on < self.date_of_birth {
            errors.push(ValidationError::new(
                "admitted_on",
                "admission is before date of birth",
            ));
        }
        if self.admitted_on > today {
            errors.push(ValidationError::new("admitted_on", "admission is in the future"));
        }

        match (self.status, self.discharged_on) {
            (PatientStatus::Inpatient, Some(_)) => errors.push(ValidationError::new(
                "discharged_on",
                "an inpatient cannot have a discharge date",
            )),
            (PatientStatus::Discharged, None) => errors.push(ValidationError::new(
                "discharged_on",
                "a discharged patient needs a discharge date",
            )),
            _ => {}
        }
        if let Some(discharged) = self.discharged_on
            && discharged < self.admitted_on
        {
            errors.push(ValidationError::new(
                "discharged_on",
                "discharge is before admission",
            ));
        }

        if let Some(passport) = &self.documents.passport {
            if is_blank(&passport.number) {
                errors.push(ValidationError::new(
                    "documents.passport.number",
                    "passport number is required",
                ));
            } else if !passport.number.chars().all(|c| c.is_ascii_alphanumeric()) {
                errors.push(ValidationError::new(
                    "documents.passport.number",
                    "passport number must be letters and digits only",
                ));
            }
            if passport.issued_on < self.date_of_birth || passport.issued_on > today {
                errors.push(ValidationError::new(
                    "documents.passport.issued_on",
                    "passport issue date must fall between birth and today",
                ));
            }
        }
        if let Some(policy) = &self.documents.insurance_policy
            && is_blank(&policy.number)
        {
            errors.push(ValidationError::new(
                "documents.insurance_policy.number",
                "policy number is required",
            ));
        }
        for kind in &self.documents.missing {
            if self.documents.holds(*kind) {
                errors.push(ValidationError::new(
                    "documents.missing",
                    format!("{} is both on file and listed as missing", kind.label()),
                ));
            }
        }

        if let Some(disability) = &self.disability
            && let Some(review) = disability.review_on
            && review <= disability.established_on
        {
            errors.push(ValidationError::new(
                "disability.review_on",
                "review must come after the group was established",
            ));
        }

        if let Some(pension) = &self.pension {
            if pension.monthly_amount.is_some_and(|amount| amount < 0) {
                errors.push(ValidationError::new(
                    "pension.monthly_amount",
                    "pension amount cannot be negative",
                ));
            }
            if pension.recipient == PensionRecipient::Guardian
                && self.legal.capacity.guardian().is_none()
            {
                errors.push(ValidationError::new(
                    "pension.recipient",
                    "pension is paid to a guardian but no guardian is recorded",
                ));
            }
        }

        validate_capacity(&self.legal.capacity, today, &mut errors);

        for (i, case) in self.legal.cases.iter().enumerate() {
            if let Some(closed) = case.closed_on
                && closed < case.opened_on
            {
                errors.push(ValidationError::new(
                    format!("legal.cases[{i}].closed_on"),
                    "case closes before it opens",
                ));
            }
        }

        for (i, relative) in self.relatives.iter().enumerate() {
            if is_blank(&relative.name) {
                errors.push(ValidationError::new(
                    format!("relatives[{i}].name"),
                    "contact name is required",
                ));
            }
        }

        errors
    }
}

fn validate_capacity(capacity: &LegalCapacity, today: Date, errors: &mut Vec<ValidationError>) {
    match capacity {
        LegalCapacity::Full => {}
        LegalCapacity::ProceedingPending { court, filed_on } => {
            if is_blank(court) {
                errors.push(ValidationError::new(
                    "legal.capacity.court",
                    "court is required",
                ));
            }
            if *filed_on > today {
                errors.push(ValidationError::new(
                    "legal.capacity.filed_on",
                    "filing date is in the future",
                ));
            }
        }
        LegalCapacity::Limited { decision, guardian }
        | LegalCapacity::Incapable { decision, guardian } => {
            validate_decision(decision, today, errors);
            if let Some(guardian) = guardian {
                validate_guardian(guardian, errors);
            }
        }
    }
}

fn validate_decision(decision: &CourtDecision, today: Date, errors: &mut Vec<ValidationError>) {
    if is_blank(&decision.court) {
        errors.push(ValidationError::new(
            "legal.capacity.decision.court",
            "court is required",
        ));
    }
    if is_blank(&decision.case_number) {
        errors.push(ValidationError::new(
            "legal.capacity.decision.case_number",
            "case number is required",
        ));
    }
    if decision.decided_on > today {
        errors.push(ValidationError::new(
            "legal.capacity.decision.decided_on",
            "decision date is in the future",
        ));
    }
}

fn validate_guardian(guardian: &Guardian, errors: &mut Vec<ValidationError>) {
    if is_blank(&guardian.name) {
        errors.push(ValidationError::new(
            "legal.capacity.guardian.name",
            "guardian name is required",
        ));
    }
}

impl Validate for Assignment {
    fn validate(&self, _today: Date) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if is_blank(&self.description) {
            errors.push(ValidationError::new("description", "description is required"));
        }

        let created_on = self.created_at.to_zoned(jiff::tz::TimeZone::UTC).date();
        if let Some(due) = self.due_on
            && due < created_on
        {
            errors.push(ValidationError::new(
                "due_on",
                "due date is before the assignment was created",
            ));
        }

        errors
    }
}

impl Validate for Department {
    fn validate(&self, _today: Date) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if is_blank(&self.code) {
            errors.push(ValidationError::new("code", "code is required"));
        } else if !self
            .code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
        {
            errors.push(ValidationError::new(
                "code",
                "code must be uppercase letters, digits or '-'",
            ));
        }
        if is_blank(&self.name) {
            errors.push(ValidationError::new("name", "name is required"));
        }

        errors
    }
}

impl Validate for UserAccount {
    fn validate(&self, _today: Date) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if is_blank(&self.subject) {
            errors.push(ValidationError::new("subject", "subject is required"));
        }
        if is_blank(&self.username) {
            errors.push(ValidationError::new("username", "username is required"));
        }
        if let Some(email) = &self.email
            && !email.contains('@')
        {
            errors.push(ValidationError::new("email", "email address is malformed"));
        }
        for (i, role) in self.roles.iter().enumerate() {
            if self.roles[..i].contains(role) {
                errors.push(ValidationError::new(
                    "roles",
                    format!("role {role} is listed twice"),
                ));
            }
        }

        errors
    }
}
