use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::Document;
use super::documents::IdentityDocuments;
use super::legal::LegalStatus;
use super::medical::{Disability, MedicalRecord};
use super::pension::Pension;
use crate::keys;

/// A patient on the social department's caseload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Patient {
    pub id: Uuid,
    pub name: PersonName,
    pub date_of_birth: jiff::civil::Date,
    pub sex: Sex,
    pub department_id: Option<Uuid>,
    pub ward: Option<String>,
    pub registered_address: Option<Address>,
    pub admitted_on: jiff::civil::Date,
    pub discharged_on: Option<jiff::civil::Date>,
    pub status: PatientStatus,
    #[serde(default)]
    pub documents: IdentityDocuments,
    pub medical: Option<MedicalRecord>,
    #[serde(default)]
    pub legal: LegalStatus,
    pub pension: Option<Pension>,
    pub disability: Option<Disability>,
    #[serde(default)]
    pub relatives: Vec<Contact>,
    pub notes: Option<String>,
    #[serde(default)]
    pub archived: bool,
    pub created_by: Uuid,
    pub created_at: jiff::Timestamp,
    pub updated_at: jiff::Timestamp,
}

impl Document for Patient {
    const COLLECTION: &'static str = keys::PATIENTS;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Patient {
    /// Whole years of age on `today`.
    pub fn age_on(&self, today: jiff::civil::Date) -> i16 {
        let dob = self.date_of_birth;
        let mut years = today.year() - dob.year();
        if (today.month(), today.day()) < (dob.month(), dob.day()) {
            years -= 1;
        }
        years.max(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PersonName {
    pub last: String,
    pub first: String,
    pub middle: Option<String>,
}

impl PersonName {
    pub fn full(&self) -> String {
        match &self.middle {
            Some(middle) if !middle.trim().is_empty() => {
                format!("{} {} {}", self.last, self.first, middle)
            }
            _ => format!("{} {}", self.last, self.first),
        }
    }

    /// Case-insensitive sort key: last, first, middle.
    pub fn sort_key(&self) -> (String, String, String) {
        (
            self.last.to_lowercase(),
            self.first.to_lowercase(),
            self.middle.as_deref().unwrap_or_default().to_lowercase(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Sex {
    Male,
    Female,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PatientStatus {
    Inpatient,
    Discharged,
    Deceased,
}

impl PatientStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PatientStatus::Inpatient => "inpatient",
            PatientStatus::Discharged => "discharged",
            PatientStatus::Deceased => "deceased",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Address {
    pub region: Option<String>,
    pub city: String,
    pub street: String,
    pub building: Option<String>,
    pub apartment: Option<String>,
    /// No fixed abode; the address is the last known one.
    #[serde(default)]
    pub homeless: bool,
}

impl Address {
    pub fn line(&self) -> String {
        let mut parts = Vec::new();
        if let Some(region) = &self.region {
            parts.push(region.clone());
        }
        parts.push(self.city.clone());
        parts.push(self.street.clone());
        if let Some(building) = &self.building {
            parts.push(building.clone());
        }
        if let Some(apartment) = &self.apartment {
            parts.push(format!("apt. {apartment}"));
        }
        parts.join(", ")
    }
}

/// A relative or other contact person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Contact {
    pub name: String,
    pub relation: String,
    pub phone: Option<String>,
}
