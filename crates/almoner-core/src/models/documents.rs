use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Identity and insurance documents held (or known to be lost) for a patient.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct IdentityDocuments {
    pub passport: Option<Passport>,
    pub insurance_policy: Option<InsurancePolicy>,
    /// Individual pension insurance account number.
    pub pension_insurance_number: Option<String>,
    /// Documents the patient is known to have lost. Drives restoration work.
    #[serde(default)]
    pub missing: Vec<DocumentKind>,
}

impl IdentityDocuments {
    pub fn holds(&self, kind: DocumentKind) -> bool {
        match kind {
            DocumentKind::Passport => self.passport.is_some(),
            DocumentKind::InsurancePolicy => self.insurance_policy.is_some(),
            DocumentKind::PensionInsuranceNumber => self.pension_insurance_number.is_some(),
            // Not modelled as fields; only tracked through `missing`.
            DocumentKind::BirthCertificate | DocumentKind::DisabilityCertificate => false,
        }
    }

    /// Kinds that are recorded as lost or simply absent from the record.
    pub fn outstanding(&self) -> Vec<DocumentKind> {
        let mut kinds = self.missing.clone();
        for kind in DocumentKind::REQUIRED {
            if !self.holds(kind) && !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        kinds
    }

    /// Searchable document numbers, space separated.
    pub fn numbers(&self) -> String {
        let mut out = Vec::new();
        if let Some(passport) = &self.passport {
            if let Some(series) = &passport.series {
                out.push(series.clone());
            }
            out.push(passport.number.clone());
        }
        if let Some(policy) = &self.insurance_policy {
            out.push(policy.number.clone());
        }
        if let Some(number) = &self.pension_insurance_number {
            out.push(number.clone());
        }
        out.join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Passport {
    pub series: Option<String>,
    pub number: String,
    pub issued_by: String,
    pub issued_on: jiff::civil::Date,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InsurancePolicy {
    pub number: String,
    pub insurer: String,
    pub valid_until: Option<jiff::civil::Date>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum DocumentKind {
    Passport,
    InsurancePolicy,
    PensionInsuranceNumber,
    BirthCertificate,
    DisabilityCertificate,
}

impl DocumentKind {
    /// Documents every patient is expected to have on file.
    pub const REQUIRED: [DocumentKind; 3] = [
        DocumentKind::Passport,
        DocumentKind::InsurancePolicy,
        DocumentKind::PensionInsuranceNumber,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DocumentKind::Passport => "passport",
            DocumentKind::InsurancePolicy => "medical insurance policy",
            DocumentKind::PensionInsuranceNumber => "pension insurance number",
            DocumentKind::BirthCertificate => "birth certificate",
            DocumentKind::DisabilityCertificate => "disability certificate",
        }
    }
}
