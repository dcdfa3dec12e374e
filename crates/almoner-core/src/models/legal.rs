use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Legal capacity and open court matters for a patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LegalStatus {
    pub capacity: LegalCapacity,
    #[serde(default)]
    pub cases: Vec<LegalCase>,
}

impl Default for LegalStatus {
    fn default() -> Self {
        Self {
            capacity: LegalCapacity::Full,
            cases: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "status", rename_all = "snake_case")]
#[ts(export)]
pub enum LegalCapacity {
    Full,
    /// A capacity proceeding has been filed but not decided.
    ProceedingPending {
        court: String,
        filed_on: jiff::civil::Date,
    },
    Limited {
        decision: CourtDecision,
        guardian: Option<Guardian>,
    },
    Incapable {
        decision: CourtDecision,
        guardian: Option<Guardian>,
    },
}

impl LegalCapacity {
    pub fn guardian(&self) -> Option<&Guardian> {
        match self {
            LegalCapacity::Limited { guardian, .. } | LegalCapacity::Incapable { guardian, .. } => {
                guardian.as_ref()
            }
            LegalCapacity::Full | LegalCapacity::ProceedingPending { .. } => None,
        }
    }

    pub fn decision(&self) -> Option<&CourtDecision> {
        match self {
            LegalCapacity::Limited { decision, .. } | LegalCapacity::Incapable { decision, .. } => {
                Some(decision)
            }
            LegalCapacity::Full | LegalCapacity::ProceedingPending { .. } => None,
        }
    }

    /// True when a court has restricted the patient's capacity.
    pub fn is_restricted(&self) -> bool {
        self.decision().is_some()
    }

    pub fn label(&self) -> &'static str {
        match self {
            LegalCapacity::Full => "full capacity",
            LegalCapacity::ProceedingPending { .. } => "capacity proceeding pending",
            LegalCapacity::Limited { .. } => "limited capacity",
            LegalCapacity::Incapable { .. } => "legally incapable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CourtDecision {
    pub court: String,
    pub case_number: String,
    pub decided_on: jiff::civil::Date,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Guardian {
    pub name: String,
    pub kind: GuardianKind,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum GuardianKind {
    Relative,
    /// A care institution acting as guardian.
    Institution,
    /// The guardianship authority itself.
    Authority,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LegalCase {
    pub id: Uuid,
    pub kind: LegalCaseKind,
    pub court: Option<String>,
    pub case_number: Option<String>,
    pub opened_on: jiff::civil::Date,
    pub closed_on: Option<jiff::civil::Date>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum LegalCaseKind {
    CapacityProceeding,
    Guardianship,
    Inheritance,
    Housing,
    Other,
}
