use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MedicalRecord {
    pub diagnosis: String,
    /// ICD-10 code, e.g. `F01.1`.
    pub icd10: Option<String>,
    pub attending_physician: Option<String>,
    pub mobility: Mobility,
    /// The patient cannot return home and needs a care placement.
    #[serde(default)]
    pub needs_placement: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Mobility {
    Independent,
    Assisted,
    Bedridden,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Disability {
    pub group: DisabilityGroup,
    pub established_on: jiff::civil::Date,
    /// Next re-examination. `None` means the group was set indefinitely.
    pub review_on: Option<jiff::civil::Date>,
}

impl Disability {
    pub fn review_due(&self, today: jiff::civil::Date) -> bool {
        self.review_on.is_some_and(|review| review <= today)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum DisabilityGroup {
    First,
    Second,
    Third,
}

impl DisabilityGroup {
    pub fn numeral(self) -> &'static str {
        match self {
            DisabilityGroup::First => "I",
            DisabilityGroup::Second => "II",
            DisabilityGroup::Third => "III",
        }
    }
}
