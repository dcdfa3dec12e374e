use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Pension {
    pub kind: PensionKind,
    /// Monthly amount in minor currency units.
    pub monthly_amount: Option<i64>,
    pub recipient: PensionRecipient,
    pub paying_office: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PensionKind {
    OldAge,
    Disability,
    Survivor,
    Social,
}

impl PensionKind {
    pub fn label(self) -> &'static str {
        match self {
            PensionKind::OldAge => "old-age",
            PensionKind::Disability => "disability",
            PensionKind::Survivor => "survivor's",
            PensionKind::Social => "social",
        }
    }
}

/// Who the pension is paid to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PensionRecipient {
    Patient,
    Guardian,
    Institution,
}

/// Format minor units as `1234.56`.
pub fn format_amount(minor: i64) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}
