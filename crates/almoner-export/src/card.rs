use jiff::civil::Date;
use serde::Serialize;

use almoner_core::models::assignment::Assignment;
use almoner_core::models::department::Department;
use almoner_core::models::legal::{GuardianKind, LegalCaseKind};
use almoner_core::models::medical::Mobility;
use almoner_core::models::patient::{Patient, Sex};
use almoner_core::models::pension::{PensionRecipient, format_amount};

use crate::docx::escape_text;

/// A patient record flattened into display strings for templates.
///
/// Every string taken from the record is escaped for the markdown subset,
/// so user text never adds headings, page breaks or bold of its own.
#[derive(Debug, Clone, Serialize)]
pub struct PatientCard {
    pub generated_on: String,
    pub generated_by: String,

    pub full_name: String,
    pub date_of_birth: String,
    pub age: i16,
    pub sex: String,
    pub status: String,
    pub archived: bool,
    pub department: String,
    pub ward: Option<String>,
    pub admitted_on: String,
    pub discharged_on: Option<String>,
    pub address: Option<String>,

    pub documents: Vec<CardLine>,
    pub missing_documents: Vec<String>,

    pub capacity: String,
    pub court_decision: Option<String>,
    pub guardian: Option<String>,
    pub legal_cases: Vec<String>,

    pub medical: Option<String>,
    pub disability: Option<String>,
    pub disability_review_due: bool,
    pub pension: Option<String>,

    pub relatives: Vec<String>,
    pub open_assignments: Vec<String>,
    /// One entry per non-blank line of the patient's notes.
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CardLine {
    pub label: String,
    pub value: String,
}

impl PatientCard {
    pub fn build(
        patient: &Patient,
        department: Option<&Department>,
        assignments: &[Assignment],
        generated_by: &str,
        today: Date,
    ) -> Self {
        let docs = &patient.documents;
        let mut documents = Vec::new();
        if let Some(passport) = &docs.passport {
            let number = match &passport.series {
                Some(series) => format!("{} {}", escape_text(series), escape_text(&passport.number)),
                None => escape_text(&passport.number),
            };
            documents.push(CardLine {
                label: "Passport".to_string(),
                value: format!(
                    "{number}, issued {} by {}",
                    passport.issued_on,
                    escape_text(&passport.issued_by)
                ),
            });
        }
        if let Some(policy) = &docs.insurance_policy {
            let mut value = format!(
                "{} ({})",
                escape_text(&policy.number),
                escape_text(&policy.insurer)
            );
            if let Some(until) = policy.valid_until {
                value.push_str(&format!(", valid until {until}"));
            }
            documents.push(CardLine {
                label: "Insurance policy".to_string(),
                value,
            });
        }
        if let Some(number) = &docs.pension_insurance_number {
            documents.push(CardLine {
                label: "Pension insurance number".to_string(),
                value: escape_text(number),
            });
        }

        let capacity = &patient.legal.capacity;
        let guardian = capacity.guardian().map(|g| {
            let kind = match g.kind {
                GuardianKind::Relative => "relative",
                GuardianKind::Institution => "institution",
                GuardianKind::Authority => "guardianship authority",
            };
            let name = escape_text(&g.name);
            match &g.phone {
                Some(phone) => format!("{name} ({kind}), {}", escape_text(phone)),
                None => format!("{name} ({kind})"),
            }
        });

        let legal_cases = patient
            .legal
            .cases
            .iter()
            .filter(|c| c.closed_on.is_none())
            .map(|c| {
                let kind = match c.kind {
                    LegalCaseKind::CapacityProceeding => "capacity proceeding",
                    LegalCaseKind::Guardianship => "guardianship",
                    LegalCaseKind::Inheritance => "inheritance",
                    LegalCaseKind::Housing => "housing",
                    LegalCaseKind::Other => "other",
                };
                let mut line = format!("{kind}, opened {}", c.opened_on);
                if let Some(number) = &c.case_number {
                    line.push_str(&format!(", case {}", escape_text(number)));
                }
                line
            })
            .collect();

        let medical = patient.medical.as_ref().map(|m| {
            let mobility = match m.mobility {
                Mobility::Independent => "independent",
                Mobility::Assisted => "needs assistance",
                Mobility::Bedridden => "bedridden",
            };
            let diagnosis = escape_text(&m.diagnosis);
            let mut line = match &m.icd10 {
                Some(code) => format!("{diagnosis} ({}), {mobility}", escape_text(code)),
                None => format!("{diagnosis}, {mobility}"),
            };
            if m.needs_placement {
                line.push_str(", needs care placement");
            }
            line
        });

        let disability = patient.disability.as_ref().map(|d| {
            let review = match d.review_on {
                Some(review) => format!("review {review}"),
                None => "indefinite".to_string(),
            };
            format!(
                "group {} since {}, {review}",
                d.group.numeral(),
                d.established_on
            )
        });

        let pension = patient.pension.as_ref().map(|p| {
            let recipient = match p.recipient {
                PensionRecipient::Patient => "paid to the patient",
                PensionRecipient::Guardian => "paid to the guardian",
                PensionRecipient::Institution => "paid to the institution",
            };
            let mut line = format!("{} pension, {recipient}", p.kind.label());
            if let Some(amount) = p.monthly_amount {
                line.push_str(&format!(", {} per month", format_amount(amount)));
            }
            line
        });

        let open_assignments = assignments
            .iter()
            .filter(|a| a.patient_id == patient.id && !a.status.is_closed())
            .map(|a| {
                let mut line = format!(
                    "{} ({}): {}",
                    a.kind.label(),
                    a.status,
                    escape_text(&a.description)
                );
                if let Some(due) = a.due_on {
                    line.push_str(&format!(", due {due}"));
                    if a.is_overdue(today) {
                        line.push_str(" **overdue**");
                    }
                }
                line
            })
            .collect();

        Self {
            generated_on: today.to_string(),
            generated_by: escape_text(generated_by),
            full_name: escape_text(&patient.name.full()),
            date_of_birth: patient.date_of_birth.to_string(),
            age: patient.age_on(today),
            sex: match patient.sex {
                Sex::Male => "male",
                Sex::Female => "female",
                Sex::Unknown => "unknown",
            }
            .to_string(),
            status: patient.status.as_str().to_string(),
            archived: patient.archived,
            department: department
                .map(|d| format!("{} ({})", escape_text(&d.name), escape_text(&d.code)))
                .unwrap_or_else(|| "not assigned".to_string()),
            ward: patient.ward.as_deref().map(escape_text),
            admitted_on: patient.admitted_on.to_string(),
            discharged_on: patient.discharged_on.map(|d| d.to_string()),
            address: patient.registered_address.as_ref().map(|a| {
                let line = escape_text(&a.line());
                if a.homeless {
                    format!("{line} (no fixed abode)")
                } else {
                    line
                }
            }),
            documents,
            missing_documents: docs
                .outstanding()
                .into_iter()
                .map(|k| k.label().to_string())
                .collect(),
            capacity: capacity.label().to_string(),
            court_decision: capacity.decision().map(|d| {
                format!(
                    "{}, case {}, {}",
                    escape_text(&d.court),
                    escape_text(&d.case_number),
                    d.decided_on
                )
            }),
            guardian,
            legal_cases,
            medical,
            disability_review_due: patient
                .disability
                .as_ref()
                .is_some_and(|d| d.review_due(today)),
            disability,
            pension,
            relatives: patient
                .relatives
                .iter()
                .map(|r| {
                    let who = format!("{} ({})", escape_text(&r.name), escape_text(&r.relation));
                    match &r.phone {
                        Some(phone) => format!("{who}, {}", escape_text(phone)),
                        None => who,
                    }
                })
                .collect(),
            open_assignments,
            notes: patient
                .notes
                .as_deref()
                .unwrap_or_default()
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(escape_text)
                .collect(),
        }
    }
}
