use jiff::civil::date;
use uuid::Uuid;

use almoner_core::models::assignment::{Assignment, AssignmentKind, AssignmentStatus};
use almoner_core::models::department::Department;
use almoner_core::models::documents::{DocumentKind, IdentityDocuments, Passport};
use almoner_core::models::legal::{
    CourtDecision, Guardian, GuardianKind, LegalCapacity, LegalStatus,
};
use almoner_core::models::medical::{Disability, DisabilityGroup};
use almoner_core::models::patient::{Patient, PatientStatus, PersonName, Sex};
use almoner_core::models::pension::{Pension, PensionKind, PensionRecipient};
use almoner_export::card::PatientCard;
use almoner_export::docx::{Block, escape_text, generate_docx, parse_blocks};
use almoner_export::render::{DEFAULT_CARD_TEMPLATE, render_card};
use almoner_export::styles::DocumentStyles;

fn department() -> Department {
    let now = jiff::Timestamp::now();
    Department {
        id: Uuid::new_v4(),
        code: "CARD".to_string(),
        name: "Cardiology".to_string(),
        active: true,
        created_at: now,
        updated_at: now,
    }
}

fn patient(department: &Department) -> Patient {
    let now = jiff::Timestamp::now();
    Patient {
        id: Uuid::new_v4(),
        name: PersonName {
            last: "Orlova".to_string(),
            first: "Anna".to_string(),
            middle: Some("Petrovna".to_string()),
        },
        date_of_birth: date(1948, 5, 17),
        sex: Sex::Female,
        department_id: Some(department.id),
        ward: Some("12".to_string()),
        registered_address: None,
        admitted_on: date(2024, 1, 10),
        discharged_on: None,
        status: PatientStatus::Inpatient,
        documents: IdentityDocuments {
            passport: Some(Passport {
                series: Some("4510".to_string()),
                number: "778899".to_string(),
                issued_by: "UFMS".to_string(),
                issued_on: date(2005, 6, 1),
            }),
            insurance_policy: None,
            pension_insurance_number: None,
            missing: vec![DocumentKind::BirthCertificate],
        },
        medical: None,
        legal: LegalStatus {
            capacity: LegalCapacity::Incapable {
                decision: CourtDecision {
                    court: "District court".to_string(),
                    case_number: "2-118/2023".to_string(),
                    decided_on: date(2023, 6, 1),
                },
                guardian: Some(Guardian {
                    name: "Orlov Pavel".to_string(),
                    kind: GuardianKind::Relative,
                    phone: None,
                }),
            },
            cases: Vec::new(),
        },
        pension: Some(Pension {
            kind: PensionKind::OldAge,
            monthly_amount: Some(1_850_050),
            recipient: PensionRecipient::Guardian,
            paying_office: None,
        }),
        disability: Some(Disability {
            group: DisabilityGroup::Second,
            established_on: date(2020, 3, 1),
            review_on: Some(date(2024, 3, 1)),
        }),
        relatives: Vec::new(),
        notes: None,
        archived: false,
        created_by: Uuid::nil(),
        created_at: now,
        updated_at: now,
    }
}

fn assignment(patient: &Patient, status: AssignmentStatus, due: Option<jiff::civil::Date>) -> Assignment {
    let now = jiff::Timestamp::now();
    Assignment {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        requested_by_department: patient.department_id.unwrap_or_default(),
        kind: AssignmentKind::DocumentRestoration,
        description: "restore birth certificate".to_string(),
        assignee_id: None,
        status,
        due_on: due,
        notes: Vec::new(),
        created_by: Uuid::nil(),
        created_at: now,
        updated_at: now,
        closed_at: None,
    }
}

#[test]
fn card_flattens_the_record() {
    let dep = department();
    let patient = patient(&dep);
    let assignments = vec![
        assignment(&patient, AssignmentStatus::Open, Some(date(2024, 4, 1))),
        assignment(&patient, AssignmentStatus::Completed, None),
    ];

    let card = PatientCard::build(&patient, Some(&dep), &assignments, "Social Worker", date(2024, 5, 1));

    assert_eq!(card.full_name, "Orlova Anna Petrovna");
    assert_eq!(card.age, 75);
    assert_eq!(card.department, "Cardiology (CARD)");
    assert_eq!(card.documents.len(), 1);
    assert_eq!(card.documents[0].value, "4510 778899, issued 2005-06-01 by UFMS");
    assert_eq!(card.missing_documents.len(), 3);
    assert_eq!(card.capacity, "legally incapable");
    assert_eq!(card.guardian.as_deref(), Some("Orlov Pavel (relative)"));
    assert_eq!(
        card.pension.as_deref(),
        Some("old-age pension, paid to the guardian, 18500.50 per month")
    );
    assert!(card.disability_review_due);
    assert_eq!(card.open_assignments.len(), 1);
    assert!(card.open_assignments[0].ends_with("due 2024-04-01 **overdue**"));
}

#[test]
fn default_template_renders_card_sections() {
    let dep = department();
    let patient = patient(&dep);
    let card = PatientCard::build(&patient, Some(&dep), &[], "Social Worker", date(2024, 5, 1));

    let rendered = render_card(DEFAULT_CARD_TEMPLATE, &card).unwrap();
    assert!(rendered.starts_with("# Patient card: Orlova Anna Petrovna"));
    assert!(rendered.contains("Department: Cardiology (CARD), ward 12"));
    assert!(rendered.contains("- **Passport**: 4510 778899"));
    assert!(rendered.contains("1. birth certificate"));
    assert!(rendered.contains("Guardian: Orlov Pavel (relative)"));
    assert!(rendered.contains("**review due**"));
    assert!(rendered.contains("## Open assignments\nNone."));
    assert!(!rendered.contains("ARCHIVED"));
}

#[test]
fn broken_template_is_a_parse_error() {
    let dep = department();
    let card = PatientCard::build(&patient(&dep), None, &[], "x", date(2024, 5, 1));
    let err = render_card("{% if full_name %}unterminated", &card).unwrap_err();
    assert!(matches!(err, almoner_export::error::ExportError::TemplateParse(_)));
}

#[test]
fn blocks_cover_the_markdown_subset() {
    let blocks = parse_blocks(
        "# Title\n## Section\n### Sub\n- bullet\n12. numbered\nStatus: inpatient\n---\n\nplain **bold** text\n",
    );
    assert_eq!(
        blocks,
        vec![
            Block::Heading { level: 1, text: "Title" },
            Block::Heading { level: 2, text: "Section" },
            Block::Heading { level: 3, text: "Sub" },
            Block::Bullet("bullet"),
            Block::Numbered("numbered"),
            Block::Field { label: "Status", value: "inpatient" },
            Block::PageBreak,
            Block::Blank,
            Block::Text("plain **bold** text"),
        ]
    );
}

#[test]
fn docx_output_is_a_zip_package() {
    let dep = department();
    let card = PatientCard::build(&patient(&dep), Some(&dep), &[], "Social Worker", date(2024, 5, 1));
    let rendered = render_card(DEFAULT_CARD_TEMPLATE, &card).unwrap();

    let bytes = generate_docx(&rendered, &DocumentStyles::default()).unwrap();
    assert!(bytes.len() > 1000);
    assert_eq!(&bytes[..2], b"PK");
}

#[test]
fn user_text_cannot_add_formatting() {
    let dep = department();
    let mut patient = patient(&dep);
    patient.name.last = "**Orlova**".to_string();
    patient.notes = Some(
        "calm today\n---\n# Diagnosis: forged heading\n\n- visited by son".to_string(),
    );
    let mut task = assignment(&patient, AssignmentStatus::Open, None);
    task.description = "call family\n## Urgent".to_string();

    let card = PatientCard::build(&patient, Some(&dep), &[task], "Social Worker", date(2024, 5, 1));
    assert_eq!(
        card.notes,
        vec![
            "calm today",
            "\\---",
            "\\# Diagnosis: forged heading",
            "\\- visited by son",
        ]
    );

    let rendered = render_card(DEFAULT_CARD_TEMPLATE, &card).unwrap();
    let blocks = parse_blocks(&rendered);
    assert!(!blocks.contains(&Block::PageBreak));
    assert_eq!(
        blocks[0],
        Block::Heading {
            level: 1,
            text: "Patient card: \\*\\*Orlova\\*\\* Anna Petrovna"
        }
    );
    let headings: Vec<&str> = blocks
        .iter()
        .filter_map(|b| match b {
            Block::Heading { text, .. } => Some(*text),
            _ => None,
        })
        .collect();
    assert!(headings.iter().all(|h| !h.contains("forged") && !h.contains("Urgent")));
    assert!(blocks.contains(&Block::Text("\\# Diagnosis: forged heading")));

    let bytes = generate_docx(&rendered, &DocumentStyles::default()).unwrap();
    assert_eq!(&bytes[..2], b"PK");
}

#[test]
fn escaped_text_folds_lines_and_guards_markers() {
    assert_eq!(escape_text("plain  text\nwrapped"), "plain text wrapped");
    assert_eq!(escape_text("1. first"), "\\1. first");
    assert_eq!(escape_text("Status: forged"), "\\Status: forged");
    assert_eq!(escape_text("a*b\\c"), "a\\*b\\\\c");
    assert_eq!(escape_text("  "), "");
}
