use tera::{Context, Tera};

use crate::card::PatientCard;
use crate::error::ExportError;

/// Built-in patient card layout, in the markdown subset understood by
/// [`crate::docx::generate_docx`].
pub const DEFAULT_CARD_TEMPLATE: &str = r#"# Patient card: {{ full_name }}
Generated: {{ generated_on }} by {{ generated_by }}
{% if archived %}**ARCHIVED RECORD**
{% endif %}
## Personal details
Date of birth: {{ date_of_birth }} (age {{ age }})
Sex: {{ sex }}
Status: {{ status }}
Department: {{ department }}{% if ward %}, ward {{ ward }}{% endif %}
Admitted: {{ admitted_on }}
{% if discharged_on %}Discharged: {{ discharged_on }}
{% endif %}{% if address %}Registered address: {{ address }}
{% endif %}
## Documents
{% if documents %}{% for doc in documents %}- **{{ doc.label }}**: {{ doc.value }}
{% endfor %}{% else %}No documents on file.
{% endif %}{% if missing_documents %}
### Missing documents
{% for kind in missing_documents %}1. {{ kind }}
{% endfor %}{% endif %}
## Legal status
Capacity: {{ capacity }}
{% if court_decision %}Court decision: {{ court_decision }}
{% endif %}{% if guardian %}Guardian: {{ guardian }}
{% endif %}{% for case in legal_cases %}- {{ case }}
{% endfor %}
## Medical and social
{% if medical %}Diagnosis: {{ medical }}
{% endif %}{% if disability %}Disability: {{ disability }}{% if disability_review_due %} **review due**{% endif %}
{% endif %}{% if pension %}Pension: {{ pension }}
{% endif %}{% if relatives %}
### Relatives
{% for relative in relatives %}- {{ relative }}
{% endfor %}{% endif %}
## Open assignments
{% if open_assignments %}{% for assignment in open_assignments %}1. {{ assignment }}
{% endfor %}{% else %}None.
{% endif %}{% if notes %}
## Notes
{% for line in notes %}{{ line }}
{% endfor %}{% endif %}"#;

/// Render a patient card through a Tera template.
///
/// The card's fields become the template context variables.
pub fn render_card(template: &str, card: &PatientCard) -> Result<String, ExportError> {
    let mut tera = Tera::default();
    tera.autoescape_on(vec![]);
    tera.add_raw_template("patient_card", template)
        .map_err(|e| ExportError::TemplateParse(e.to_string()))?;

    let value = serde_json::to_value(card)?;
    let context = Context::from_value(value)
        .map_err(|e| ExportError::TemplateRender(e.to_string()))?;

    let rendered = tera.render("patient_card", &context)?;
    Ok(rendered)
}
