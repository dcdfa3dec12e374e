use tantivy::{TantivyDocument, Term, doc};
use tracing::{debug, info};
use uuid::Uuid;

use almoner_core::models::patient::Patient;
use almoner_core::schema::{field, get_field};

use crate::error::SearchError;
use crate::index::PatientIndex;

impl PatientIndex {
    /// Replace the patient's entry. Visible after [`PatientIndex::commit`].
    pub fn upsert_patient(&self, patient: &Patient) -> Result<(), SearchError> {
        self.writer.delete_term(self.id_term(patient.id));
        self.writer.add_document(self.to_document(patient))?;
        Ok(())
    }

    /// Like [`PatientIndex::upsert_patient`], but keeps the committed entry
    /// when it was indexed from a newer version of the record. Returns whether
    /// the entry was replaced.
    pub fn upsert_if_newer(&self, patient: &Patient) -> Result<bool, SearchError> {
        let stale = self
            .indexed_updated_at(patient.id)?
            .is_some_and(|indexed| indexed > patient.updated_at.as_millisecond());
        if stale {
            debug!(patient_id = %patient.id, "index already holds a newer version");
            return Ok(false);
        }
        self.upsert_patient(patient)?;
        Ok(true)
    }

    pub fn remove_patient(&self, id: Uuid) -> Result<(), SearchError> {
        self.writer.delete_term(self.id_term(id));
        Ok(())
    }

    /// Drop every entry and index `patients` from scratch, then commit.
    pub fn rebuild<'a>(
        &mut self,
        patients: impl IntoIterator<Item = &'a Patient>,
    ) -> Result<u64, SearchError> {
        self.writer.delete_all_documents()?;
        for patient in patients {
            self.writer.add_document(self.to_document(patient))?;
        }
        self.commit()?;
        let count = self.num_docs();
        info!(patients = count, "patient index rebuilt");
        Ok(count)
    }

    /// Commit pending changes and make them searchable.
    pub fn commit(&mut self) -> Result<(), SearchError> {
        self.writer.commit()?;
        self.reader.reload()?;
        Ok(())
    }

    pub(crate) fn id_term(&self, id: Uuid) -> Term {
        let schema = self.index.schema();
        Term::from_field_text(get_field(&schema, field::ID), &id.to_string())
    }

    fn to_document(&self, patient: &Patient) -> TantivyDocument {
        let schema = self.index.schema();
        doc!(
            get_field(&schema, field::ID) => patient.id.to_string(),
            get_field(&schema, field::FULL_NAME) => patient.name.full(),
            get_field(&schema, field::DOCUMENT_NUMBERS) => patient.documents.numbers(),
            get_field(&schema, field::DEPARTMENT_ID) => patient
                .department_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            get_field(&schema, field::STATUS) => patient.status.as_str(),
            get_field(&schema, field::ARCHIVED) => if patient.archived { "true" } else { "false" },
            get_field(&schema, field::DATE_OF_BIRTH) => patient.date_of_birth.to_string(),
            get_field(&schema, field::UPDATED_AT) => patient.updated_at.as_millisecond(),
        )
    }
}
