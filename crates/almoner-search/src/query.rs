use serde::Serialize;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, Occur, Query, QueryParser, TermQuery};
use tantivy::schema::{IndexRecordOption, Value};
use tantivy::{DocAddress, Searcher, TantivyDocument, Term};
use uuid::Uuid;

use almoner_core::schema::{field, get_field};

use crate::error::SearchError;
use crate::index::PatientIndex;

/// A patient matched by the index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientHit {
    pub id: Uuid,
    pub full_name: String,
    pub department_id: Option<Uuid>,
    pub status: String,
    pub archived: bool,
    pub date_of_birth: Option<jiff::civil::Date>,
    pub score: f32,
}

impl PatientIndex {
    /// Full-text search over names and document numbers.
    ///
    /// Archived patients are left out unless `include_archived` is set.
    pub fn search(
        &self,
        text: &str,
        limit: usize,
        include_archived: bool,
    ) -> Result<Vec<PatientHit>, SearchError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let schema = self.index.schema();

        let parser = QueryParser::for_index(
            &self.index,
            vec![
                get_field(&schema, field::FULL_NAME),
                get_field(&schema, field::DOCUMENT_NUMBERS),
            ],
        );
        let parsed = parser
            .parse_query(text)
            .map_err(|e| SearchError::QueryParse(e.to_string()))?;

        let query: Box<dyn Query> = if include_archived {
            parsed
        } else {
            let archived = TermQuery::new(
                Term::from_field_text(get_field(&schema, field::ARCHIVED), "true"),
                IndexRecordOption::Basic,
            );
            Box::new(BooleanQuery::new(vec![
                (Occur::Must, parsed),
                (Occur::MustNot, Box::new(archived)),
            ]))
        };

        self.collect(query.as_ref(), limit)
    }

    /// Patients filed under a department, archived ones included.
    pub fn find_by_department(
        &self,
        department_id: Uuid,
        limit: usize,
    ) -> Result<Vec<PatientHit>, SearchError> {
        let schema = self.index.schema();
        let query = TermQuery::new(
            Term::from_field_text(
                get_field(&schema, field::DEPARTMENT_ID),
                &department_id.to_string(),
            ),
            IndexRecordOption::Basic,
        );
        self.collect(&query, limit)
    }

    /// `updated_at` (Unix milliseconds) of the committed entry for `id`.
    pub fn indexed_updated_at(&self, id: Uuid) -> Result<Option<i64>, SearchError> {
        let searcher = self.reader.searcher();
        let query = TermQuery::new(self.id_term(id), IndexRecordOption::Basic);
        let top_docs = searcher.search(&query, &TopDocs::with_limit(1))?;
        let Some((_, address)) = top_docs.into_iter().next() else {
            return Ok(None);
        };
        let doc = searcher.doc::<TantivyDocument>(address)?;
        let schema = self.index.schema();
        Ok(doc
            .get_first(get_field(&schema, field::UPDATED_AT))
            .and_then(|v| v.as_i64()))
    }

    fn collect(&self, query: &dyn Query, limit: usize) -> Result<Vec<PatientHit>, SearchError> {
        let searcher = self.reader.searcher();
        let top_docs = searcher.search(query, &TopDocs::with_limit(limit.max(1)))?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            if let Some(hit) = self.read_hit(&searcher, address, score)? {
                hits.push(hit);
            }
        }
        Ok(hits)
    }

    fn read_hit(
        &self,
        searcher: &Searcher,
        address: DocAddress,
        score: f32,
    ) -> Result<Option<PatientHit>, SearchError> {
        let doc = searcher.doc::<TantivyDocument>(address)?;
        let schema = self.index.schema();
        let text = |name: &str| {
            doc.get_first(get_field(&schema, name))
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };

        let Ok(id) = text(field::ID).parse::<Uuid>() else {
            tracing::warn!(?address, "indexed patient without a valid id");
            return Ok(None);
        };

        Ok(Some(PatientHit {
            id,
            full_name: text(field::FULL_NAME),
            department_id: text(field::DEPARTMENT_ID).parse().ok(),
            status: text(field::STATUS),
            archived: text(field::ARCHIVED) == "true",
            date_of_birth: text(field::DATE_OF_BIRTH).parse().ok(),
            score,
        }))
    }
}
