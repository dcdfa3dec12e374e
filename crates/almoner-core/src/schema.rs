use tantivy::schema::{self, FAST, INDEXED, STORED, STRING, Schema, TEXT};

/// Field names used in the patient index.
pub mod field {
    pub const ID: &str = "id";
    pub const FULL_NAME: &str = "full_name";
    pub const DOCUMENT_NUMBERS: &str = "document_numbers";
    pub const DEPARTMENT_ID: &str = "department_id";
    pub const STATUS: &str = "status";
    pub const ARCHIVED: &str = "archived";
    pub const DATE_OF_BIRTH: &str = "date_of_birth";
    pub const UPDATED_AT: &str = "updated_at";
}

/// Build the Tantivy schema used by the patient index.
pub fn build_schema() -> Schema {
    let mut builder = Schema::builder();

    builder.add_text_field(field::ID, STRING | STORED);

    // Full-text: names and document numbers are what staff type into the search box
    builder.add_text_field(field::FULL_NAME, TEXT | STORED);
    builder.add_text_field(field::DOCUMENT_NUMBERS, TEXT);

    // Exact-match filters
    builder.add_text_field(field::DEPARTMENT_ID, STRING | STORED);
    builder.add_text_field(field::STATUS, STRING | STORED);
    // "true"/"false"
    builder.add_text_field(field::ARCHIVED, STRING | STORED);

    builder.add_text_field(field::DATE_OF_BIRTH, STORED);

    // Unix milliseconds
    builder.add_i64_field(field::UPDATED_AT, INDEXED | STORED | FAST);

    builder.build()
}

/// Resolve a field by name from the schema, returning the Tantivy `Field` handle.
///
/// # Panics
///
/// Panics if the field name does not exist in the schema. This is only called
/// with the constants in [`field`], so a panic indicates a schema definition bug.
pub fn get_field(schema: &Schema, name: &str) -> schema::Field {
    schema
        .get_field(name)
        .unwrap_or_else(|_| panic!("field '{name}' not found in schema"))
}
