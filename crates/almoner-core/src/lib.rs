//! almoner-core
//!
//! Pure domain types for the social department case register, the storage
//! key layout, validation rules, and the Tantivy schema for the patient index.
//! No AWS SDK dependency.

pub mod error;
pub mod keys;
pub mod models;
pub mod schema;
pub mod validation;
