//! almoner-search
//!
//! Patient lookup index: build, mutate and query a Tantivy index, and
//! persist it to the document store as a `tar.zst` blob with ETag locking.

pub mod error;
pub mod flush;
pub mod index;
pub mod mutate;
pub mod query;
