//! almoner-storage
//!
//! Document persistence: the `DocumentStore` seam with S3 and in-memory
//! backends, typed repositories, and a compensating unit of work.

pub mod claim;
pub mod client;
pub mod error;
pub mod json;
pub mod memory;
pub mod repository;
pub mod s3;
pub mod store;
pub mod unit_of_work;
