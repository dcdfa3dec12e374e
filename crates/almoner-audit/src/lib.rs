//! almoner-audit
//!
//! Audit trail of user activity: structured events emitted through `tracing`
//! and persisted as day-partitioned activity records in the document store.

pub mod error;
pub mod events;
pub mod trail;
