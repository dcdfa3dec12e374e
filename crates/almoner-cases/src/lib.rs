//! almoner-cases
//!
//! Application services over the case register: patients, inter-department
//! assignments, departments and the caseload summary. Every mutation is
//! validated, then written together with its audit record in one unit of work.

use std::sync::Arc;

use jiff::Zoned;
use jiff::civil::Date;

use almoner_audit::events;
use almoner_audit::trail::AuditTrail;
use almoner_core::models::Document;
use almoner_core::models::activity::ActivityRecord;
use almoner_storage::repository::Versioned;
use almoner_storage::store::DocumentStore;
use almoner_storage::unit_of_work::{CommitReceipt, UnitOfWork};

pub mod assignments;
pub mod departments;
pub mod error;
pub mod patients;
pub mod summary;

use error::CaseError;

/// Store and audit trail shared by the services.
#[derive(Clone)]
pub struct CaseStore {
    store: Arc<dyn DocumentStore>,
    trail: AuditTrail,
}

impl CaseStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let trail = AuditTrail::new(Arc::clone(&store));
        Self { store, trail }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn trail(&self) -> &AuditTrail {
        &self.trail
    }

    fn unit(&self) -> UnitOfWork {
        UnitOfWork::new(Arc::clone(&self.store))
    }
}

/// Commit `uow` and emit its audit records once the writes have landed.
async fn commit(uow: UnitOfWork, records: &[ActivityRecord]) -> Result<CommitReceipt, CaseError> {
    let receipt = uow.commit().await?;
    for record in records {
        events::emit(record);
    }
    Ok(receipt)
}

fn versioned<T: Document>(receipt: &CommitReceipt, value: T) -> Versioned<T> {
    let etag = receipt.etag_of(&value).unwrap_or_default().to_string();
    Versioned { value, etag }
}

fn today() -> Date {
    Zoned::now().date()
}
