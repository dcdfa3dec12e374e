use std::sync::Arc;

use jiff::Timestamp;
use jiff::civil::Date;
use jiff::tz::TimeZone;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use almoner_core::keys;
use almoner_core::models::activity::{ActivityAction, ActivityRecord, ResourceType};
use almoner_storage::json;
use almoner_storage::store::{DocumentStore, Precondition};
use almoner_storage::unit_of_work::UnitOfWork;

use crate::error::AuditError;
use crate::events::{self, AuditEvent};

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const MAX_PAGE_SIZE: usize = 500;

/// Criteria for [`AuditTrail::query`]. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityFilter {
    /// First UTC day to include.
    pub from: Option<Date>,
    /// Last UTC day to include.
    pub to: Option<Date>,
    pub actor_id: Option<Uuid>,
    pub resource_type: Option<ResourceType>,
    pub resource_id: Option<Uuid>,
    pub action: Option<ActivityAction>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl ActivityFilter {
    fn includes_day(&self, day: Date) -> bool {
        self.from.is_none_or(|from| day >= from) && self.to.is_none_or(|to| day <= to)
    }

    fn matches(&self, record: &ActivityRecord) -> bool {
        self.includes_day(utc_day(record.occurred_at))
            && self.actor_id.is_none_or(|id| record.actor.id == id)
            && self.resource_type.is_none_or(|t| record.resource_type == t)
            && self.resource_id.is_none_or(|id| record.resource_id == Some(id))
            && self.action.is_none_or(|a| record.action == a)
    }

    fn page_size(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityPage {
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    pub records: Vec<ActivityRecord>,
}

/// Persisted, queryable audit trail.
#[derive(Clone)]
pub struct AuditTrail {
    store: Arc<dyn DocumentStore>,
}

impl AuditTrail {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Persist an event on its own and emit it.
    pub async fn record(&self, event: AuditEvent) -> Result<ActivityRecord, AuditError> {
        let record = event.into_record(Timestamp::now());
        json::save_json(
            self.store.as_ref(),
            &record_key(&record),
            &record,
            Precondition::IfAbsent,
        )
        .await?;
        events::emit(&record);
        Ok(record)
    }

    /// Add an event to `uow` so it lands or rolls back with the change it
    /// describes. The caller emits the returned record once the unit commits.
    pub fn stage(
        &self,
        uow: &mut UnitOfWork,
        event: AuditEvent,
    ) -> Result<ActivityRecord, AuditError> {
        let record = event.into_record(Timestamp::now());
        uow.put_json(record_key(&record), &record, Precondition::IfAbsent)?;
        Ok(record)
    }

    pub async fn query(&self, filter: &ActivityFilter) -> Result<ActivityPage, AuditError> {
        if let (Some(from), Some(to)) = (filter.from, filter.to)
            && from > to
        {
            return Err(AuditError::InvalidFilter(format!(
                "from ({from}) is after to ({to})"
            )));
        }

        let prefix = match (filter.from, filter.to) {
            (Some(from), Some(to)) if from == to => keys::activity_day_prefix(from),
            _ => keys::ACTIVITY.to_string(),
        };

        let candidates: Vec<String> = self
            .store
            .list(&prefix)
            .await?
            .into_iter()
            .filter(|key| {
                keys::activity_day(key).is_ok_and(|day| filter.includes_day(day))
            })
            .collect();
        debug!(prefix = %prefix, candidates = candidates.len(), "querying activity");

        let mut matched = Vec::new();
        for key in &candidates {
            let Some((record, _)) =
                json::find_json::<ActivityRecord>(self.store.as_ref(), key).await?
            else {
                continue;
            };
            if filter.matches(&record) {
                matched.push(record);
            }
        }

        matched.sort_by(|a, b| {
            b.occurred_at
                .cmp(&a.occurred_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        let total = matched.len();
        let offset = filter.offset.unwrap_or(0);
        let limit = filter.page_size();
        let records = matched.into_iter().skip(offset).take(limit).collect();

        Ok(ActivityPage {
            total,
            offset,
            limit,
            records,
        })
    }
}

fn utc_day(ts: Timestamp) -> Date {
    ts.to_zoned(TimeZone::UTC).date()
}

fn record_key(record: &ActivityRecord) -> String {
    keys::activity(utc_day(record.occurred_at), record.id)
}
