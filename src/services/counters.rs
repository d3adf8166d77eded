use crate::{
    db::{with_transaction, DbPool},
    entities::{
        counter::Entity as Counter,
        counter_runtime::{self, CounterStatus, Entity as CounterRuntime},
    },
    errors::ServiceError,
};
use chrono::Utc;
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QuerySelect, Set,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

/// A finished count.
#[derive(Debug, Clone, Serialize)]
pub struct CountResult {
    pub runtime: counter_runtime::Model,
    pub variance: i32,
}

/// Tracks pick-counter sessions: start a count, accumulate scans, finish.
#[derive(Clone)]
pub struct CounterService {
    db_pool: Arc<DbPool>,
}

impl CounterService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Starts a count on a counter. A counter that is already counting is
    /// rejected; an idle or finished one is reset.
    #[instrument(skip(self))]
    pub async fn start(
        &self,
        counter_id: i32,
        order_id: Option<i32>,
        expected_qty: i32,
    ) -> Result<counter_runtime::Model, ServiceError> {
        if expected_qty < 0 {
            return Err(ServiceError::ValidationError(format!(
                "expected_qty must not be negative (got {})",
                expected_qty
            )));
        }

        let runtime = with_transaction(self.db_pool.as_ref(), move |txn| {
            Box::pin(async move {
                let counter = Counter::find_by_id(counter_id)
                    .one(txn)
                    .await
                    .map_err(ServiceError::db_error)?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!("Counter {} not found", counter_id))
                    })?;
                if !counter.is_active {
                    return Err(ServiceError::InvalidOperation(format!(
                        "Counter {} is inactive",
                        counter.counter_code
                    )));
                }

                let now = Utc::now();
                match lock_runtime(txn, counter_id).await? {
                    Some(runtime) if runtime.state() == Some(CounterStatus::Counting) => {
                        Err(ServiceError::InvalidOperation(format!(
                            "Counter {} is already counting",
                            counter.counter_code
                        )))
                    }
                    Some(runtime) => {
                        let mut active: counter_runtime::ActiveModel = runtime.into();
                        active.order_id = Set(order_id);
                        active.status = Set(CounterStatus::Counting.to_string());
                        active.expected_qty = Set(expected_qty);
                        active.scanned_qty = Set(0);
                        active.started_at = Set(Some(now));
                        active.finished_at = Set(None);
                        active.updated_at = Set(now);
                        active.update(txn).await.map_err(ServiceError::db_error)
                    }
                    None => counter_runtime::ActiveModel {
                        counter_id: Set(counter_id),
                        order_id: Set(order_id),
                        status: Set(CounterStatus::Counting.to_string()),
                        expected_qty: Set(expected_qty),
                        scanned_qty: Set(0),
                        started_at: Set(Some(now)),
                        finished_at: Set(None),
                        updated_at: Set(now),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error),
                }
            })
        })
        .await?;

        counter!("warehouse_ledger.counters.started", 1);
        info!(counter_id, expected_qty, "Count started");
        Ok(runtime)
    }

    /// Adds scanned units to a running count.
    #[instrument(skip(self))]
    pub async fn scan(
        &self,
        counter_id: i32,
        qty: i32,
    ) -> Result<counter_runtime::Model, ServiceError> {
        if qty <= 0 {
            return Err(ServiceError::ValidationError(format!(
                "Scanned quantity must be positive (got {})",
                qty
            )));
        }

        with_transaction(self.db_pool.as_ref(), move |txn| {
            Box::pin(async move {
                let runtime = running(txn, counter_id).await?;
                let scanned = runtime.scanned_qty.checked_add(qty).ok_or_else(|| {
                    ServiceError::ValidationError(format!(
                        "Counter {} scanned quantity would overflow",
                        counter_id
                    ))
                })?;

                let mut active: counter_runtime::ActiveModel = runtime.into();
                active.scanned_qty = Set(scanned);
                active.updated_at = Set(Utc::now());
                active.update(txn).await.map_err(ServiceError::db_error)
            })
        })
        .await
    }

    /// Closes a running count and reports scanned minus expected.
    #[instrument(skip(self))]
    pub async fn finish(&self, counter_id: i32) -> Result<CountResult, ServiceError> {
        let runtime = with_transaction(self.db_pool.as_ref(), move |txn| {
            Box::pin(async move {
                let runtime = running(txn, counter_id).await?;
                let now = Utc::now();
                let mut active: counter_runtime::ActiveModel = runtime.into();
                active.status = Set(CounterStatus::Done.to_string());
                active.finished_at = Set(Some(now));
                active.updated_at = Set(now);
                active.update(txn).await.map_err(ServiceError::db_error)
            })
        })
        .await?;

        let variance = runtime.variance();
        counter!("warehouse_ledger.counters.finished", 1);
        info!(counter_id, scanned = runtime.scanned_qty, variance, "Count finished");
        Ok(CountResult { runtime, variance })
    }

    pub async fn runtime(
        &self,
        counter_id: i32,
    ) -> Result<Option<counter_runtime::Model>, ServiceError> {
        CounterRuntime::find()
            .filter(counter_runtime::Column::CounterId.eq(counter_id))
            .one(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }
}

async fn lock_runtime(
    txn: &DatabaseTransaction,
    counter_id: i32,
) -> Result<Option<counter_runtime::Model>, ServiceError> {
    CounterRuntime::find()
        .filter(counter_runtime::Column::CounterId.eq(counter_id))
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(ServiceError::db_error)
}

async fn running(
    txn: &DatabaseTransaction,
    counter_id: i32,
) -> Result<counter_runtime::Model, ServiceError> {
    let runtime = lock_runtime(txn, counter_id).await?.ok_or_else(|| {
        ServiceError::NotFound(format!("Counter {} has never been started", counter_id))
    })?;
    if runtime.state() != Some(CounterStatus::Counting) {
        return Err(ServiceError::InvalidOperation(format!(
            "Counter {} is not counting (status {})",
            counter_id, runtime.status
        )));
    }
    Ok(runtime)
}
