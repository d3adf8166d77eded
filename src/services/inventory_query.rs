use crate::{
    db::DbPool,
    entities::{
        inventory::{self, Entity as Inventory},
        inventory_sum::{self, Entity as InventorySum},
        inventory_trx::{self, Entity as InventoryTrx},
        return_inventory::{self, Entity as ReturnInventory},
        usage_inventory::{self, Entity as UsageInventory},
    },
    errors::ServiceError,
    services::costing,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// On-hand position for one item at one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockSummary {
    pub item_id: i32,
    pub loc_id: i32,
    pub quantity: i64,
    pub total_cost: Decimal,
    pub lot_count: usize,
}

/// Lot balances against the ledger for one item across all locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub item_id: i32,
    pub on_hand: i64,
    pub ledger_net: i64,
    /// Lots whose `total_cost` disagrees with `quantity * unit_cost`.
    pub inconsistent_lots: Vec<i32>,
}

impl Reconciliation {
    pub fn is_balanced(&self) -> bool {
        self.on_hand == self.ledger_net && self.inconsistent_lots.is_empty()
    }
}

/// Read-side queries over lots and the ledger.
#[derive(Clone)]
pub struct InventoryQueryService {
    db_pool: Arc<DbPool>,
}

impl InventoryQueryService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Active lots for an item at a location in FIFO order.
    #[instrument(skip(self))]
    pub async fn lots(
        &self,
        item_id: i32,
        loc_id: i32,
    ) -> Result<Vec<inventory::Model>, ServiceError> {
        Inventory::find()
            .filter(inventory::Column::ItemId.eq(item_id))
            .filter(inventory::Column::LocId.eq(loc_id))
            .filter(inventory::Column::IsActive.eq(true))
            .order_by_asc(inventory::Column::CreatedAt)
            .order_by_asc(inventory::Column::Id)
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self))]
    pub async fn stock_summary(
        &self,
        item_id: i32,
        loc_id: i32,
    ) -> Result<StockSummary, ServiceError> {
        let lots = self.lots(item_id, loc_id).await?;
        Ok(summarize(item_id, loc_id, &lots))
    }

    /// Ledger rows an order produced, in write order.
    #[instrument(skip(self))]
    pub async fn transactions_for_order(
        &self,
        order_id: i32,
    ) -> Result<Vec<inventory_trx::Model>, ServiceError> {
        InventoryTrx::find()
            .filter(inventory_trx::Column::OrderId.eq(order_id))
            .order_by_asc(inventory_trx::Column::Id)
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    /// How much of a usage's draw from one lot may still be returned.
    #[instrument(skip(self))]
    pub async fn returnable_quantity(
        &self,
        usage_id: i32,
        inv_id: i32,
    ) -> Result<i32, ServiceError> {
        let db = self.db_pool.as_ref();

        let link = UsageInventory::find()
            .filter(usage_inventory::Column::UsageId.eq(usage_id))
            .filter(usage_inventory::Column::InvId.eq(inv_id))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Usage {} did not draw from lot {}",
                    usage_id, inv_id
                ))
            })?;
        let used = link.usage_qty.ok_or_else(|| {
            ServiceError::ValidationError(format!(
                "Usage link {} has no recorded quantity",
                link.id
            ))
        })?;

        let returned: i64 = ReturnInventory::find()
            .filter(return_inventory::Column::UsageInventoryId.eq(link.id))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?
            .iter()
            .map(|r| i64::from(r.return_qty))
            .sum();

        Ok((i64::from(used) - returned).max(0) as i32)
    }

    /// Compares on-hand lot quantities with the sum of ledger movements.
    #[instrument(skip(self))]
    pub async fn reconcile_item(&self, item_id: i32) -> Result<Reconciliation, ServiceError> {
        let db = self.db_pool.as_ref();

        let lots = Inventory::find()
            .filter(inventory::Column::ItemId.eq(item_id))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        let movements = InventoryTrx::find()
            .filter(inventory_trx::Column::ItemId.eq(item_id))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let reconciliation = Reconciliation {
            item_id,
            on_hand: lots.iter().map(|lot| i64::from(lot.quantity)).sum(),
            ledger_net: movements.iter().map(|trx| i64::from(trx.qty)).sum(),
            inconsistent_lots: lots
                .iter()
                .filter(|lot| !lot.is_consistent())
                .map(|lot| lot.id)
                .collect(),
        };

        if !reconciliation.is_balanced() {
            warn!(
                item_id,
                on_hand = reconciliation.on_hand,
                ledger_net = reconciliation.ledger_net,
                inconsistent = reconciliation.inconsistent_lots.len(),
                "Ledger does not reconcile"
            );
        }

        Ok(reconciliation)
    }

    /// Rebuilds the dimensionless `inventory_sum` row for (item, location)
    /// from the active lots, inside the caller's transaction.
    pub async fn refresh_sum(
        txn: &DatabaseTransaction,
        item_id: i32,
        loc_id: i32,
    ) -> Result<inventory_sum::Model, ServiceError> {
        let lots = Inventory::find()
            .filter(inventory::Column::ItemId.eq(item_id))
            .filter(inventory::Column::LocId.eq(loc_id))
            .filter(inventory::Column::IsActive.eq(true))
            .all(txn)
            .await
            .map_err(ServiceError::db_error)?;
        let summary = summarize(item_id, loc_id, &lots);

        let existing = dimensionless_sum(txn, item_id, loc_id).await?;
        let now = Utc::now();

        let row = match existing {
            Some(row) => {
                let mut active: inventory_sum::ActiveModel = row.into();
                active.quantity = Set(summary.quantity);
                active.total_cost = Set(summary.total_cost);
                active.updated_at = Set(now);
                active.update(txn).await
            }
            None => {
                inventory_sum::ActiveModel {
                    item_id: Set(item_id),
                    loc_id: Set(loc_id),
                    maintenance_contract_id: Set(None),
                    org_id: Set(None),
                    dept_id: Set(None),
                    condition: Set(None),
                    quantity: Set(summary.quantity),
                    total_cost: Set(summary.total_cost),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(txn)
                .await
            }
        }
        .map_err(ServiceError::db_error)?;

        debug!(item_id, loc_id, quantity = row.quantity, "inventory_sum refreshed");
        Ok(row)
    }
}

fn summarize(item_id: i32, loc_id: i32, lots: &[inventory::Model]) -> StockSummary {
    StockSummary {
        item_id,
        loc_id,
        quantity: lots.iter().map(|lot| i64::from(lot.quantity)).sum(),
        total_cost: costing::round_money(lots.iter().map(|lot| lot.total_cost).sum()),
        lot_count: lots.len(),
    }
}

async fn dimensionless_sum<C: ConnectionTrait>(
    db: &C,
    item_id: i32,
    loc_id: i32,
) -> Result<Option<inventory_sum::Model>, ServiceError> {
    InventorySum::find()
        .filter(inventory_sum::Column::ItemId.eq(item_id))
        .filter(inventory_sum::Column::LocId.eq(loc_id))
        .filter(inventory_sum::Column::MaintenanceContractId.is_null())
        .filter(inventory_sum::Column::OrgId.is_null())
        .filter(inventory_sum::Column::DeptId.is_null())
        .filter(inventory_sum::Column::Condition.is_null())
        .lock_exclusive()
        .one(db)
        .await
        .map_err(ServiceError::db_error)
}
