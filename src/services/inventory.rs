use crate::{
    db::{with_transaction, DbPool},
    dto::ledger::{
        require_lot, LedgerPosting, PostingOrder, ReceiptPosting, ReturnPosting, TransferLeg,
        TransferPosting, UsagePosting,
    },
    entities::{
        inventory::{self, Entity as Inventory},
        inventory_trx,
        orders::{self, Entity as Orders, OrderType},
        orders_receipt::{self, Entity as OrdersReceipt},
        orders_return::{self, Entity as OrdersReturn},
        orders_transfer::{self, Entity as OrdersTransfer},
        orders_usage::{self, Entity as OrdersUsage},
        return_inventory::{self, Entity as ReturnInventory},
        usage_inventory::{self, Entity as UsageInventory},
    },
    errors::ServiceError,
    events::{EventSender, LedgerEvent},
    services::costing::{self, Layer},
};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, SqlErr, TransactionTrait,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Posts orders to the inventory ledger.
///
/// The four ledger operations take the caller's open transaction and never
/// commit it. `post_order` is the self-contained entry point: it opens the
/// transaction, dispatches on order type, commits and publishes an event.
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
    event_sender: Option<EventSender>,
}

impl InventoryService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self {
            db_pool,
            event_sender: None,
        }
    }

    /// Publishes a `LedgerEvent` after each committed `post_order`.
    pub fn with_events(mut self, event_sender: EventSender) -> Self {
        self.event_sender = Some(event_sender);
        self
    }

    /// Loads an order, posts it inside a new transaction and commits.
    ///
    /// Any failure rolls back every write of the posting.
    #[instrument(skip(self))]
    pub async fn post_order(
        &self,
        order_id: i32,
        inv_id: Option<i32>,
    ) -> Result<LedgerPosting, ServiceError> {
        let db = self.db_pool.as_ref();

        let order = Orders::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;
        let order_type = PostingOrder::from_order(&order)?.order_type;

        let service = self.clone();
        let result = with_transaction(db, move |txn| {
            Box::pin(async move { service.apply(txn, &order, inv_id).await })
        })
        .await;

        match &result {
            Ok(posting) => {
                counter!(
                    "warehouse_ledger.postings.committed",
                    1,
                    "order_type" => order_type.as_str()
                );
                info!(
                    order_id,
                    order_type = %order_type,
                    trx_rows = posting.transactions().len(),
                    "Ledger posting committed"
                );
            }
            Err(e) => {
                counter!(
                    "warehouse_ledger.postings.failed",
                    1,
                    "order_type" => order_type.as_str(),
                    "reason" => e.code()
                );
                if e.status_code().is_client_error() {
                    warn!(
                        order_id,
                        order_type = %order_type,
                        error = %e,
                        "Ledger posting rejected"
                    );
                } else {
                    error!(
                        order_id,
                        order_type = %order_type,
                        error = %e,
                        "Ledger posting rolled back"
                    );
                }
            }
        }

        let posting = result?;
        self.publish(order_id, &posting).await;
        Ok(posting)
    }

    /// Dispatches one order to its ledger operation inside `txn`.
    pub async fn apply(
        &self,
        txn: &DatabaseTransaction,
        order: &orders::Model,
        inv_id: Option<i32>,
    ) -> Result<LedgerPosting, ServiceError> {
        let posting = PostingOrder::from_order(order)?;
        match posting.order_type {
            OrderType::Receipt => self.receipt(txn, order).await.map(LedgerPosting::Receipt),
            OrderType::Usage => self.usage(txn, order, inv_id).await.map(LedgerPosting::Usage),
            OrderType::Return => self
                .return_inventory(txn, order, inv_id)
                .await
                .map(LedgerPosting::Return),
            OrderType::Transfer => self.transfer(txn, order).await.map(LedgerPosting::Transfer),
        }
    }

    async fn publish(&self, order_id: i32, posting: &LedgerPosting) {
        let Some(sender) = &self.event_sender else {
            return;
        };
        let Some(event) = LedgerEvent::from_posting(order_id, posting) else {
            return;
        };
        // The posting is already committed; a lost notification is only logged.
        if let Err(e) = sender.send(event).await {
            warn!(order_id, code = e.code(), error = %e, "Failed to publish ledger event");
        }
    }

    /// Creates a new lot from a receipt order and records the inbound movement.
    ///
    /// Receipts never merge into existing lots, even at an identical cost.
    #[instrument(skip(self, txn, order), fields(order_id = order.id))]
    pub async fn receipt(
        &self,
        txn: &DatabaseTransaction,
        order: &orders::Model,
    ) -> Result<ReceiptPosting, ServiceError> {
        let posting = PostingOrder::for_type(order, OrderType::Receipt)?;

        let detail = OrdersReceipt::find()
            .filter(orders_receipt::Column::OrderId.eq(posting.order_id))
            .one(txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Receipt detail for order {} not found",
                    posting.order_id
                ))
            })?;

        let unit_cost = costing::round_money(detail.unit_cost_handled);
        if unit_cost.is_sign_negative() {
            return Err(ServiceError::ValidationError(format!(
                "Receipt for order {} has negative unit cost {}",
                posting.order_id, unit_cost
            )));
        }

        let lot = inventory::ActiveModel {
            item_id: Set(posting.item_id),
            loc_id: Set(posting.loc_id),
            receipt_id: Set(Some(detail.id)),
            unit_cost: Set(unit_cost),
            quantity: Set(posting.quantity),
            total_cost: Set(costing::line_total(posting.quantity, unit_cost)),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(txn)
        .await
        .map_err(ServiceError::db_error)?;

        let transaction = append_trx(txn, &lot, &posting, posting.quantity).await?;

        info!(
            lot_id = lot.id,
            quantity = posting.quantity,
            unit_cost = %lot.unit_cost,
            "Receipt lot created"
        );

        Ok(ReceiptPosting { lot, transaction })
    }

    /// Draws stock from the operator-selected lot.
    #[instrument(skip(self, txn, order), fields(order_id = order.id))]
    pub async fn usage(
        &self,
        txn: &DatabaseTransaction,
        order: &orders::Model,
        inv_id: Option<i32>,
    ) -> Result<UsagePosting, ServiceError> {
        let posting = PostingOrder::for_type(order, OrderType::Usage)?;
        let inv_id = require_lot(OrderType::Usage, inv_id)?;

        let detail = OrdersUsage::find()
            .filter(orders_usage::Column::OrderId.eq(posting.order_id))
            .one(txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Usage detail for order {} not found",
                    posting.order_id
                ))
            })?;

        let lot = lock_lot(txn, inv_id).await?;
        ensure_same_item(&lot, &posting)?;

        let remaining = costing::remove_quantity(lot.quantity, posting.quantity).ok_or_else(|| {
            ServiceError::InsufficientStock(format!(
                "Lot {} holds {}, usage requested {}",
                lot.id, lot.quantity, posting.quantity
            ))
        })?;
        let lot = set_lot_quantity(txn, lot, remaining).await?;

        let usage_link = usage_inventory::ActiveModel {
            usage_id: Set(detail.id),
            inv_id: Set(lot.id),
            usage_qty: Set(Some(posting.quantity)),
            ..Default::default()
        }
        .insert(txn)
        .await
        .map_err(ServiceError::db_error)?;

        let transaction = append_trx(txn, &lot, &posting, -posting.quantity).await?;

        info!(
            lot_id = lot.id,
            quantity = posting.quantity,
            remaining = lot.quantity,
            "Usage drawn from lot"
        );

        Ok(UsagePosting {
            lot,
            usage_link,
            transaction,
        })
    }

    /// Puts previously used stock back into the lot it came from.
    ///
    /// The total returned against one usage link never exceeds what that
    /// link recorded as used.
    #[instrument(skip(self, txn, order), fields(order_id = order.id))]
    pub async fn return_inventory(
        &self,
        txn: &DatabaseTransaction,
        order: &orders::Model,
        inv_id: Option<i32>,
    ) -> Result<ReturnPosting, ServiceError> {
        let posting = PostingOrder::for_type(order, OrderType::Return)?;
        let inv_id = require_lot(OrderType::Return, inv_id)?;

        let detail = OrdersReturn::find()
            .filter(orders_return::Column::OrderId.eq(posting.order_id))
            .one(txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Return detail for order {} not found",
                    posting.order_id
                ))
            })?;

        let usage = OrdersUsage::find_by_id(detail.usage_id)
            .one(txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Usage {} not found", detail.usage_id))
            })?;

        let link = UsageInventory::find()
            .filter(usage_inventory::Column::UsageId.eq(usage.id))
            .filter(usage_inventory::Column::InvId.eq(inv_id))
            .one(txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Usage {} did not draw from lot {}",
                    usage.id, inv_id
                ))
            })?;

        let used = link.usage_qty.ok_or_else(|| {
            ServiceError::ValidationError(format!(
                "Usage link {} has no recorded quantity",
                link.id
            ))
        })?;

        // Locking the lot first serializes concurrent returns against the same link.
        let lot = lock_lot(txn, inv_id).await?;

        let already_returned = returned_quantity(txn, link.id).await?;
        let returnable = i64::from(used) - already_returned;
        if i64::from(posting.quantity) > returnable {
            return Err(ServiceError::OverReturn(format!(
                "Usage link {} has {} returnable, return requested {}",
                link.id,
                returnable.max(0),
                posting.quantity
            )));
        }

        let restored = costing::add_quantity(lot.quantity, posting.quantity).ok_or_else(|| {
            ServiceError::ValidationError(format!("Lot {} quantity would overflow", lot.id))
        })?;
        let lot = set_lot_quantity(txn, lot, restored).await?;

        let return_record = return_inventory::ActiveModel {
            return_id: Set(detail.id),
            usage_inventory_id: Set(link.id),
            inv_id: Set(lot.id),
            return_qty: Set(posting.quantity),
            ..Default::default()
        }
        .insert(txn)
        .await
        .map_err(ServiceError::db_error)?;

        let transaction = append_trx(txn, &lot, &posting, posting.quantity).await?;
        let remaining_returnable = (returnable - i64::from(posting.quantity)) as i32;

        info!(
            lot_id = lot.id,
            quantity = posting.quantity,
            remaining_returnable,
            "Return restored to lot"
        );

        Ok(ReturnPosting {
            lot,
            return_record,
            transaction,
            remaining_returnable,
        })
    }

    /// Moves stock between locations, consuming source lots oldest first.
    ///
    /// Each consumed source lot yields an outbound and an inbound ledger row.
    /// Stock arriving at the destination merges into the oldest active lot of
    /// the same item and unit cost there, creating a lot when none matches.
    #[instrument(skip(self, txn, order), fields(order_id = order.id))]
    pub async fn transfer(
        &self,
        txn: &DatabaseTransaction,
        order: &orders::Model,
    ) -> Result<TransferPosting, ServiceError> {
        let posting = PostingOrder::for_type(order, OrderType::Transfer)?;

        let detail = OrdersTransfer::find()
            .filter(orders_transfer::Column::OrderId.eq(posting.order_id))
            .one(txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Transfer detail for order {} not found",
                    posting.order_id
                ))
            })?;

        let from_loc_id = detail.from_loc_id;
        let to_loc_id = posting.loc_id;
        if from_loc_id == to_loc_id {
            return Err(ServiceError::ValidationError(format!(
                "Transfer order {} moves stock from location {} to itself",
                posting.order_id, from_loc_id
            )));
        }

        let sources = Inventory::find()
            .filter(inventory::Column::ItemId.eq(posting.item_id))
            .filter(inventory::Column::LocId.eq(from_loc_id))
            .filter(inventory::Column::IsActive.eq(true))
            .order_by_asc(inventory::Column::CreatedAt)
            .order_by_asc(inventory::Column::Id)
            .lock_exclusive()
            .all(txn)
            .await
            .map_err(ServiceError::db_error)?;

        if sources.is_empty() {
            return Err(ServiceError::NotFound(format!(
                "No inventory for item {} at location {}",
                posting.item_id, from_loc_id
            )));
        }

        let layers: Vec<Layer> = sources
            .iter()
            .map(|lot| Layer {
                lot_id: lot.id,
                available: lot.quantity,
            })
            .collect();
        let draws = costing::plan_fifo(&layers, posting.quantity).map_err(|shortfall| {
            ServiceError::InsufficientStock(format!(
                "Item {} at location {} has {} on hand, transfer requested {}",
                posting.item_id, from_loc_id, shortfall.available, shortfall.requested
            ))
        })?;

        let mut sources: HashMap<i32, inventory::Model> =
            sources.into_iter().map(|lot| (lot.id, lot)).collect();
        let mut legs = Vec::with_capacity(draws.len());

        for draw in draws {
            let source = sources.remove(&draw.lot_id).ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "FIFO plan referenced unlocked lot {}",
                    draw.lot_id
                ))
            })?;
            let remaining = costing::remove_quantity(source.quantity, draw.quantity)
                .ok_or_else(|| {
                    ServiceError::InsufficientStock(format!(
                        "Lot {} holds {}, transfer leg requested {}",
                        source.id, source.quantity, draw.quantity
                    ))
                })?;
            let source = set_lot_quantity(txn, source, remaining).await?;
            let outbound = append_trx(txn, &source, &posting, -draw.quantity).await?;

            let (destination, merged) =
                credit_destination(txn, posting.item_id, to_loc_id, source.unit_cost, draw.quantity)
                    .await?;
            let inbound = append_trx(txn, &destination, &posting, draw.quantity).await?;

            debug!(
                source_lot = source.id,
                destination_lot = destination.id,
                quantity = draw.quantity,
                merged,
                "Transfer leg posted"
            );

            legs.push(TransferLeg {
                source,
                destination,
                quantity: draw.quantity,
                outbound,
                inbound,
                merged,
            });
        }

        info!(
            item_id = posting.item_id,
            from_loc_id,
            to_loc_id,
            quantity = posting.quantity,
            legs = legs.len(),
            "Transfer posted"
        );

        Ok(TransferPosting {
            from_loc_id,
            to_loc_id,
            legs,
        })
    }
}

/// Reads a lot by id holding a row lock until the transaction ends.
async fn lock_lot(
    txn: &DatabaseTransaction,
    inv_id: i32,
) -> Result<inventory::Model, ServiceError> {
    Inventory::find_by_id(inv_id)
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("Inventory lot {} not found", inv_id)))
}

fn ensure_same_item(lot: &inventory::Model, posting: &PostingOrder) -> Result<(), ServiceError> {
    if lot.item_id != posting.item_id {
        return Err(ServiceError::ValidationError(format!(
            "Lot {} holds item {}, order {} is for item {}",
            lot.id, lot.item_id, posting.order_id, posting.item_id
        )));
    }
    Ok(())
}

/// Writes a new quantity; `total_cost` is recomputed on save.
async fn set_lot_quantity(
    txn: &DatabaseTransaction,
    lot: inventory::Model,
    quantity: i32,
) -> Result<inventory::Model, ServiceError> {
    let mut active: inventory::ActiveModel = lot.into();
    active.quantity = Set(quantity);
    active.update(txn).await.map_err(ServiceError::db_error)
}

async fn append_trx(
    txn: &DatabaseTransaction,
    lot: &inventory::Model,
    posting: &PostingOrder,
    qty: i32,
) -> Result<inventory_trx::Model, ServiceError> {
    inventory_trx::ActiveModel {
        inv_id: Set(lot.id),
        order_id: Set(posting.order_id),
        order_type: Set(posting.order_type.as_str().to_string()),
        item_id: Set(lot.item_id),
        loc_id: Set(lot.loc_id),
        qty: Set(qty),
        unit_cost: Set(lot.unit_cost),
        total_cost: Set(costing::line_total(qty, lot.unit_cost)),
        ..Default::default()
    }
    .insert(txn)
    .await
    .map_err(ServiceError::db_error)
}

async fn returned_quantity(
    txn: &DatabaseTransaction,
    usage_inventory_id: i32,
) -> Result<i64, ServiceError> {
    let returns = ReturnInventory::find()
        .filter(return_inventory::Column::UsageInventoryId.eq(usage_inventory_id))
        .all(txn)
        .await
        .map_err(ServiceError::db_error)?;
    Ok(returns.iter().map(|r| i64::from(r.return_qty)).sum())
}

/// The oldest active lot for (item, location, cost), locked. Receipt lots
/// qualify as well as transfer-created ones.
async fn find_merge_target(
    txn: &DatabaseTransaction,
    item_id: i32,
    loc_id: i32,
    unit_cost: Decimal,
) -> Result<Option<inventory::Model>, ServiceError> {
    Inventory::find()
        .filter(inventory::Column::ItemId.eq(item_id))
        .filter(inventory::Column::LocId.eq(loc_id))
        .filter(inventory::Column::UnitCost.eq(unit_cost))
        .filter(inventory::Column::IsActive.eq(true))
        .order_by_asc(inventory::Column::CreatedAt)
        .order_by_asc(inventory::Column::Id)
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(ServiceError::db_error)
}

async fn increment_lot(
    txn: &DatabaseTransaction,
    lot: inventory::Model,
    quantity: i32,
) -> Result<inventory::Model, ServiceError> {
    let total = costing::add_quantity(lot.quantity, quantity).ok_or_else(|| {
        ServiceError::ValidationError(format!("Lot {} quantity would overflow", lot.id))
    })?;
    set_lot_quantity(txn, lot, total).await
}

/// Adds transferred stock at the destination. Returns the lot and whether it
/// already existed.
///
/// A new transfer lot is only created when no lot matches. That insert runs
/// in a savepoint. If a concurrent transfer created the same lot first, the
/// unique index rejects ours, the savepoint is rolled back and the quantity
/// goes into the winner's lot instead.
async fn credit_destination(
    txn: &DatabaseTransaction,
    item_id: i32,
    loc_id: i32,
    unit_cost: Decimal,
    quantity: i32,
) -> Result<(inventory::Model, bool), ServiceError> {
    if let Some(existing) = find_merge_target(txn, item_id, loc_id, unit_cost).await? {
        return Ok((increment_lot(txn, existing, quantity).await?, true));
    }

    let savepoint = txn.begin().await.map_err(ServiceError::db_error)?;
    let inserted = inventory::ActiveModel {
        item_id: Set(item_id),
        loc_id: Set(loc_id),
        receipt_id: Set(None),
        unit_cost: Set(unit_cost),
        quantity: Set(quantity),
        total_cost: Set(costing::line_total(quantity, unit_cost)),
        is_active: Set(true),
        ..Default::default()
    }
    .insert(&savepoint)
    .await;

    match inserted {
        Ok(lot) => {
            savepoint.commit().await.map_err(ServiceError::db_error)?;
            Ok((lot, false))
        }
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            savepoint.rollback().await.map_err(ServiceError::db_error)?;
            warn!(
                item_id,
                loc_id,
                unit_cost = %unit_cost,
                "Destination lot created concurrently; merging into it"
            );
            let winner = find_merge_target(txn, item_id, loc_id, unit_cost)
                .await?
                .ok_or_else(|| {
                    ServiceError::InternalError(format!(
                        "Destination lot for item {} at location {} vanished after a \
                         unique violation",
                        item_id, loc_id
                    ))
                })?;
            Ok((increment_lot(txn, winner, quantity).await?, true))
        }
        Err(err) => {
            savepoint.rollback().await.map_err(ServiceError::db_error)?;
            Err(ServiceError::db_error(err))
        }
    }
}
