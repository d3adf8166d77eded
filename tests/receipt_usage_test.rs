mod common;

use assert_matches::assert_matches;
use common::TestLedger;
use rust_decimal_macros::dec;
use warehouse_ledger::{
    dto::LedgerPosting,
    entities::orders::OrderType,
    errors::ServiceError,
    events::{self, LedgerEvent},
    services::InventoryService,
};

#[tokio::test]
async fn receipt_creates_lot_and_inbound_row() {
    let mut ledger = TestLedger::new().await;
    let item = ledger.item().await;
    let loc = ledger.location().await;

    let order = ledger.receipt_order(item.id, loc.id, 100, dec!(5.00)).await;
    let posting = ledger
        .inventory
        .post_order(order.id, None)
        .await
        .expect("receipt posts");

    let receipt = assert_matches!(posting, LedgerPosting::Receipt(p) => p);
    assert_eq!(receipt.lot.quantity, 100);
    assert_eq!(receipt.lot.unit_cost, dec!(5.00));
    assert_eq!(receipt.lot.total_cost, dec!(500.00));
    assert!(receipt.lot.receipt_id.is_some());
    assert!(receipt.lot.is_active);

    assert_eq!(receipt.transaction.inv_id, receipt.lot.id);
    assert_eq!(receipt.transaction.order_id, order.id);
    assert_eq!(receipt.transaction.order_type, "RECEIPT");
    assert_eq!(receipt.transaction.qty, 100);
    assert_eq!(receipt.transaction.total_cost, dec!(500.00));

    let events = ledger.drain_events();
    assert_eq!(events.len(), 1);
    assert_matches!(
        &events[0],
        LedgerEvent::Received { quantity: 100, lot_id, .. } if *lot_id == receipt.lot.id
    );
}

#[tokio::test]
async fn receipts_at_the_same_cost_stay_separate_lots() {
    let mut ledger = TestLedger::new().await;
    let item = ledger.item().await;
    let loc = ledger.location().await;

    let first = ledger.receive(item.id, loc.id, 10, dec!(4.00)).await;
    let second = ledger.receive(item.id, loc.id, 15, dec!(4.00)).await;

    assert_ne!(first.id, second.id);
    let lots = ledger.queries.lots(item.id, loc.id).await.unwrap();
    assert_eq!(lots.len(), 2);
    assert_eq!(lots[0].id, first.id);

    let summary = ledger.queries.stock_summary(item.id, loc.id).await.unwrap();
    assert_eq!(summary.quantity, 25);
    assert_eq!(summary.total_cost, dec!(100.00));
    assert_eq!(summary.lot_count, 2);
}

#[tokio::test]
async fn receipt_rounds_unit_cost_to_cents() {
    let mut ledger = TestLedger::new().await;
    let item = ledger.item().await;
    let loc = ledger.location().await;

    let lot = ledger.receive(item.id, loc.id, 3, dec!(2.125)).await;
    assert_eq!(lot.unit_cost, dec!(2.13));
    assert_eq!(lot.total_cost, dec!(6.39));
}

#[tokio::test]
async fn receipt_without_detail_is_not_found() {
    let mut ledger = TestLedger::new().await;
    let item = ledger.item().await;
    let loc = ledger.location().await;

    let order = ledger
        .order(OrderType::Receipt, item.id, loc.id, Some(5))
        .await;
    let result = ledger.inventory.post_order(order.id, None).await;

    assert_matches!(result, Err(ServiceError::NotFound(_)));
    assert_eq!(ledger.lot_count().await, 0);
    assert_eq!(ledger.trx_count().await, 0);
    assert!(ledger.drain_events().is_empty());
}

#[tokio::test]
async fn receipt_rejects_non_positive_quantity() {
    let mut ledger = TestLedger::new().await;
    let item = ledger.item().await;
    let loc = ledger.location().await;

    let order = ledger.receipt_order(item.id, loc.id, 0, dec!(1.00)).await;
    let result = ledger.inventory.post_order(order.id, None).await;

    assert_matches!(result, Err(ServiceError::ValidationError(_)));
    assert_eq!(ledger.lot_count().await, 0);
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let ledger = TestLedger::new().await;
    assert_matches!(
        ledger.inventory.post_order(404, None).await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn usage_draws_from_selected_lot() {
    let mut ledger = TestLedger::new().await;
    let item = ledger.item().await;
    let loc = ledger.location().await;
    let lot = ledger.receive(item.id, loc.id, 100, dec!(5.00)).await;

    let (order, detail) = ledger.usage_order(item.id, loc.id, 30).await;
    let posting = ledger
        .inventory
        .post_order(order.id, Some(lot.id))
        .await
        .expect("usage posts");

    let usage = assert_matches!(posting, LedgerPosting::Usage(p) => p);
    assert_eq!(usage.lot.quantity, 70);
    assert_eq!(usage.lot.total_cost, dec!(350.00));
    assert_eq!(usage.usage_link.usage_id, detail.id);
    assert_eq!(usage.usage_link.inv_id, lot.id);
    assert_eq!(usage.usage_link.usage_qty, Some(30));
    assert_eq!(usage.transaction.qty, -30);
    assert_eq!(usage.transaction.total_cost, dec!(-150.00));
    assert_eq!(usage.transaction.order_type, "USAGE");

    let stored = ledger.lot(lot.id).await;
    assert_eq!(stored.quantity, 70);
    assert!(stored.is_consistent());
}

#[tokio::test]
async fn usage_can_empty_a_lot() {
    let mut ledger = TestLedger::new().await;
    let item = ledger.item().await;
    let loc = ledger.location().await;
    let lot = ledger.receive(item.id, loc.id, 8, dec!(1.25)).await;

    ledger.use_from(item.id, loc.id, lot.id, 8).await;

    let stored = ledger.lot(lot.id).await;
    assert_eq!(stored.quantity, 0);
    assert_eq!(stored.total_cost, dec!(0.00));
}

#[tokio::test]
async fn usage_beyond_lot_quantity_rolls_back() {
    let mut ledger = TestLedger::new().await;
    let item = ledger.item().await;
    let loc = ledger.location().await;
    let lot = ledger.receive(item.id, loc.id, 10, dec!(5.00)).await;
    let trx_before = ledger.trx_count().await;
    ledger.drain_events();

    let (order, _) = ledger.usage_order(item.id, loc.id, 11).await;
    let result = ledger.inventory.post_order(order.id, Some(lot.id)).await;

    assert_matches!(result, Err(ServiceError::InsufficientStock(_)));
    assert_eq!(ledger.lot(lot.id).await.quantity, 10);
    assert_eq!(ledger.trx_count().await, trx_before);
    assert!(ledger.drain_events().is_empty());
}

#[tokio::test]
async fn usage_requires_a_lot() {
    let mut ledger = TestLedger::new().await;
    let item = ledger.item().await;
    let loc = ledger.location().await;
    ledger.receive(item.id, loc.id, 10, dec!(5.00)).await;

    let (order, _) = ledger.usage_order(item.id, loc.id, 1).await;
    assert_matches!(
        ledger.inventory.post_order(order.id, None).await,
        Err(ServiceError::ValidationError(_))
    );
    assert_matches!(
        ledger.inventory.post_order(order.id, Some(9_999)).await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn usage_rejects_lot_of_another_item() {
    let mut ledger = TestLedger::new().await;
    let bolts = ledger.item().await;
    let nuts = ledger.item().await;
    let loc = ledger.location().await;
    let nut_lot = ledger.receive(nuts.id, loc.id, 10, dec!(0.10)).await;

    let (order, _) = ledger.usage_order(bolts.id, loc.id, 1).await;
    assert_matches!(
        ledger.inventory.post_order(order.id, Some(nut_lot.id)).await,
        Err(ServiceError::ValidationError(_))
    );
    assert_eq!(ledger.lot(nut_lot.id).await.quantity, 10);
}

#[tokio::test]
async fn ledger_operation_rejects_order_of_other_type() {
    let mut ledger = TestLedger::new().await;
    let item = ledger.item().await;
    let loc = ledger.location().await;
    let order = ledger.receipt_order(item.id, loc.id, 5, dec!(1.00)).await;

    let inventory = ledger.inventory.clone();
    let result = warehouse_ledger::db::with_transaction(ledger.db.as_ref(), move |txn| {
        Box::pin(async move { inventory.usage(txn, &order, Some(1)).await })
    })
    .await;

    assert_matches!(result, Err(ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn posting_commits_even_if_event_channel_is_closed() {
    let mut ledger = TestLedger::new().await;
    let item = ledger.item().await;
    let loc = ledger.location().await;

    let (sender, rx) = events::channel(1);
    drop(rx);
    let service = InventoryService::new(ledger.db.clone()).with_events(sender);

    let order = ledger.receipt_order(item.id, loc.id, 3, dec!(1.00)).await;
    assert_matches!(
        service.post_order(order.id, None).await,
        Ok(LedgerPosting::Receipt(_))
    );
    assert_eq!(ledger.lot_count().await, 1);
    assert_eq!(ledger.trx_count().await, 1);
}

#[tokio::test]
async fn usage_link_records_drawn_quantity() {
    let mut ledger = TestLedger::new().await;
    let item = ledger.item().await;
    let loc = ledger.location().await;
    let lot = ledger.receive(item.id, loc.id, 12, dec!(3.00)).await;
    let (order, detail) = ledger.usage_order(item.id, loc.id, 5).await;

    let posting = ledger
        .inventory
        .post_order(order.id, Some(lot.id))
        .await
        .expect("usage posts");
    let usage = assert_matches!(posting, LedgerPosting::Usage(p) => p);

    assert_eq!(usage.usage_link.usage_id, detail.id);
    assert_eq!(usage.usage_link.inv_id, lot.id);
    assert_eq!(usage.usage_link.usage_qty, Some(5));
    assert!(usage.usage_link.created_at >= lot.created_at);
}
