mod common;

use assert_matches::assert_matches;
use common::TestLedger;
use rust_decimal_macros::dec;
use warehouse_ledger::{dto::LedgerPosting, errors::ServiceError};

#[tokio::test]
async fn return_restores_the_lot_it_came_from() {
    let mut ledger = TestLedger::new().await;
    let item = ledger.item().await;
    let loc = ledger.location().await;
    let lot = ledger.receive(item.id, loc.id, 20, dec!(3.50)).await;
    let usage = ledger.use_from(item.id, loc.id, lot.id, 10).await;

    let order = ledger.return_order(item.id, loc.id, 4, usage.id).await;
    let posting = ledger
        .inventory
        .post_order(order.id, Some(lot.id))
        .await
        .expect("return posts");

    let returned = assert_matches!(posting, LedgerPosting::Return(p) => p);
    assert_eq!(returned.lot.id, lot.id);
    assert_eq!(returned.lot.quantity, 14);
    assert_eq!(returned.lot.total_cost, dec!(49.00));
    assert_eq!(returned.return_record.return_qty, 4);
    assert_eq!(returned.return_record.inv_id, lot.id);
    assert!(returned.return_record.created_at >= lot.created_at);
    assert_eq!(returned.transaction.qty, 4);
    assert_eq!(returned.transaction.order_type, "RETURN");
    assert_eq!(returned.remaining_returnable, 6);

    assert_eq!(
        ledger.queries.returnable_quantity(usage.id, lot.id).await.unwrap(),
        6
    );
}

#[tokio::test]
async fn cumulative_returns_stop_at_used_quantity() {
    let mut ledger = TestLedger::new().await;
    let item = ledger.item().await;
    let loc = ledger.location().await;
    let lot = ledger.receive(item.id, loc.id, 50, dec!(1.00)).await;
    let usage = ledger.use_from(item.id, loc.id, lot.id, 10).await;

    let first = ledger.return_order(item.id, loc.id, 6, usage.id).await;
    ledger
        .inventory
        .post_order(first.id, Some(lot.id))
        .await
        .expect("first return fits");

    let too_many = ledger.return_order(item.id, loc.id, 5, usage.id).await;
    assert_matches!(
        ledger.inventory.post_order(too_many.id, Some(lot.id)).await,
        Err(ServiceError::OverReturn(_))
    );
    assert_eq!(ledger.lot(lot.id).await.quantity, 46);

    let exact = ledger.return_order(item.id, loc.id, 4, usage.id).await;
    ledger
        .inventory
        .post_order(exact.id, Some(lot.id))
        .await
        .expect("remaining four fit");
    assert_eq!(ledger.lot(lot.id).await.quantity, 50);

    let one_more = ledger.return_order(item.id, loc.id, 1, usage.id).await;
    assert_matches!(
        ledger.inventory.post_order(one_more.id, Some(lot.id)).await,
        Err(ServiceError::OverReturn(_))
    );
    assert_eq!(
        ledger.queries.returnable_quantity(usage.id, lot.id).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn return_to_a_lot_the_usage_never_touched_is_not_found() {
    let mut ledger = TestLedger::new().await;
    let item = ledger.item().await;
    let loc = ledger.location().await;
    let used_lot = ledger.receive(item.id, loc.id, 10, dec!(2.00)).await;
    let other_lot = ledger.receive(item.id, loc.id, 10, dec!(2.00)).await;
    let usage = ledger.use_from(item.id, loc.id, used_lot.id, 5).await;

    let order = ledger.return_order(item.id, loc.id, 1, usage.id).await;
    assert_matches!(
        ledger.inventory.post_order(order.id, Some(other_lot.id)).await,
        Err(ServiceError::NotFound(_))
    );
    assert_eq!(ledger.lot(other_lot.id).await.quantity, 10);
}

#[tokio::test]
async fn return_requires_lot_and_detail() {
    let mut ledger = TestLedger::new().await;
    let item = ledger.item().await;
    let loc = ledger.location().await;
    let lot = ledger.receive(item.id, loc.id, 10, dec!(2.00)).await;
    let usage = ledger.use_from(item.id, loc.id, lot.id, 5).await;

    let order = ledger.return_order(item.id, loc.id, 1, usage.id).await;
    assert_matches!(
        ledger.inventory.post_order(order.id, None).await,
        Err(ServiceError::ValidationError(_))
    );

    let bare = ledger
        .order(
            warehouse_ledger::entities::orders::OrderType::Return,
            item.id,
            loc.id,
            Some(1),
        )
        .await;
    assert_matches!(
        ledger.inventory.post_order(bare.id, Some(lot.id)).await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn failed_return_leaves_ledger_untouched() {
    let mut ledger = TestLedger::new().await;
    let item = ledger.item().await;
    let loc = ledger.location().await;
    let lot = ledger.receive(item.id, loc.id, 10, dec!(2.00)).await;
    let usage = ledger.use_from(item.id, loc.id, lot.id, 3).await;
    let trx_before = ledger.trx_count().await;

    let order = ledger.return_order(item.id, loc.id, 4, usage.id).await;
    assert_matches!(
        ledger.inventory.post_order(order.id, Some(lot.id)).await,
        Err(ServiceError::OverReturn(_))
    );

    assert_eq!(ledger.trx_count().await, trx_before);
    assert!(ledger
        .queries
        .transactions_for_order(order.id)
        .await
        .unwrap()
        .is_empty());
}
