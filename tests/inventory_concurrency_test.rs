mod common;

use assert_matches::assert_matches;
use common::TestLedger;
use futures::future::join_all;
use rust_decimal_macros::dec;
use warehouse_ledger::errors::ServiceError;

// The test pool holds one SQLite connection, so concurrent postings queue on
// it; against Postgres the row lock on the lot gives the same outcome.
#[tokio::test]
async fn concurrent_usages_cannot_overdraw_a_lot() {
    let mut ledger = TestLedger::new().await;
    let item = ledger.item().await;
    let loc = ledger.location().await;
    let lot = ledger.receive(item.id, loc.id, 15, dec!(2.00)).await;

    let (first, _) = ledger.usage_order(item.id, loc.id, 10).await;
    let (second, _) = ledger.usage_order(item.id, loc.id, 10).await;

    let tasks: Vec<_> = [first.id, second.id]
        .into_iter()
        .map(|order_id| {
            let svc = ledger.inventory.clone();
            let lot_id = lot.id;
            tokio::spawn(async move { svc.post_order(order_id, Some(lot_id)).await })
        })
        .collect();

    let mut successes = 0;
    let mut shortfalls = 0;
    for task in tasks {
        match task.await.expect("task panicked") {
            Ok(_) => successes += 1,
            Err(ServiceError::InsufficientStock(_)) => shortfalls += 1,
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    assert_eq!((successes, shortfalls), (1, 1));
    assert_eq!(ledger.lot(lot.id).await.quantity, 5);
    assert!(ledger.queries.reconcile_item(item.id).await.unwrap().is_balanced());
}

#[tokio::test]
async fn concurrent_transfers_share_one_destination_lot() {
    let mut ledger = TestLedger::new().await;
    let item = ledger.item().await;
    let a = ledger.location().await;
    let b = ledger.location().await;
    ledger.receive(item.id, a.id, 100, dec!(4.00)).await;

    let mut order_ids = Vec::new();
    for _ in 0..8 {
        order_ids.push(ledger.transfer_order(item.id, a.id, b.id, 5).await.id);
    }

    let tasks: Vec<_> = order_ids
        .into_iter()
        .map(|order_id| {
            let svc = ledger.inventory.clone();
            tokio::spawn(async move { svc.post_order(order_id, None).await })
        })
        .collect();
    for outcome in join_all(tasks).await {
        outcome.expect("task panicked").expect("transfer posts");
    }

    let arrived = ledger.queries.lots(item.id, b.id).await.unwrap();
    assert_eq!(arrived.len(), 1);
    assert_eq!(arrived[0].quantity, 40);
    assert_eq!(arrived[0].total_cost, dec!(160.00));

    let remaining = ledger.queries.stock_summary(item.id, a.id).await.unwrap();
    assert_eq!(remaining.quantity, 60);
}

#[tokio::test]
async fn concurrent_returns_respect_returnable_quantity() {
    let mut ledger = TestLedger::new().await;
    let item = ledger.item().await;
    let loc = ledger.location().await;
    let lot = ledger.receive(item.id, loc.id, 20, dec!(1.00)).await;
    let usage = ledger.use_from(item.id, loc.id, lot.id, 10).await;

    let mut order_ids = Vec::new();
    for _ in 0..3 {
        order_ids.push(ledger.return_order(item.id, loc.id, 4, usage.id).await.id);
    }

    let tasks: Vec<_> = order_ids
        .into_iter()
        .map(|order_id| {
            let svc = ledger.inventory.clone();
            let lot_id = lot.id;
            tokio::spawn(async move { svc.post_order(order_id, Some(lot_id)).await })
        })
        .collect();

    let mut over_returns = 0;
    for task in tasks {
        if let Err(e) = task.await.expect("task panicked") {
            assert_matches!(e, ServiceError::OverReturn(_));
            over_returns += 1;
        }
    }

    assert_eq!(over_returns, 1);
    assert_eq!(ledger.lot(lot.id).await.quantity, 18);
    assert_eq!(
        ledger.queries.returnable_quantity(usage.id, lot.id).await.unwrap(),
        2
    );
}
