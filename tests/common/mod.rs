#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};
use tokio::sync::mpsc;
use warehouse_ledger::{
    config::AppConfig,
    db::{self, DbPool},
    dto::LedgerPosting,
    entities::{
        counter, inventory, inventory_trx, location,
        orders::{self, OrderType},
        orders_receipt, orders_return, orders_transfer, orders_usage, stock_item,
    },
    events::{self, LedgerEvent},
    services::{CounterService, InventoryQueryService, InventoryService},
};

/// Ledger services over a freshly migrated in-memory SQLite database.
pub struct TestLedger {
    pub db: Arc<DbPool>,
    pub inventory: InventoryService,
    pub queries: InventoryQueryService,
    pub counters: CounterService,
    events: mpsc::Receiver<LedgerEvent>,
    next_code: u32,
}

impl TestLedger {
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new("sqlite::memory:".to_string(), "test".to_string());
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations");

        let db = Arc::new(pool);
        let (sender, rx) = events::channel(cfg.event_channel_capacity);

        Self {
            inventory: InventoryService::new(db.clone()).with_events(sender),
            queries: InventoryQueryService::new(db.clone()),
            counters: CounterService::new(db.clone()),
            db,
            events: rx,
            next_code: 0,
        }
    }

    fn code(&mut self, prefix: &str) -> String {
        self.next_code += 1;
        format!("{}-{:04}", prefix, self.next_code)
    }

    pub async fn item(&mut self) -> stock_item::Model {
        let code = self.code("ITEM");
        stock_item::ActiveModel {
            item_code: Set(code.clone()),
            name: Set(format!("Stock item {}", code)),
            uom: Set(Some("EA".into())),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .expect("insert stock item")
    }

    pub async fn location(&mut self) -> location::Model {
        let code = self.code("LOC");
        location::ActiveModel {
            loc_code: Set(code.clone()),
            name: Set(format!("Location {}", code)),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .expect("insert location")
    }

    pub async fn counter(&mut self, loc_id: i32) -> counter::Model {
        let code = self.code("CNT");
        counter::ActiveModel {
            counter_code: Set(code),
            loc_id: Set(loc_id),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .expect("insert counter")
    }

    /// Bare order header; detail rows are added by the typed helpers below.
    pub async fn order(
        &mut self,
        order_type: OrderType,
        item_id: i32,
        loc_id: i32,
        qty: Option<i32>,
    ) -> orders::Model {
        let order_no = self.code(order_type.as_str());
        let now = Utc::now();
        orders::ActiveModel {
            order_no: Set(order_no),
            order_type: Set(order_type.as_str().to_string()),
            item_id: Set(Some(item_id)),
            loc_id: Set(Some(loc_id)),
            actual_qty: Set(qty),
            status: Set("OPEN".into()),
            created_by: Set(Some("tester".into())),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .expect("insert order")
    }

    pub async fn receipt_order(
        &mut self,
        item_id: i32,
        loc_id: i32,
        qty: i32,
        unit_cost: Decimal,
    ) -> orders::Model {
        let order = self.order(OrderType::Receipt, item_id, loc_id, Some(qty)).await;
        orders_receipt::ActiveModel {
            order_id: Set(order.id),
            unit_cost_handled: Set(unit_cost),
            supplier_name: Set(Some("Acme Supply".into())),
            po_no: Set(Some(format!("PO-{}", order.id))),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .expect("insert receipt detail");
        order
    }

    pub async fn usage_order(
        &mut self,
        item_id: i32,
        loc_id: i32,
        qty: i32,
    ) -> (orders::Model, orders_usage::Model) {
        let order = self.order(OrderType::Usage, item_id, loc_id, Some(qty)).await;
        let detail = orders_usage::ActiveModel {
            order_id: Set(order.id),
            requester: Set(Some("line 3".into())),
            purpose: Set(Some("maintenance".into())),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .expect("insert usage detail");
        (order, detail)
    }

    pub async fn return_order(
        &mut self,
        item_id: i32,
        loc_id: i32,
        qty: i32,
        usage_id: i32,
    ) -> orders::Model {
        let order = self.order(OrderType::Return, item_id, loc_id, Some(qty)).await;
        orders_return::ActiveModel {
            order_id: Set(order.id),
            usage_id: Set(usage_id),
            reason: Set(Some("unused".into())),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .expect("insert return detail");
        order
    }

    pub async fn transfer_order(
        &mut self,
        item_id: i32,
        from_loc_id: i32,
        to_loc_id: i32,
        qty: i32,
    ) -> orders::Model {
        let order = self
            .order(OrderType::Transfer, item_id, to_loc_id, Some(qty))
            .await;
        orders_transfer::ActiveModel {
            order_id: Set(order.id),
            from_loc_id: Set(from_loc_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .expect("insert transfer detail");
        order
    }

    /// Posts a receipt and returns the lot it created.
    pub async fn receive(
        &mut self,
        item_id: i32,
        loc_id: i32,
        qty: i32,
        unit_cost: Decimal,
    ) -> inventory::Model {
        let order = self.receipt_order(item_id, loc_id, qty, unit_cost).await;
        match self.inventory.post_order(order.id, None).await {
            Ok(LedgerPosting::Receipt(posting)) => posting.lot,
            other => panic!("receipt posting failed: {:?}", other),
        }
    }

    /// Posts a usage against a lot and returns the usage detail row.
    pub async fn use_from(
        &mut self,
        item_id: i32,
        loc_id: i32,
        lot_id: i32,
        qty: i32,
    ) -> orders_usage::Model {
        let (order, detail) = self.usage_order(item_id, loc_id, qty).await;
        self.inventory
            .post_order(order.id, Some(lot_id))
            .await
            .expect("usage posting");
        detail
    }

    pub async fn lot(&self, id: i32) -> inventory::Model {
        inventory::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .expect("load lot")
            .expect("lot exists")
    }

    pub async fn lot_count(&self) -> u64 {
        inventory::Entity::find()
            .count(self.db.as_ref())
            .await
            .expect("count lots")
    }

    pub async fn trx_count(&self) -> u64 {
        inventory_trx::Entity::find()
            .count(self.db.as_ref())
            .await
            .expect("count ledger rows")
    }

    /// Events published so far.
    pub fn drain_events(&mut self) -> Vec<LedgerEvent> {
        let mut drained = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            drained.push(event);
        }
        drained
    }
}
