//! SeaORM entities for the warehouse ledger.
//!
//! Master data (`m_stock_items`, `m_location`, `m_counter`), order documents
//! (`orders` and the per-type detail tables) and the ledger itself
//! (`inventory`, `inventory_trx`, `usage_inventory`, `return_inventory`,
//! `inventory_sum`).

pub mod counter;
pub mod counter_runtime;
pub mod inventory;
pub mod inventory_sum;
pub mod inventory_trx;
pub mod location;
pub mod orders;
pub mod orders_receipt;
pub mod orders_return;
pub mod orders_transfer;
pub mod orders_usage;
pub mod return_inventory;
pub mod stock_item;
pub mod usage_inventory;

pub mod prelude {
    pub use super::counter::Entity as Counter;
    pub use super::counter_runtime::Entity as CounterRuntime;
    pub use super::inventory::Entity as Inventory;
    pub use super::inventory_sum::Entity as InventorySum;
    pub use super::inventory_trx::Entity as InventoryTrx;
    pub use super::location::Entity as Location;
    pub use super::orders::Entity as Orders;
    pub use super::orders_receipt::Entity as OrdersReceipt;
    pub use super::orders_return::Entity as OrdersReturn;
    pub use super::orders_transfer::Entity as OrdersTransfer;
    pub use super::orders_usage::Entity as OrdersUsage;
    pub use super::return_inventory::Entity as ReturnInventory;
    pub use super::stock_item::Entity as StockItem;
    pub use super::usage_inventory::Entity as UsageInventory;
}
