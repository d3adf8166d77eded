// Pure cost arithmetic and FIFO planning
pub mod costing;

// Ledger postings: receipt, usage, return, transfer
pub mod inventory;

// Read-side lot, ledger and summary queries
pub mod inventory_query;

// Pick-counter sessions
pub mod counters;

pub use counters::{CountResult, CounterService};
pub use inventory::InventoryService;
pub use inventory_query::{InventoryQueryService, Reconciliation, StockSummary};
