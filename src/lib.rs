//! Warehouse Ledger Library
//!
//! Lot-based inventory ledger: receipts create cost lots, usage and returns
//! move stock in and out of a chosen lot, transfers consume source lots FIFO
//! and merge into destination lots by unit cost. Every movement appends an
//! `inventory_trx` row inside the same database transaction.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod dto;
pub mod entities;
pub mod errors;
pub mod events;
pub mod migrator;
pub mod services;

pub use errors::{LedgerResult, ServiceError};
