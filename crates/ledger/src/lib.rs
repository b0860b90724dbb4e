//! Postgres-backed ledger/inventory store and GST calculator.
//!
//! Every operation that spans multiple rows or tables runs inside a single
//! `sqlx::Transaction` so the ledger invariants hold even on partial
//! failure. The only teacher-dependency swap in this repo is
//! ScyllaDB → Postgres (see `pool.rs` and DESIGN.md): Scylla has no
//! multi-partition ACID transactions, and invoice confirmation needs one.

pub mod cache;
mod customers;
mod deletion;
mod error;
pub mod gst;
mod invoices;
mod payments;
mod pool;
mod products;
mod reminders;
mod rows;
mod store;

pub use cache::BalanceCache;
pub use error::{LedgerError, Result};
pub use pool::{LedgerConfig, LedgerPool};
pub use store::LedgerStore;

pub use customers::{CreateCustomerResult, CustomerMatch};
pub use invoices::{financial_year_label, DailySummary, InvoicePreview, ItemRequest, ResolvedItem};
pub use deletion::DeletionCounts;
pub use products::ProductStockMatch;
