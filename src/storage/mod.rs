//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - orders(id, customer_id)
//! - barcodes(id, code, order_id -> orders.id)

pub mod schema;
pub mod sqlite;

pub use sqlite::{DbStats, Fetched, InsertOutcome, SqliteStore};

/// True when SQLite rejected a statement because a table does not exist yet
pub(crate) fn is_missing_table(err: &rusqlite::Error) -> bool {
    err.to_string().contains("no such table")
}
