//! # ticketdb - ticket order and barcode manager
//!
//! Loads two related CSV datasets (orders and barcodes) into SQLite and answers
//! aggregate questions about them.
//!
//! ticketdb provides:
//! - A SQLite-backed record repository with duplicate-safe inserts
//! - An ingestion pipeline for overwriting (load) or merging (append) CSV files
//! - A query layer for grouped barcode listings, top customers and unused barcodes

pub mod model;
pub mod storage;
pub mod ingest;
pub mod query;
pub mod config;
pub mod output;
pub mod ui;

// Re-exports for convenient access
pub use model::{Barcode, Order, OrderId};
pub use storage::{Fetched, InsertOutcome, SqliteStore};
pub use ingest::{IngestMode, IngestReport};
pub use query::QueryEngine;

use std::path::PathBuf;

/// Result type alias for ticketdb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for ticketdb operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[source] rusqlite::Error),

    #[error("Storage is not initialized, load data first with --load-data")]
    Uninitialized,

    #[error("File not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{mode} rolled back: {source}")]
    RolledBack {
        mode: IngestMode,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// True when this error (or the error that caused a rollback) means the
    /// tables have not been created yet.
    pub fn is_uninitialized(&self) -> bool {
        match self {
            Error::Uninitialized => true,
            Error::RolledBack { source, .. } => source.is_uninitialized(),
            _ => false,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        if storage::is_missing_table(&err) {
            Error::Uninitialized
        } else {
            Error::Storage(err)
        }
    }
}

/// A CSV row that failed its field checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{field} must be an integer, got {value:?}")]
    NotAnInteger { field: &'static str, value: String },

    #[error("malformed row: {0}")]
    Malformed(String),
}
