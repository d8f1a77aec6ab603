//! Ingestion pipeline - CSV files into the record repository
//!
//! - `reader`: headed CSV rows and header sniffing
//! - `record`: typed order/barcode rows and their validation
//! - `pipeline`: load (overwrite) and append (merge)
//! - `report`: counts and row issues for one run

pub mod pipeline;
pub mod reader;
pub mod record;
pub mod report;

pub use pipeline::{InputFiles, append, determine_file_order, load};
pub use record::{BarcodeRecord, OrderRecord};
pub use report::{IngestMode, IngestReport, RowCounts, RowIssue};
