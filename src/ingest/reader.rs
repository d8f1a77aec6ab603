//! CSV reading for the ingestion pipeline

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::{Result, ValidationError};

/// Column whose presence in the header marks the orders file
pub const CUSTOMER_COLUMN: &str = "customer_id";

/// One data row, with the line it came from
#[derive(Debug)]
pub struct CsvRow<R> {
    pub line: u64,
    pub parsed: std::result::Result<R, ValidationError>,
}

/// Read every data row of a headed CSV file.
///
/// Rows that cannot be decoded into `R` are returned as validation failures;
/// I/O errors abort the read.
pub fn read_rows<R: DeserializeOwned>(path: &Path) -> Result<Vec<CsvRow<R>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();

    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(err) if err.is_io_error() => return Err(err.into()),
            Err(err) => {
                let line = err.position().map(|p| p.line()).unwrap_or(0);
                rows.push(CsvRow {
                    line,
                    parsed: Err(ValidationError::Malformed(err.to_string())),
                });
                continue;
            }
        };

        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let parsed = record
            .deserialize::<R>(Some(&headers))
            .map_err(|err| ValidationError::Malformed(err.to_string()));
        rows.push(CsvRow { line, parsed });
    }

    Ok(rows)
}

/// Whether the header line of `path` names the customer column
pub fn has_customer_column(path: &Path) -> Result<bool> {
    let mut header = String::new();
    BufReader::new(File::open(path)?).read_line(&mut header)?;
    Ok(header.contains(CUSTOMER_COLUMN))
}
