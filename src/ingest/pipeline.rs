//! Load (overwrite) and append (merge) of an orders file and a barcodes file

use std::path::{Path, PathBuf};

use super::reader::{self, CsvRow};
use super::record::{BarcodeRecord, OrderRecord, RawBarcodeRow, RawOrderRow};
use super::report::{IngestMode, IngestReport, RowIssue};
use crate::storage::{InsertOutcome, SqliteStore};
use crate::{Error, Result};

/// The two input files after role detection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFiles {
    pub orders: PathBuf,
    pub barcodes: PathBuf,
}

/// Replace everything in the store with the contents of the two files.
///
/// The purge and the inserts share one transaction, so a failure leaves the
/// previous data in place.
pub fn load(store: &mut SqliteStore, paths: [&Path; 2]) -> Result<IngestReport> {
    ensure_files_exist(&paths)?;
    store.initialize_schema()?;
    run_in_transaction(store, IngestMode::Load, paths)
}

/// Merge the two files into the store, skipping rows whose keys already exist.
pub fn append(store: &mut SqliteStore, paths: [&Path; 2]) -> Result<IngestReport> {
    ensure_files_exist(&paths)?;
    if !store.is_initialized()? {
        return Err(Error::Uninitialized);
    }
    run_in_transaction(store, IngestMode::Append, paths)
}

/// Decide which path is the orders file by looking at the first file's header
pub fn determine_file_order(paths: [&Path; 2]) -> Result<InputFiles> {
    let [first, second] = paths;
    let (orders, barcodes) = if reader::has_customer_column(first)? {
        (first, second)
    } else {
        (second, first)
    };
    Ok(InputFiles {
        orders: orders.to_path_buf(),
        barcodes: barcodes.to_path_buf(),
    })
}

fn ensure_files_exist(paths: &[&Path]) -> Result<()> {
    for path in paths {
        if !path.exists() {
            return Err(Error::MissingFile(path.to_path_buf()));
        }
    }
    Ok(())
}

fn run_in_transaction(
    store: &mut SqliteStore,
    mode: IngestMode,
    paths: [&Path; 2],
) -> Result<IngestReport> {
    store.begin_transaction()?;

    let outcome = ingest(store, mode, paths).and_then(|report| {
        store.commit()?;
        Ok(report)
    });

    match outcome {
        Ok(report) => {
            tracing::info!("{} finished: {}", mode, report.summary_line());
            Ok(report)
        }
        Err(err) => {
            if let Err(rollback_err) = store.rollback() {
                tracing::error!("Rollback after failed {} also failed: {}", mode, rollback_err);
            }
            tracing::error!("Error during {}: {}", mode, err);
            Err(Error::RolledBack {
                mode,
                source: Box::new(err),
            })
        }
    }
}

fn ingest(store: &SqliteStore, mode: IngestMode, paths: [&Path; 2]) -> Result<IngestReport> {
    if mode == IngestMode::Load {
        store.delete_all_data()?;
    }

    let files = determine_file_order(paths)?;
    tracing::debug!(
        "Orders file: {}, barcodes file: {}",
        files.orders.display(),
        files.barcodes.display()
    );
    let mut report = IngestReport::new(mode, &files);

    for row in reader::read_rows::<RawOrderRow>(&files.orders)? {
        let line = row.line;
        let Some(record) = validated(&files.orders, row, OrderRecord::validate, &mut report) else {
            continue;
        };
        if mode == IngestMode::Append && store.get_order_by_id(record.order_id)?.is_some() {
            tracing::info!("Order {} already exists. Skipping.", record.order_id);
            report.orders.skipped += 1;
            continue;
        }
        match store.create_order(record.order_id, &record.customer_id) {
            InsertOutcome::Created(_) => report.orders.created += 1,
            InsertOutcome::Skipped => report.orders.skipped += 1,
            InsertOutcome::Failed(err) => {
                report.orders.rejected += 1;
                report.issues.push(RowIssue::new(&files.orders, line, err.to_string()));
            }
        }
    }

    for row in reader::read_rows::<RawBarcodeRow>(&files.barcodes)? {
        let line = row.line;
        let Some(record) = validated(&files.barcodes, row, BarcodeRecord::validate, &mut report) else {
            continue;
        };
        if store.get_barcode_by_code(&record.barcode)?.is_some() {
            tracing::error!("Barcode {} already exists, skipping!", record.barcode);
            report.barcodes.skipped += 1;
            continue;
        }
        match store.create_barcode(&record.barcode, record.order_id) {
            InsertOutcome::Created(_) => report.barcodes.created += 1,
            InsertOutcome::Skipped => report.barcodes.skipped += 1,
            InsertOutcome::Failed(err) => {
                report.barcodes.rejected += 1;
                report.issues.push(RowIssue::new(&files.barcodes, line, err.to_string()));
            }
        }
    }

    Ok(report)
}

/// Validate a decoded row, recording the problem and returning `None` if it fails
fn validated<Raw, Rec>(
    path: &Path,
    row: CsvRow<Raw>,
    validate: impl FnOnce(Raw) -> std::result::Result<Rec, crate::ValidationError>,
    report: &mut IngestReport,
) -> Option<Rec> {
    match row.parsed.and_then(validate) {
        Ok(record) => Some(record),
        Err(err) => {
            tracing::warn!("Invalid data in {} line {}: {}", path.display(), row.line, err);
            report.invalid_rows += 1;
            report.issues.push(RowIssue::new(path, row.line, err.to_string()));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_pair(dir: &Path) -> (PathBuf, PathBuf) {
        let orders = dir.join("orders.csv");
        let barcodes = dir.join("barcodes.csv");
        fs::write(&orders, "order_id,customer_id\n1,100\n2,101\n").unwrap();
        fs::write(&barcodes, "barcode,order_id\nA,1\nB,2\nC,\n").unwrap();
        (orders, barcodes)
    }

    #[test]
    fn test_determine_file_order_either_way() {
        let dir = tempfile::tempdir().unwrap();
        let (orders, barcodes) = write_pair(dir.path());

        let forward = determine_file_order([&orders, &barcodes]).unwrap();
        let reversed = determine_file_order([&barcodes, &orders]).unwrap();
        assert_eq!(forward, reversed);
        assert_eq!(forward.orders, orders);
        assert_eq!(forward.barcodes, barcodes);
    }

    #[test]
    fn test_load_reports_counts() {
        let dir = tempfile::tempdir().unwrap();
        let (orders, barcodes) = write_pair(dir.path());
        let mut store = SqliteStore::open_in_memory().unwrap();

        let report = load(&mut store, [&orders, &barcodes]).unwrap();
        assert_eq!(report.orders.created, 2);
        assert_eq!(report.barcodes.created, 3);
        assert!(report.issues.is_empty());
        assert_eq!(store.count_unused_barcodes().unwrap().into_rows(), 1);
    }

    #[test]
    fn test_invalid_rows_are_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let orders = dir.path().join("orders.csv");
        let barcodes = dir.path().join("barcodes.csv");
        fs::write(&orders, "order_id,customer_id\n1,100\nabc,101\n3,\n").unwrap();
        fs::write(&barcodes, "barcode,order_id\nA,1\n,1\nB,1\nB,1\nC,42\n").unwrap();
        let mut store = SqliteStore::open_in_memory().unwrap();

        let report = load(&mut store, [&orders, &barcodes]).unwrap();
        assert_eq!(report.orders.created, 1);
        assert_eq!(report.barcodes.created, 2);
        assert_eq!(report.barcodes.skipped, 1);
        assert_eq!(report.barcodes.rejected, 1);
        assert_eq!(report.invalid_rows, 3);
        assert_eq!(report.issues.len(), 4);
        assert_eq!(store.count_barcodes().unwrap(), 2);
    }

    #[test]
    fn test_append_requires_initialized_store() {
        let dir = tempfile::tempdir().unwrap();
        let (orders, barcodes) = write_pair(dir.path());
        let mut store = SqliteStore::open_in_memory().unwrap();

        let err = append(&mut store, [&orders, &barcodes]).unwrap_err();
        assert!(err.is_uninitialized());
    }

    #[test]
    fn test_failed_load_keeps_previous_data() {
        let dir = tempfile::tempdir().unwrap();
        let (orders, barcodes) = write_pair(dir.path());
        let mut store = SqliteStore::open_in_memory().unwrap();
        load(&mut store, [&orders, &barcodes]).unwrap();

        // a directory passes the existence check but cannot be read as CSV
        let unreadable = dir.path().join("subdir");
        fs::create_dir(&unreadable).unwrap();
        let err = load(&mut store, [&orders, &unreadable]).unwrap_err();
        assert!(matches!(err, Error::RolledBack { mode: IngestMode::Load, .. }));

        assert_eq!(store.count_orders().unwrap(), 2);
        assert_eq!(store.count_barcodes().unwrap(), 3);
    }
}
