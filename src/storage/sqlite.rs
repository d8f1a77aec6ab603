//! SQLite storage implementation

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};

use super::schema;
use crate::model::{Barcode, CustomerTickets, GroupedBarcodes, Order, OrderId};
use crate::{Error, Result};

const SAVEPOINT: &str = "repository_op";

/// Outcome of a duplicate-safe insert.
///
/// Storage failures are contained here instead of being returned as `Err`,
/// so a single bad row never aborts the batch that issued it.
#[derive(Debug)]
pub enum InsertOutcome<T> {
    Created(T),
    /// A row with the same natural key already exists
    Skipped,
    /// The insert was rolled back
    Failed(Error),
}

impl<T> InsertOutcome<T> {
    pub fn created(self) -> Option<T> {
        match self {
            InsertOutcome::Created(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, InsertOutcome::Created(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, InsertOutcome::Skipped)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, InsertOutcome::Failed(_))
    }
}

/// Result of an aggregate read.
///
/// `Uninitialized` means the tables do not exist yet, which is distinct from
/// an initialized store that holds no rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched<T> {
    Rows(T),
    Uninitialized,
}

impl<T> Fetched<T> {
    pub fn is_uninitialized(&self) -> bool {
        matches!(self, Fetched::Uninitialized)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        match self {
            Fetched::Rows(rows) => Fetched::Rows(f(rows)),
            Fetched::Uninitialized => Fetched::Uninitialized,
        }
    }
}

impl<T: Default> Fetched<T> {
    /// The rows, or the empty value when the store is not initialized
    pub fn into_rows(self) -> T {
        match self {
            Fetched::Rows(rows) => rows,
            Fetched::Uninitialized => T::default(),
        }
    }
}

/// SQLite-backed repository for orders and barcodes
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a database file (creates the file if it doesn't exist).
    ///
    /// Tables are not created here; see [`SqliteStore::initialize_schema`].
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(schema::ENABLE_FOREIGN_KEYS)?;
        Ok(Self { conn })
    }

    /// Create the tables if they are absent
    pub fn initialize_schema(&self) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    /// Whether every required table exists
    pub fn is_initialized(&self) -> Result<bool> {
        for table in schema::REQUIRED_TABLES {
            let exists: bool = self.conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
                [table],
                |row| row.get(0),
            )?;
            if !exists {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Close the connection, reporting any error SQLite raises while doing so
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, err)| Error::from(err))
    }

    /// Run `op` inside a savepoint: released on success, rolled back on error.
    /// Nests inside an outer transaction.
    fn atomically<T>(&self, op: impl FnOnce() -> Result<T>) -> Result<T> {
        self.conn.execute_batch(&format!("SAVEPOINT {SAVEPOINT}"))?;
        match op() {
            Ok(value) => {
                self.conn.execute_batch(&format!("RELEASE {SAVEPOINT}"))?;
                Ok(value)
            }
            Err(err) => {
                let undo = format!("ROLLBACK TO {SAVEPOINT}; RELEASE {SAVEPOINT}");
                if let Err(rollback_err) = self.conn.execute_batch(&undo) {
                    tracing::error!("Failed to roll back savepoint: {}", rollback_err);
                }
                Err(err)
            }
        }
    }

    // ========== Order Operations ==========

    /// Insert an order unless one with the same id exists
    pub fn create_order(&self, id: OrderId, customer_id: &str) -> InsertOutcome<Order> {
        let result = self.atomically(|| {
            if self.get_order_by_id(id)?.is_some() {
                return Ok(None);
            }
            self.conn.execute(
                "INSERT INTO orders (id, customer_id) VALUES (?1, ?2)",
                params![id.get(), customer_id],
            )?;
            Ok(Some(Order {
                id,
                customer_id: customer_id.to_string(),
            }))
        });

        match result {
            Ok(Some(order)) => InsertOutcome::Created(order),
            Ok(None) => {
                tracing::info!("Order {} already exists. Skipping.", id);
                InsertOutcome::Skipped
            }
            Err(err) => {
                tracing::error!("Error adding order {}: {}", id, err);
                InsertOutcome::Failed(err)
            }
        }
    }

    /// Get an order by id
    pub fn get_order_by_id(&self, id: OrderId) -> Result<Option<Order>> {
        self.conn
            .query_row(
                "SELECT id, customer_id FROM orders WHERE id = ?1",
                [id.get()],
                |row| {
                    Ok(Order {
                        id: OrderId::new(row.get(0)?),
                        customer_id: row.get(1)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn count_orders(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ========== Barcode Operations ==========

    /// Insert a barcode unless one with the same code exists.
    ///
    /// A reference to an order that does not exist is refused by the foreign
    /// key and reported as `Failed`.
    pub fn create_barcode(&self, code: &str, order_id: Option<OrderId>) -> InsertOutcome<Barcode> {
        let result = self.atomically(|| {
            if self.get_barcode_by_code(code)?.is_some() {
                return Ok(None);
            }
            self.conn.execute(
                "INSERT INTO barcodes (code, order_id) VALUES (?1, ?2)",
                params![code, order_id.map(OrderId::get)],
            )?;
            Ok(Some(Barcode {
                id: self.conn.last_insert_rowid(),
                code: code.to_string(),
                order_id,
            }))
        });

        match result {
            Ok(Some(barcode)) => InsertOutcome::Created(barcode),
            Ok(None) => {
                tracing::info!("Barcode {} already exists. Skipping.", code);
                InsertOutcome::Skipped
            }
            Err(err) => {
                tracing::error!("Error adding barcode {}: {}", code, err);
                InsertOutcome::Failed(err)
            }
        }
    }

    /// Get a barcode by its code
    pub fn get_barcode_by_code(&self, code: &str) -> Result<Option<Barcode>> {
        self.conn
            .query_row(
                "SELECT id, code, order_id FROM barcodes WHERE code = ?1",
                [code],
                |row| {
                    Ok(Barcode {
                        id: row.get(0)?,
                        code: row.get(1)?,
                        order_id: row.get::<_, Option<i64>>(2)?.map(OrderId::new),
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn count_barcodes(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM barcodes", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ========== Aggregate Reads ==========

    /// Assigned barcodes grouped by `(customer_id, order_id)`
    pub fn list_barcodes_grouped(&self) -> Result<Fetched<GroupedBarcodes>> {
        degrade("grouped barcodes", self.query_barcodes_grouped())
    }

    fn query_barcodes_grouped(&self) -> Result<GroupedBarcodes> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT o.customer_id, o.id, b.code
            FROM barcodes b
            JOIN orders o ON b.order_id = o.id
            ORDER BY b.id
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                OrderId::new(row.get(1)?),
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut grouped = GroupedBarcodes::new();
        for row in rows {
            let (customer_id, order_id, code) = row?;
            grouped.entry((customer_id, order_id)).or_default().push(code);
        }
        Ok(grouped)
    }

    /// Up to `limit` customers with the most tickets, ties by customer id
    pub fn top_customers(&self, limit: usize) -> Result<Fetched<Vec<CustomerTickets>>> {
        degrade("top customers", self.query_top_customers(limit))
    }

    fn query_top_customers(&self, limit: usize) -> Result<Vec<CustomerTickets>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT o.customer_id, COUNT(b.id) AS ticket_count
            FROM orders o
            JOIN barcodes b ON b.order_id = o.id
            GROUP BY o.customer_id
            ORDER BY ticket_count DESC, o.customer_id ASC
            LIMIT ?1
            "#,
        )?;

        let customers = stmt
            .query_map([limit as i64], |row| {
                Ok(CustomerTickets {
                    customer_id: row.get(0)?,
                    tickets: row.get::<_, i64>(1)? as u64,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(customers)
    }

    /// Number of barcodes without an order
    pub fn count_unused_barcodes(&self) -> Result<Fetched<usize>> {
        degrade("unused barcodes", self.query_unused_barcodes())
    }

    fn query_unused_barcodes(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM barcodes WHERE order_id IS NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    // ========== Bulk Operations ==========

    /// Begin a transaction for bulk operations
    pub fn begin_transaction(&mut self) -> Result<()> {
        self.conn.execute("BEGIN TRANSACTION", [])?;
        Ok(())
    }

    /// Commit a transaction
    pub fn commit(&mut self) -> Result<()> {
        self.conn.execute("COMMIT", [])?;
        Ok(())
    }

    /// Rollback a transaction (no-op when none is open)
    pub fn rollback(&mut self) -> Result<()> {
        if self.conn.is_autocommit() {
            return Ok(());
        }
        self.conn.execute("ROLLBACK", [])?;
        Ok(())
    }

    /// Delete all barcodes, then all orders
    pub fn delete_all_data(&self) -> Result<()> {
        self.atomically(|| {
            self.conn.execute("DELETE FROM barcodes", [])?;
            self.conn.execute("DELETE FROM orders", [])?;
            Ok(())
        })
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        Ok(DbStats {
            orders: self.count_orders()?,
            barcodes: self.count_barcodes()?,
            unused: self.query_unused_barcodes()?,
        })
    }
}

/// Turn a missing-table error into `Fetched::Uninitialized`, pass everything else through
fn degrade<T>(what: &str, result: Result<T>) -> Result<Fetched<T>> {
    match result {
        Ok(rows) => Ok(Fetched::Rows(rows)),
        Err(Error::Uninitialized) => {
            tracing::warn!(
                "Cannot list {}: the tables do not exist yet. Load data first with --load-data <csv-files>",
                what
            );
            Ok(Fetched::Uninitialized)
        }
        Err(err) => Err(err),
    }
}

/// Database statistics
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DbStats {
    pub orders: usize,
    pub barcodes: usize,
    pub unused: usize,
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  Orders: {}", self.orders)?;
        writeln!(f, "  Barcodes: {}", self.barcodes)?;
        write!(f, "  Unused barcodes: {}", self.unused)
    }
}
