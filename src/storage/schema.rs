//! Database schema definitions

/// Enforce `barcodes.order_id -> orders.id` on every connection
pub const ENABLE_FOREIGN_KEYS: &str = "PRAGMA foreign_keys = ON";

/// SQL to create the orders table
pub const CREATE_ORDERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS orders (
    id INTEGER PRIMARY KEY,
    customer_id TEXT NOT NULL
)
"#;

/// SQL to create the barcodes table
/// A NULL order_id marks an unused barcode
pub const CREATE_BARCODES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS barcodes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    code TEXT NOT NULL UNIQUE,
    order_id INTEGER REFERENCES orders(id)
)
"#;

pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_barcodes_order ON barcodes(order_id)",
    "CREATE INDEX IF NOT EXISTS idx_orders_customer ON orders(customer_id)",
];

/// Tables that must exist before the store can be read
pub const REQUIRED_TABLES: &[&str] = &["orders", "barcodes"];

/// All schema creation statements, parents before children
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![CREATE_ORDERS_TABLE, CREATE_BARCODES_TABLE];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
