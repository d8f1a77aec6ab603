//! Query engine implementation
//!
//! Provides the read-side reports:
//! - Barcodes grouped by customer and order
//! - Top customers by ticket count
//! - Number of unused barcodes

use std::fmt;

use serde::Serialize;

use crate::Result;
use crate::model::{BarcodeGroup, CustomerTickets};
use crate::storage::{Fetched, SqliteStore};

/// Assigned barcodes grouped per customer and order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BarcodeListing {
    pub initialized: bool,
    pub groups: Vec<BarcodeGroup>,
}

/// Customers with the most tickets, best first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopCustomers {
    pub initialized: bool,
    pub limit: usize,
    pub customers: Vec<CustomerTickets>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UnusedBarcodes {
    pub initialized: bool,
    pub count: usize,
}

impl fmt::Display for UnusedBarcodes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Number of unused barcodes: {}", self.count)
    }
}

/// Read-side operations over the store.
///
/// A store without tables yields empty reports with `initialized == false`;
/// any other storage error is returned.
pub struct QueryEngine<'a> {
    store: &'a SqliteStore,
}

impl<'a> QueryEngine<'a> {
    /// Create a new query engine
    pub fn new(store: &'a SqliteStore) -> Self {
        Self { store }
    }

    pub fn barcode_listing(&self) -> Result<BarcodeListing> {
        let fetched = self.store.list_barcodes_grouped()?;
        let initialized = !fetched.is_uninitialized();

        let groups = fetched
            .into_rows()
            .into_iter()
            .map(|((customer_id, order_id), barcodes)| BarcodeGroup {
                customer_id,
                order_id,
                barcodes,
            })
            .collect();

        Ok(BarcodeListing { initialized, groups })
    }

    pub fn top_customers(&self, limit: usize) -> Result<TopCustomers> {
        let fetched = self.store.top_customers(limit)?;
        Ok(TopCustomers {
            initialized: !fetched.is_uninitialized(),
            limit,
            customers: fetched.into_rows(),
        })
    }

    pub fn unused_barcodes(&self) -> Result<UnusedBarcodes> {
        Ok(match self.store.count_unused_barcodes()? {
            Fetched::Rows(count) => UnusedBarcodes {
                initialized: true,
                count,
            },
            Fetched::Uninitialized => UnusedBarcodes::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OrderId;

    fn loaded_store() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store.initialize_schema().unwrap();
        store.create_order(OrderId::new(1), "100");
        store.create_order(OrderId::new(2), "200");
        store.create_barcode("11111", Some(OrderId::new(1)));
        store.create_barcode("11112", Some(OrderId::new(1)));
        store.create_barcode("22221", Some(OrderId::new(2)));
        store.create_barcode("99999", None);
        store
    }

    #[test]
    fn test_barcode_listing() {
        let store = loaded_store();
        let listing = QueryEngine::new(&store).barcode_listing().unwrap();

        assert!(listing.initialized);
        assert_eq!(listing.groups.len(), 2);
        assert_eq!(
            listing.groups[0].to_string(),
            "Customer: 100, Order: 1, Barcodes: [11111, 11112]"
        );
    }

    #[test]
    fn test_top_customers_and_unused() {
        let store = loaded_store();
        let engine = QueryEngine::new(&store);

        let top = engine.top_customers(5).unwrap();
        assert_eq!(top.customers.len(), 2);
        assert_eq!(top.customers[0].customer_id, "100");
        assert_eq!(top.customers[0].tickets, 2);

        let unused = engine.unused_barcodes().unwrap();
        assert_eq!(unused.count, 1);
        assert_eq!(unused.to_string(), "Number of unused barcodes: 1");
    }

    #[test]
    fn test_uninitialized_store_gives_empty_reports() {
        let store = SqliteStore::open_in_memory().unwrap();
        let engine = QueryEngine::new(&store);

        let listing = engine.barcode_listing().unwrap();
        assert!(!listing.initialized);
        assert!(listing.groups.is_empty());

        let top = engine.top_customers(3).unwrap();
        assert!(!top.initialized);
        assert!(top.customers.is_empty());

        assert_eq!(engine.unused_barcodes().unwrap(), UnusedBarcodes::default());
    }
}
