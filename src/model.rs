//! Core records: orders, barcodes and the shapes returned by aggregate reads

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::ValidationError;

/// External order identifier.
///
/// Order ids arrive as text in the CSV files but are stored as the integer
/// primary key of the `orders` table, so they are parsed once at the
/// ingestion boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct OrderId(i64);

impl OrderId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(self) -> i64 {
        self.0
    }

    /// Parse an optional order reference. Blank text means "no order".
    pub fn parse_optional(s: &str) -> Result<Option<Self>, ValidationError> {
        if s.trim().is_empty() {
            Ok(None)
        } else {
            s.parse().map(Some)
        }
    }
}

impl FromStr for OrderId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::MissingField("order_id"));
        }
        trimmed
            .parse::<i64>()
            .map(OrderId)
            .map_err(|_| ValidationError::NotAnInteger {
                field: "order_id",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A purchase, owned by one customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: String,
}

/// A ticket code, optionally assigned to an order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Barcode {
    pub id: i64,
    pub code: String,
    pub order_id: Option<OrderId>,
}

impl Barcode {
    pub fn is_unused(&self) -> bool {
        self.order_id.is_none()
    }
}

/// Barcodes keyed by `(customer_id, order_id)`, codes in insertion order
pub type GroupedBarcodes = BTreeMap<(String, OrderId), Vec<String>>;

/// One entry of the grouped listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BarcodeGroup {
    pub customer_id: String,
    pub order_id: OrderId,
    pub barcodes: Vec<String>,
}

impl fmt::Display for BarcodeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Customer: {}, Order: {}, Barcodes: [{}]",
            self.customer_id,
            self.order_id,
            self.barcodes.join(", ")
        )
    }
}

/// Ticket count for a single customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerTickets {
    pub customer_id: String,
    pub tickets: u64,
}
