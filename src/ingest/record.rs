//! Typed CSV records and their validation

use serde::Deserialize;

use crate::ValidationError;
use crate::model::OrderId;

/// An orders-file row as it appears in the CSV
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawOrderRow {
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub customer_id: String,
}

/// A barcodes-file row as it appears in the CSV
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBarcodeRow {
    #[serde(default)]
    pub barcode: String,
    #[serde(default)]
    pub order_id: Option<String>,
}

/// A validated orders-file row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    pub order_id: OrderId,
    pub customer_id: String,
}

impl OrderRecord {
    /// Both fields are required; the order id must be an integer
    pub fn validate(raw: RawOrderRow) -> Result<Self, ValidationError> {
        let order_id: OrderId = raw.order_id.parse()?;
        let customer_id = required("customer_id", &raw.customer_id)?;
        Ok(Self { order_id, customer_id })
    }
}

/// A validated barcodes-file row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarcodeRecord {
    pub barcode: String,
    pub order_id: Option<OrderId>,
}

impl BarcodeRecord {
    /// The barcode is required; a blank order id means the barcode is unused
    pub fn validate(raw: RawBarcodeRow) -> Result<Self, ValidationError> {
        let barcode = required("barcode", &raw.barcode)?;
        let order_id = match raw.order_id.as_deref() {
            Some(value) => OrderId::parse_optional(value)?,
            None => None,
        };
        Ok(Self { barcode, order_id })
    }
}

fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_row(order_id: &str, customer_id: &str) -> RawOrderRow {
        RawOrderRow {
            order_id: order_id.into(),
            customer_id: customer_id.into(),
        }
    }

    fn barcode_row(barcode: &str, order_id: Option<&str>) -> RawBarcodeRow {
        RawBarcodeRow {
            barcode: barcode.into(),
            order_id: order_id.map(Into::into),
        }
    }

    #[test]
    fn test_valid_order() {
        let record = OrderRecord::validate(order_row("12", " 500 ")).unwrap();
        assert_eq!(record.order_id, OrderId::new(12));
        assert_eq!(record.customer_id, "500");
    }

    #[test]
    fn test_order_requires_both_fields() {
        assert_eq!(
            OrderRecord::validate(order_row("", "500")),
            Err(ValidationError::MissingField("order_id"))
        );
        assert_eq!(
            OrderRecord::validate(order_row("12", "")),
            Err(ValidationError::MissingField("customer_id"))
        );
    }

    #[test]
    fn test_order_id_must_be_numeric() {
        assert!(matches!(
            OrderRecord::validate(order_row("ORD-1", "500")),
            Err(ValidationError::NotAnInteger { field: "order_id", .. })
        ));
    }

    #[test]
    fn test_barcode_order_is_optional() {
        let unused = BarcodeRecord::validate(barcode_row("11119", Some(""))).unwrap();
        assert_eq!(unused.order_id, None);

        let no_column = BarcodeRecord::validate(barcode_row("11120", None)).unwrap();
        assert_eq!(no_column.order_id, None);

        let assigned = BarcodeRecord::validate(barcode_row("11111", Some("1"))).unwrap();
        assert_eq!(assigned.order_id, Some(OrderId::new(1)));
    }

    #[test]
    fn test_barcode_is_required() {
        assert_eq!(
            BarcodeRecord::validate(barcode_row("  ", Some("1"))),
            Err(ValidationError::MissingField("barcode"))
        );
    }
}
