//! Query Layer - aggregate reports over the stored orders and barcodes

pub mod engine;

pub use engine::{BarcodeListing, QueryEngine, TopCustomers, UnusedBarcodes};
