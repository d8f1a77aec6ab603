use tabled::{Table, Tabled, settings::Style};

use crate::model::CustomerTickets;

#[derive(Tabled)]
pub struct MetricRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Tabled)]
struct CustomerRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Customer")]
    customer: String,
    #[tabled(rename = "Tickets")]
    tickets: u64,
}

pub struct TableBuilder {
    rows: Vec<MetricRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(MetricRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }
        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn metrics_table<V: AsRef<str>>(metrics: &[(&str, V)]) -> String {
    let mut builder = TableBuilder::new();
    for (label, value) in metrics {
        builder.add_row(label, value.as_ref());
    }
    builder.build()
}

/// Ranked customer table; empty input renders as an empty string
pub fn customers_table(customers: &[CustomerTickets]) -> String {
    if customers.is_empty() {
        return String::new();
    }
    let rows: Vec<CustomerRow> = customers
        .iter()
        .enumerate()
        .map(|(i, c)| CustomerRow {
            rank: i + 1,
            customer: c.customer_id.clone(),
            tickets: c.tickets,
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}
