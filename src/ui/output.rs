use crate::model::{BarcodeGroup, CustomerTickets};
use crate::output::is_quiet;
use crate::ui::{Icons, theme};
use owo_colors::OwoColorize;

pub fn header(icon: &str, text: &str) {
    if is_quiet() {
        return;
    }
    println!("{} {}", icon, text.style(theme().header.clone()));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().success.clone()));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().error.clone()));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn.clone()));
}

pub fn info(label: &str, value: &str) {
    println!("{} {}: {}", Icons::INFO, label.style(theme().dim.clone()), value);
}

pub fn empty(label: &str) {
    println!("{} {}", Icons::EMPTY, label.style(theme().dim.clone()));
}

/// `Customer: 100, Order: 1, Barcodes: [11111, 11112]`, styled
pub fn group_line(group: &BarcodeGroup) -> String {
    format!(
        "Customer: {}, Order: {}, Barcodes: [{}]",
        group.customer_id.style(theme().customer.clone()),
        group.order_id.style(theme().order.clone()),
        group.barcodes.join(", ")
    )
}

pub fn customer_line(rank: usize, customer: &CustomerTickets) -> String {
    format!(
        "{:>2}. Customer: {}, Count: {}",
        rank,
        customer.customer_id.style(theme().customer.clone()),
        customer.tickets.style(theme().count.clone())
    )
}
