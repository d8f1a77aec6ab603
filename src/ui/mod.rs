pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{customer_line, empty, error, group_line, header, info, success, warn};
pub use table::{TableBuilder, customers_table, metrics_table};
pub use theme::{Theme, theme};
