//! Spending totals per currency, category, pet and month, shown as tables or charts.

mod aggregation;
mod charts;
mod handlers;
mod tables;

pub use handlers::get_analytics_page;
