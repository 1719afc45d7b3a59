//! Currencies, money amounts and multi-currency totals.

mod aggregation;
mod domain;

pub use aggregation::{CurrencyTotals, aggregate_totals};
pub(crate) use domain::decimal_from_sql;
pub use domain::{Amount, BASE_CURRENCY, Currency, format_money};
