//! Exchange rates for converting expenses to the base currency.

mod create;
mod db;
mod delete;
mod domain;
mod list;

pub use create::{create_rate_endpoint, get_new_rate_page};
pub use db::{
    bootstrap_exchange_rates, create_exchange_rate, create_exchange_rate_table,
    delete_exchange_rate, get_all_exchange_rates, get_exchange_rate, load_rate_table,
    load_rate_table_or_default, toggle_exchange_rate_active,
};
pub use delete::{delete_rate_endpoint, toggle_rate_active_endpoint};
pub use domain::{ExchangeRate, NewExchangeRate, Rate, RateId, RateTable};
pub use list::get_rates_page;
