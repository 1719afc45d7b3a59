//! Database operations for exchange rates.

use rusqlite::{Connection, Row};
use time::{Date, macros::date};

use crate::{
    Error,
    currency::Currency,
    rate::{ExchangeRate, NewExchangeRate, Rate, RateId, RateTable},
};

/// The effective date of the rates stored on first start, early enough to cover any expense.
const BOOTSTRAP_EFFECTIVE_DATE: Date = date!(2000 - 01 - 01);

/// Store a new exchange rate and return it with its generated ID.
pub fn create_exchange_rate(
    rate: NewExchangeRate,
    connection: &Connection,
) -> Result<ExchangeRate, Error> {
    connection
        .prepare(
            "INSERT INTO exchange_rate (currency, rate, effective_date, is_active)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id, currency, rate, effective_date, is_active;",
        )?
        .query_row(
            (
                rate.currency,
                rate.rate,
                rate.effective_date,
                rate.is_active,
            ),
            map_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve a single exchange rate by ID.
pub fn get_exchange_rate(rate_id: RateId, connection: &Connection) -> Result<ExchangeRate, Error> {
    connection
        .prepare(
            "SELECT id, currency, rate, effective_date, is_active
            FROM exchange_rate WHERE id = :id;",
        )?
        .query_row(&[(":id", &rate_id)], map_row)
        .map_err(|error| error.into())
}

/// Retrieve all exchange rates grouped by currency with the newest first.
pub fn get_all_exchange_rates(connection: &Connection) -> Result<Vec<ExchangeRate>, Error> {
    connection
        .prepare(
            "SELECT id, currency, rate, effective_date, is_active
            FROM exchange_rate
            ORDER BY currency ASC, effective_date DESC, id DESC;",
        )?
        .query_map([], map_row)?
        .map(|maybe_rate| maybe_rate.map_err(|error| error.into()))
        .collect()
}

/// Flip whether a rate is used by lookups and return the new state.
pub fn toggle_exchange_rate_active(rate_id: RateId, connection: &Connection) -> Result<bool, Error> {
    connection
        .prepare(
            "UPDATE exchange_rate SET is_active = NOT is_active
            WHERE id = :id
            RETURNING is_active;",
        )?
        .query_row(&[(":id", &rate_id)], |row| row.get(0))
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingRate,
            error => error.into(),
        })
}

/// Delete an exchange rate by ID. Returns an error if the rate doesn't exist.
pub fn delete_exchange_rate(rate_id: RateId, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM exchange_rate WHERE id = ?1", [rate_id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingRate);
    }

    Ok(())
}

/// Load the active rates into a [RateTable].
pub fn load_rate_table(connection: &Connection) -> Result<RateTable, Error> {
    let rates = connection
        .prepare(
            "SELECT id, currency, rate, effective_date, is_active
            FROM exchange_rate WHERE is_active = 1;",
        )?
        .query_map([], map_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RateTable::new(rates))
}

/// Load the active rates, or fall back to the default rates if they cannot be read.
///
/// Totals are a reporting feature, so a broken rate table is logged rather
/// than failing the page.
pub fn load_rate_table_or_default(connection: &Connection) -> RateTable {
    load_rate_table(connection).unwrap_or_else(|error| {
        tracing::error!("could not load exchange rates, using defaults: {error}");
        RateTable::default()
    })
}

/// Store the default rate of every foreign currency if no rates exist yet.
pub fn bootstrap_exchange_rates(connection: &Connection) -> Result<(), Error> {
    let rate_count: i64 =
        connection.query_row("SELECT COUNT(1) FROM exchange_rate;", [], |row| row.get(0))?;

    if rate_count > 0 {
        return Ok(());
    }

    for currency in Currency::ALL.into_iter().filter(|currency| !currency.is_base()) {
        let rate = NewExchangeRate::new(
            currency,
            Rate::new(currency.default_rate())?,
            BOOTSTRAP_EFFECTIVE_DATE,
            true,
        )?;
        create_exchange_rate(rate, connection)?;
    }

    tracing::info!("Stored default exchange rates");

    Ok(())
}

/// Initialize the exchange rate table and indexes.
pub fn create_exchange_rate_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS exchange_rate (
            id INTEGER PRIMARY KEY,
            currency TEXT NOT NULL,
            rate TEXT NOT NULL,
            effective_date TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1
        );

        CREATE INDEX IF NOT EXISTS idx_exchange_rate_currency_date
            ON exchange_rate(currency, effective_date);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<ExchangeRate, rusqlite::Error> {
    Ok(ExchangeRate {
        id: row.get(0)?,
        currency: row.get(1)?,
        rate: row.get(2)?,
        effective_date: row.get(3)?,
        is_active: row.get(4)?,
    })
}
