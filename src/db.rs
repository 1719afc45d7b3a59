//! Creates the application's database schema and default data.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    auth::create_user_table,
    category::{create_category_table, seed_default_categories},
    expense::create_expense_table,
    pet::create_pet_table,
    rate::{bootstrap_exchange_rates, create_exchange_rate_table},
};

/// Create the tables if they do not exist, then store the default exchange
/// rates and categories when those tables are empty.
///
/// Failing to store the defaults is logged and does not stop the database
/// from being used.
///
/// # Errors
///
/// Returns an error if foreign keys could not be enabled or a table could
/// not be created.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    create_tables(connection)?;

    if let Err(error) = bootstrap_exchange_rates(connection) {
        tracing::error!("Could not store the default exchange rates: {error}");
    }

    if let Err(error) = seed_default_categories(connection) {
        tracing::error!("Could not store the default categories: {error}");
    }

    Ok(())
}

/// Enable foreign key constraints and create every table in one transaction.
pub(crate) fn create_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_pet_table(&transaction)?;
    create_category_table(&transaction)?;
    create_exchange_rate_table(&transaction)?;
    create_expense_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
