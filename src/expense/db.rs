//! Database operations for expenses.
//!
//! Expenses belong to users through their pet, so every query joins on the
//! pet table and filters by the pet's owner.

use rusqlite::{Connection, OptionalExtension, Row, params_from_iter, types::Value};

use crate::{
    Error,
    auth::UserID,
    category::CategoryId,
    currency::Currency,
    expense::{Expense, ExpenseId, NewExpense},
    period::DateRange,
    pet::PetId,
};

const EXPENSE_COLUMNS: &str = "expense.id, expense.pet_id, expense.category_id, expense.amount, \
    expense.currency, expense.date, expense.description, expense.receipt";

/// Create an expense for one of `owner_id`'s pets.
///
/// # Errors
///
/// Returns:
/// - [Error::InvalidPet] if the pet does not exist or belongs to someone else,
/// - [Error::InvalidCategory] if the category does not exist,
/// - [Error::TooManyExpenses] if the pet already has `max_expenses` expenses,
/// - [Error::SqlError] if there was an unexpected SQL error.
pub fn create_expense(
    owner_id: UserID,
    expense: NewExpense,
    max_expenses: u32,
    connection: &Connection,
) -> Result<Expense, Error> {
    check_pet_and_category(owner_id, &expense, connection)?;

    if count_expenses_for_pet(expense.pet_id, None, connection)? >= max_expenses {
        return Err(Error::TooManyExpenses(max_expenses));
    }

    connection
        .prepare(
            "INSERT INTO expense (pet_id, category_id, amount, currency, date, description, receipt)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING id, pet_id, category_id, amount, currency, date, description, receipt;",
        )?
        .query_row(
            (
                expense.pet_id,
                expense.category_id,
                expense.amount,
                expense.currency,
                expense.date,
                &expense.description,
                &expense.receipt,
            ),
            map_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve an expense belonging to one of `owner_id`'s pets.
///
/// # Errors
///
/// Returns [Error::NotFound] if the expense does not exist or belongs to someone else.
pub fn get_expense(
    expense_id: ExpenseId,
    owner_id: UserID,
    connection: &Connection,
) -> Result<Expense, Error> {
    connection
        .prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expense
            INNER JOIN pet ON pet.id = expense.pet_id
            WHERE expense.id = :id AND pet.owner_id = :owner_id;"
        ))?
        .query_row(
            &[(":id", &expense_id), (":owner_id", &owner_id.as_i64())],
            map_row,
        )
        .map_err(|error| error.into())
}

/// Replace every field of an expense belonging to `owner_id`, including its receipt.
///
/// The expense may be moved to another of the owner's pets as long as that pet
/// has room for it.
///
/// # Errors
///
/// Returns [Error::UpdateMissingExpense] if the expense does not exist or
/// belongs to someone else, and the same validation errors as [create_expense].
pub fn update_expense(
    expense_id: ExpenseId,
    owner_id: UserID,
    expense: NewExpense,
    max_expenses: u32,
    connection: &Connection,
) -> Result<(), Error> {
    let current = match get_expense(expense_id, owner_id, connection) {
        Ok(current) => current,
        Err(Error::NotFound) => return Err(Error::UpdateMissingExpense),
        Err(error) => return Err(error),
    };

    check_pet_and_category(owner_id, &expense, connection)?;

    if current.pet_id != expense.pet_id
        && count_expenses_for_pet(expense.pet_id, Some(expense_id), connection)? >= max_expenses
    {
        return Err(Error::TooManyExpenses(max_expenses));
    }

    let rows_affected = connection.execute(
        "UPDATE expense
        SET pet_id = ?1, category_id = ?2, amount = ?3, currency = ?4, date = ?5,
            description = ?6, receipt = ?7
        WHERE id = ?8",
        (
            expense.pet_id,
            expense.category_id,
            expense.amount,
            expense.currency,
            expense.date,
            &expense.description,
            &expense.receipt,
            expense_id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingExpense);
    }

    Ok(())
}

/// Delete an expense belonging to `owner_id`.
///
/// # Errors
///
/// Returns [Error::DeleteMissingExpense] if the expense does not exist or belongs to someone else.
pub fn delete_expense(
    expense_id: ExpenseId,
    owner_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM expense
        WHERE id = ?1 AND pet_id IN (SELECT id FROM pet WHERE owner_id = ?2)",
        (expense_id, owner_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingExpense);
    }

    Ok(())
}

/// Get the number of expenses across all of `owner_id`'s pets.
pub fn count_expenses(owner_id: UserID, connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row(
            "SELECT COUNT(expense.id) FROM expense
            INNER JOIN pet ON pet.id = expense.pet_id
            WHERE pet.owner_id = ?1",
            [owner_id.as_i64()],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Get the receipt file names of a pet's expenses.
pub fn get_receipts_for_pet(
    pet_id: PetId,
    owner_id: UserID,
    connection: &Connection,
) -> Result<Vec<String>, Error> {
    connection
        .prepare(
            "SELECT expense.receipt FROM expense
            INNER JOIN pet ON pet.id = expense.pet_id
            WHERE expense.pet_id = ?1 AND pet.owner_id = ?2 AND expense.receipt IS NOT NULL",
        )?
        .query_map((pet_id, owner_id.as_i64()), |row| row.get(0))?
        .map(|maybe_receipt| maybe_receipt.map_err(|error| error.into()))
        .collect()
}

/// The receipt file names of `owner_id`'s expenses in a category.
pub fn get_receipts_for_category(
    category_id: CategoryId,
    owner_id: UserID,
    connection: &Connection,
) -> Result<Vec<String>, Error> {
    connection
        .prepare(
            "SELECT expense.receipt FROM expense
            INNER JOIN pet ON pet.id = expense.pet_id
            WHERE expense.category_id = ?1 AND pet.owner_id = ?2 AND expense.receipt IS NOT NULL",
        )?
        .query_map((category_id, owner_id.as_i64()), |row| row.get(0))?
        .map(|maybe_receipt| maybe_receipt.map_err(|error| error.into()))
        .collect()
}

/// Count the expenses in a category that belong to anyone but `owner_id`.
pub fn count_other_users_expenses_in_category(
    category_id: CategoryId,
    owner_id: UserID,
    connection: &Connection,
) -> Result<u32, Error> {
    connection
        .query_row(
            "SELECT COUNT(1) FROM expense
            INNER JOIN pet ON pet.id = expense.pet_id
            WHERE expense.category_id = ?1 AND pet.owner_id != ?2",
            (category_id, owner_id.as_i64()),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Whether any expense still refers to the receipt file `file_name`.
pub(crate) fn is_receipt_in_use(file_name: &str, connection: &Connection) -> Result<bool, Error> {
    connection
        .query_row(
            "SELECT 1 FROM expense WHERE receipt = ?1 LIMIT 1",
            [file_name],
            |_| Ok(()),
        )
        .optional()
        .map(|row| row.is_some())
        .map_err(|error| error.into())
}

/// Narrows down which of a user's expenses [get_filtered_expenses] and
/// [get_expense_page] return. `None` fields match everything.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ExpenseFilter {
    pub pet_id: Option<PetId>,
    pub category_id: Option<CategoryId>,
    pub currency: Option<Currency>,
    /// Include expenses within the range (inclusive).
    pub date_range: Option<DateRange>,
}

/// An expense with the names needed to display it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseListItem {
    pub expense: Expense,
    pub pet_name: String,
    pub category_name: String,
    pub category_color: String,
}

/// Get the number of `owner_id`'s expenses that match `filter`.
pub fn count_filtered_expenses(
    owner_id: UserID,
    filter: &ExpenseFilter,
    connection: &Connection,
) -> Result<u64, Error> {
    let (where_clause, query_parameters) = build_where_clause(owner_id, filter);
    let query = format!(
        "SELECT COUNT(expense.id) FROM expense
        INNER JOIN pet ON pet.id = expense.pet_id
        {where_clause}"
    );

    connection
        .query_row(&query, params_from_iter(query_parameters.iter()), |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Get every expense of `owner_id` that matches `filter`, newest first.
pub fn get_filtered_expenses(
    owner_id: UserID,
    filter: &ExpenseFilter,
    connection: &Connection,
) -> Result<Vec<ExpenseListItem>, Error> {
    query_expense_list(owner_id, filter, None, connection)
}

/// Get up to `limit` expenses of `owner_id` that match `filter`, newest first,
/// skipping the first `offset`.
pub fn get_expense_page(
    owner_id: UserID,
    filter: &ExpenseFilter,
    limit: u64,
    offset: u64,
    connection: &Connection,
) -> Result<Vec<ExpenseListItem>, Error> {
    query_expense_list(owner_id, filter, Some((limit, offset)), connection)
}

fn query_expense_list(
    owner_id: UserID,
    filter: &ExpenseFilter,
    limit_and_offset: Option<(u64, u64)>,
    connection: &Connection,
) -> Result<Vec<ExpenseListItem>, Error> {
    let (where_clause, query_parameters) = build_where_clause(owner_id, filter);
    let mut query = format!(
        "SELECT {EXPENSE_COLUMNS}, pet.name, expense_category.name, expense_category.color
        FROM expense
        INNER JOIN pet ON pet.id = expense.pet_id
        INNER JOIN expense_category ON expense_category.id = expense.category_id
        {where_clause}
        ORDER BY expense.date DESC, expense.id DESC"
    );

    if let Some((limit, offset)) = limit_and_offset {
        query.push_str(&format!(" LIMIT {limit} OFFSET {offset}"));
    }

    connection
        .prepare(&query)?
        .query_map(params_from_iter(query_parameters.iter()), |row| {
            Ok(ExpenseListItem {
                expense: map_row(row)?,
                pet_name: row.get(8)?,
                category_name: row.get(9)?,
                category_color: row.get(10)?,
            })
        })?
        .map(|maybe_item| maybe_item.map_err(|error| error.into()))
        .collect()
}

fn build_where_clause(owner_id: UserID, filter: &ExpenseFilter) -> (String, Vec<Value>) {
    let mut where_clause_parts = vec!["pet.owner_id = ?1".to_owned()];
    let mut query_parameters = vec![Value::Integer(owner_id.as_i64())];

    if let Some(pet_id) = filter.pet_id {
        query_parameters.push(Value::Integer(pet_id));
        where_clause_parts.push(format!("expense.pet_id = ?{}", query_parameters.len()));
    }

    if let Some(category_id) = filter.category_id {
        query_parameters.push(Value::Integer(category_id));
        where_clause_parts.push(format!(
            "expense.category_id = ?{}",
            query_parameters.len()
        ));
    }

    if let Some(currency) = filter.currency {
        query_parameters.push(Value::Text(currency.code().to_owned()));
        where_clause_parts.push(format!("expense.currency = ?{}", query_parameters.len()));
    }

    if let Some(date_range) = filter.date_range {
        where_clause_parts.push(format!(
            "expense.date BETWEEN ?{} AND ?{}",
            query_parameters.len() + 1,
            query_parameters.len() + 2,
        ));
        query_parameters.push(Value::Text(date_range.start.to_string()));
        query_parameters.push(Value::Text(date_range.end.to_string()));
    }

    (
        format!("WHERE {}", where_clause_parts.join(" AND ")),
        query_parameters,
    )
}

fn check_pet_and_category(
    owner_id: UserID,
    expense: &NewExpense,
    connection: &Connection,
) -> Result<(), Error> {
    let pet_exists = connection
        .query_row(
            "SELECT 1 FROM pet WHERE id = ?1 AND owner_id = ?2",
            (expense.pet_id, owner_id.as_i64()),
            |_| Ok(()),
        )
        .optional()?
        .is_some();

    if !pet_exists {
        return Err(Error::InvalidPet);
    }

    let category_exists = connection
        .query_row(
            "SELECT 1 FROM expense_category WHERE id = ?1",
            [expense.category_id],
            |_| Ok(()),
        )
        .optional()?
        .is_some();

    if !category_exists {
        return Err(Error::InvalidCategory);
    }

    Ok(())
}

/// Count a pet's expenses, ignoring `excluded_expense` if given.
fn count_expenses_for_pet(
    pet_id: PetId,
    excluded_expense: Option<ExpenseId>,
    connection: &Connection,
) -> Result<u32, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM expense WHERE pet_id = ?1 AND (?2 IS NULL OR id != ?2)",
            (pet_id, excluded_expense),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Create the expense table and its indexes.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS expense (
            id INTEGER PRIMARY KEY,
            pet_id INTEGER NOT NULL,
            category_id INTEGER NOT NULL,
            amount TEXT NOT NULL,
            currency TEXT NOT NULL,
            date TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            receipt TEXT,
            FOREIGN KEY(pet_id) REFERENCES pet(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(category_id) REFERENCES expense_category(id)
                ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_expense_pet_date ON expense(pet_id, date);
        CREATE INDEX IF NOT EXISTS idx_expense_category ON expense(category_id);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    Ok(Expense {
        id: row.get(0)?,
        pet_id: row.get(1)?,
        category_id: row.get(2)?,
        amount: row.get(3)?,
        currency: row.get(4)?,
        date: row.get(5)?,
        description: row.get(6)?,
        receipt: row.get(7)?,
    })
}

#[cfg(test)]
mod expense_db_tests {
    use std::str::FromStr;

    use time::macros::date;

    use crate::{
        Error,
        currency::{Amount, Currency},
        expense::NewExpense,
        period::DateRange,
        pet::{NewPet, PetName, Species, create_pet},
        test_utils::{TestFixture, create_test_user},
    };

    use super::{
        ExpenseFilter, count_expenses, count_filtered_expenses,
        count_other_users_expenses_in_category, create_expense, delete_expense, get_expense,
        get_expense_page, get_filtered_expenses, get_receipts_for_category, get_receipts_for_pet,
        is_receipt_in_use, update_expense,
    };

    fn new_expense(fixture: &TestFixture, amount: &str, date: time::Date) -> NewExpense {
        NewExpense {
            pet_id: fixture.pet.id,
            category_id: fixture.category.id,
            amount: Amount::from_str(amount).unwrap(),
            currency: Currency::Eur,
            date,
            description: "Kibble".to_owned(),
            receipt: None,
        }
    }

    #[test]
    fn create_and_get_expense() {
        let fixture = TestFixture::new();

        let expense = create_expense(
            fixture.user.id,
            new_expense(&fixture, "19.99", date!(2025 - 01 - 10)),
            1000,
            &fixture.connection,
        )
        .unwrap();

        assert_eq!(expense.amount.to_string(), "19.99");
        assert_eq!(expense.currency, Currency::Eur);
        assert_eq!(
            get_expense(expense.id, fixture.user.id, &fixture.connection),
            Ok(expense)
        );
    }

    #[test]
    fn cannot_add_expense_to_other_users_pet() {
        let fixture = TestFixture::new();
        let stranger = create_test_user("mallory", &fixture.connection);

        let result = create_expense(
            stranger.id,
            new_expense(&fixture, "1", date!(2025 - 01 - 10)),
            1000,
            &fixture.connection,
        );

        assert_eq!(result, Err(Error::InvalidPet));
    }

    #[test]
    fn rejects_unknown_category() {
        let fixture = TestFixture::new();
        let mut expense = new_expense(&fixture, "1", date!(2025 - 01 - 10));
        expense.category_id += 100;

        let result = create_expense(fixture.user.id, expense, 1000, &fixture.connection);

        assert_eq!(result, Err(Error::InvalidCategory));
    }

    #[test]
    fn enforces_expense_limit() {
        let fixture = TestFixture::new();
        create_expense(
            fixture.user.id,
            new_expense(&fixture, "1", date!(2025 - 01 - 10)),
            1,
            &fixture.connection,
        )
        .unwrap();

        let result = create_expense(
            fixture.user.id,
            new_expense(&fixture, "2", date!(2025 - 01 - 11)),
            1,
            &fixture.connection,
        );

        assert_eq!(result, Err(Error::TooManyExpenses(1)));
    }

    #[test]
    fn other_users_cannot_see_update_or_delete_expense() {
        let fixture = TestFixture::new();
        let expense = fixture.create_expense("10", "RUB");
        let stranger = create_test_user("mallory", &fixture.connection);

        assert_eq!(
            get_expense(expense.id, stranger.id, &fixture.connection),
            Err(Error::NotFound)
        );
        assert_eq!(
            update_expense(
                expense.id,
                stranger.id,
                new_expense(&fixture, "1", date!(2025 - 01 - 10)),
                1000,
                &fixture.connection,
            ),
            Err(Error::UpdateMissingExpense)
        );
        assert_eq!(
            delete_expense(expense.id, stranger.id, &fixture.connection),
            Err(Error::DeleteMissingExpense)
        );
        assert_eq!(count_expenses(stranger.id, &fixture.connection), Ok(0));
        assert_eq!(count_expenses(fixture.user.id, &fixture.connection), Ok(1));
    }

    #[test]
    fn update_replaces_fields_and_receipt() {
        let fixture = TestFixture::new();
        let expense = fixture.create_expense("10", "RUB");
        let mut update = new_expense(&fixture, "42.10", date!(2024 - 12 - 31));
        update.receipt = Some("receipt.png".to_owned());

        update_expense(expense.id, fixture.user.id, update, 1000, &fixture.connection).unwrap();

        let updated = get_expense(expense.id, fixture.user.id, &fixture.connection).unwrap();
        assert_eq!(updated.amount.to_string(), "42.10");
        assert_eq!(updated.currency, Currency::Eur);
        assert_eq!(updated.date, date!(2024 - 12 - 31));
        assert_eq!(updated.receipt.as_deref(), Some("receipt.png"));
        assert_eq!(
            get_receipts_for_pet(fixture.pet.id, fixture.user.id, &fixture.connection),
            Ok(vec!["receipt.png".to_owned()])
        );
        assert_eq!(is_receipt_in_use("receipt.png", &fixture.connection), Ok(true));
        assert_eq!(is_receipt_in_use("other.png", &fixture.connection), Ok(false));
    }

    #[test]
    fn category_queries_only_count_the_owners_expenses() {
        let fixture = TestFixture::new();
        create_expense(
            fixture.user.id,
            NewExpense {
                receipt: Some("mine.png".to_owned()),
                ..fixture.new_expense("10", "RUB")
            },
            1000,
            &fixture.connection,
        )
        .unwrap();
        let stranger = create_test_user("mallory", &fixture.connection);

        assert_eq!(
            get_receipts_for_category(fixture.category.id, fixture.user.id, &fixture.connection),
            Ok(vec!["mine.png".to_owned()])
        );
        assert_eq!(
            get_receipts_for_category(fixture.category.id, stranger.id, &fixture.connection),
            Ok(vec![])
        );
        assert_eq!(
            count_other_users_expenses_in_category(
                fixture.category.id,
                fixture.user.id,
                &fixture.connection
            ),
            Ok(0)
        );
        assert_eq!(
            count_other_users_expenses_in_category(
                fixture.category.id,
                stranger.id,
                &fixture.connection
            ),
            Ok(1)
        );
    }

    #[test]
    fn moving_expense_to_full_pet_is_rejected() {
        let fixture = TestFixture::new();
        let expense = fixture.create_expense("10", "RUB");
        let other_pet = create_pet(
            fixture.user.id,
            NewPet {
                name: PetName::new_unchecked("Felix"),
                species: Species::Cat,
                breed: String::new(),
                birth_date: None,
            },
            50,
            &fixture.connection,
        )
        .unwrap();
        let mut existing = new_expense(&fixture, "1", date!(2025 - 01 - 10));
        existing.pet_id = other_pet.id;
        create_expense(fixture.user.id, existing.clone(), 1, &fixture.connection).unwrap();

        let result = update_expense(expense.id, fixture.user.id, existing, 1, &fixture.connection);

        assert_eq!(result, Err(Error::TooManyExpenses(1)));
    }

    #[test]
    fn filters_and_orders_expenses() {
        let fixture = TestFixture::new();
        for (amount, date) in [
            ("1", date!(2025 - 01 - 01)),
            ("2", date!(2025 - 01 - 15)),
            ("3", date!(2025 - 02 - 01)),
        ] {
            create_expense(
                fixture.user.id,
                new_expense(&fixture, amount, date),
                1000,
                &fixture.connection,
            )
            .unwrap();
        }
        fixture.create_expense("4", "USD");
        let filter = ExpenseFilter {
            currency: Some(Currency::Eur),
            date_range: Some(DateRange {
                start: date!(2025 - 01 - 10),
                end: date!(2025 - 02 - 28),
            }),
            ..Default::default()
        };

        let items = get_filtered_expenses(fixture.user.id, &filter, &fixture.connection).unwrap();

        let amounts: Vec<String> = items
            .iter()
            .map(|item| item.expense.amount.to_string())
            .collect();
        assert_eq!(amounts, vec!["3.00", "2.00"]);
        assert_eq!(items[0].pet_name, fixture.pet.name.as_ref());
        assert_eq!(items[0].category_name, fixture.category.name.as_ref());
        assert_eq!(
            count_filtered_expenses(fixture.user.id, &filter, &fixture.connection),
            Ok(2)
        );
        assert_eq!(
            count_filtered_expenses(
                fixture.user.id,
                &ExpenseFilter::default(),
                &fixture.connection
            ),
            Ok(4)
        );
    }

    #[test]
    fn pages_through_expenses() {
        let fixture = TestFixture::new();
        for day in 1..=5 {
            create_expense(
                fixture.user.id,
                new_expense(
                    &fixture,
                    &day.to_string(),
                    date!(2025 - 01 - 01).replace_day(day).unwrap(),
                ),
                1000,
                &fixture.connection,
            )
            .unwrap();
        }

        let page = get_expense_page(
            fixture.user.id,
            &ExpenseFilter::default(),
            2,
            2,
            &fixture.connection,
        )
        .unwrap();

        let amounts: Vec<String> = page
            .iter()
            .map(|item| item.expense.amount.to_string())
            .collect();
        assert_eq!(amounts, vec!["3.00", "2.00"]);
    }

    #[test]
    fn filter_by_pet_excludes_other_pets() {
        let fixture = TestFixture::new();
        fixture.create_expense("10", "RUB");
        let filter = ExpenseFilter {
            pet_id: Some(fixture.pet.id + 1),
            ..Default::default()
        };

        assert_eq!(
            get_filtered_expenses(fixture.user.id, &filter, &fixture.connection),
            Ok(vec![])
        );
    }
}
