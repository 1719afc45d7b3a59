//! Database operations for expense categories.

use std::collections::HashMap;

use rusqlite::{Connection, Row};

use crate::{
    Error,
    category::{CategoryColor, CategoryId, CategoryName, ExpenseCategory, NewCategory},
};

/// The categories stored on first start.
const DEFAULT_CATEGORIES: [(&str, &str, &str); 5] = [
    ("Food", "Food, treats and supplements", "#f59e0b"),
    ("Veterinarian", "Check-ups, vaccinations and treatment", "#ef4444"),
    ("Toys", "Toys and accessories", "#3b82f6"),
    ("Grooming", "Grooming, bathing and hygiene", "#10b981"),
    ("Other", "Anything else", "#6b7280"),
];

/// Create a category and return it with its generated ID.
pub fn create_category(
    category: NewCategory,
    connection: &Connection,
) -> Result<ExpenseCategory, Error> {
    connection
        .prepare(
            "INSERT INTO expense_category (name, description, color) VALUES (?1, ?2, ?3)
            RETURNING id, name, description, color;",
        )?
        .query_row(
            (
                category.name.as_ref(),
                &category.description,
                category.color.as_ref(),
            ),
            map_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve a single category by ID.
pub fn get_category(
    category_id: CategoryId,
    connection: &Connection,
) -> Result<ExpenseCategory, Error> {
    connection
        .prepare("SELECT id, name, description, color FROM expense_category WHERE id = :id;")?
        .query_row(&[(":id", &category_id)], map_row)
        .map_err(|error| error.into())
}

/// Retrieve all categories ordered alphabetically by name.
pub fn get_all_categories(connection: &Connection) -> Result<Vec<ExpenseCategory>, Error> {
    connection
        .prepare("SELECT id, name, description, color FROM expense_category ORDER BY name ASC;")?
        .query_map([], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Update a category. Returns an error if the category doesn't exist.
pub fn update_category(
    category_id: CategoryId,
    category: NewCategory,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE expense_category SET name = ?1, description = ?2, color = ?3 WHERE id = ?4",
        (
            category.name.as_ref(),
            &category.description,
            category.color.as_ref(),
            category_id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingCategory);
    }

    Ok(())
}

/// Delete a category and, through the foreign key, all of its expenses.
pub fn delete_category(category_id: CategoryId, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM expense_category WHERE id = ?1", [category_id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingCategory);
    }

    Ok(())
}

/// Count the expenses in each category across all users.
pub fn count_expenses_per_category(
    connection: &Connection,
) -> Result<HashMap<CategoryId, u32>, Error> {
    let result: Result<HashMap<CategoryId, u32>, rusqlite::Error> = connection
        .prepare("SELECT category_id, COUNT(1) FROM expense GROUP BY category_id")?
        .query_map((), |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect();

    result.map_err(Error::from)
}

/// Store the default categories if there are no categories yet.
pub fn seed_default_categories(connection: &Connection) -> Result<(), Error> {
    let category_count: i64 =
        connection.query_row("SELECT COUNT(1) FROM expense_category;", [], |row| {
            row.get(0)
        })?;

    if category_count > 0 {
        return Ok(());
    }

    for (name, description, color) in DEFAULT_CATEGORIES {
        create_category(
            NewCategory {
                name: CategoryName::new_unchecked(name),
                description: description.to_owned(),
                color: CategoryColor::new_unchecked(color),
            },
            connection,
        )?;
    }

    tracing::info!("Stored {} default categories", DEFAULT_CATEGORIES.len());

    Ok(())
}

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS expense_category (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL DEFAULT '',
            color TEXT NOT NULL DEFAULT '#6b7280'
        );

        CREATE INDEX IF NOT EXISTS idx_expense_category_name ON expense_category(name);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<ExpenseCategory, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;
    let description = row.get(2)?;
    let raw_color: String = row.get(3)?;

    Ok(ExpenseCategory {
        id,
        name: CategoryName::new_unchecked(&raw_name),
        description,
        color: CategoryColor::new_unchecked(&raw_color),
    })
}
