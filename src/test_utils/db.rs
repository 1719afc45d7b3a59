use std::{
    path::PathBuf,
    sync::atomic::{AtomicUsize, Ordering},
};

use rusqlite::Connection;
use time::macros::date;

use crate::{
    auth::{PasswordHash, User, Username, create_user},
    category::{CategoryColor, CategoryName, ExpenseCategory, NewCategory, create_category},
    currency::{Amount, Currency},
    db::create_tables,
    expense::{Expense, NewExpense, create_expense},
    pet::{NewPet, Pet, PetName, Species, create_pet},
};

/// An in-memory database with every table but no default rates or categories.
pub(crate) fn get_test_connection() -> Connection {
    let connection = Connection::open_in_memory().unwrap();
    create_tables(&connection).unwrap();
    connection
}

pub(crate) fn create_test_user(username: &str, connection: &Connection) -> User {
    create_user(
        Username::new_unchecked(username),
        PasswordHash::new_unchecked("hunter2"),
        connection,
    )
    .unwrap()
}

/// Create an empty directory for receipt files that is unique to the test.
pub(crate) fn temp_media_dir(name: &str) -> PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    let dir = std::env::temp_dir().join(format!(
        "pet_cost_tracker_{name}_{}_{}",
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();

    dir
}

/// A database with one user who owns one pet, and one category.
pub(crate) struct TestFixture {
    pub connection: Connection,
    pub user: User,
    pub pet: Pet,
    pub category: ExpenseCategory,
}

impl TestFixture {
    pub fn new() -> Self {
        let connection = get_test_connection();
        let user = create_test_user("alice", &connection);
        let pet = create_pet(
            user.id,
            NewPet {
                name: PetName::new_unchecked("Rex"),
                species: Species::Dog,
                breed: "Beagle".to_owned(),
                birth_date: Some(date!(2020 - 05 - 17)),
            },
            50,
            &connection,
        )
        .unwrap();
        let category = create_category(
            NewCategory {
                name: CategoryName::new_unchecked("Food"),
                description: String::new(),
                color: CategoryColor::new_unchecked("#f59e0b"),
            },
            &connection,
        )
        .unwrap();

        Self {
            connection,
            user,
            pet,
            category,
        }
    }

    /// An expense for the fixture's pet and category dated 2025-01-15.
    pub fn new_expense(&self, amount: &str, currency: &str) -> NewExpense {
        NewExpense {
            pet_id: self.pet.id,
            category_id: self.category.id,
            amount: amount.parse::<Amount>().unwrap(),
            currency: currency.parse::<Currency>().unwrap(),
            date: date!(2025 - 01 - 15),
            description: String::new(),
            receipt: None,
        }
    }

    pub fn create_expense(&self, amount: &str, currency: &str) -> Expense {
        create_expense(
            self.user.id,
            self.new_expense(amount, currency),
            1000,
            &self.connection,
        )
        .unwrap()
    }
}
