use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Date, Duration, OffsetDateTime};

use pet_cost_tracker::{
    Amount, Currency, Limits, NewExpense, NewPet, PasswordHash, PetName, Species, Username,
    ValidatedPassword, create_expense, create_pet, create_user, get_all_categories, initialize_db,
};

/// A utility for creating a test database for the web server of pet_cost_tracker.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user 'demo' with the password 'test'...");
    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user(Username::new("demo")?, password_hash, &conn)?;

    let limits = Limits::default();
    let today = OffsetDateTime::now_utc().date();

    println!("Creating pets...");
    let pets = [
        ("Rex", Species::Dog, "Beagle", Date::from_calendar_date(2019, time::Month::May, 4).ok()),
        ("Murka", Species::Cat, "", None),
        ("Kesha", Species::Bird, "Budgerigar", Some(today - Duration::days(400))),
    ]
    .into_iter()
    .map(|(name, species, breed, birth_date)| {
        create_pet(
            user.id,
            NewPet {
                name: PetName::new_unchecked(name),
                species,
                breed: breed.to_owned(),
                birth_date,
            },
            limits.max_pets_per_user,
            &conn,
        )
    })
    .collect::<Result<Vec<_>, _>>()?;

    let categories = get_all_categories(&conn)?;
    if categories.is_empty() {
        eprintln!("The database has no expense categories to assign expenses to.");
        exit(1);
    }

    println!("Creating expenses...");
    let amounts = [
        ("1250.00", Currency::Rub),
        ("18.99", Currency::Usd),
        ("4300.50", Currency::Rub),
        ("42.00", Currency::Eur),
        ("799.00", Currency::Rub),
        ("7.25", Currency::Usd),
    ];
    let mut expense_count = 0;

    for (pet_index, pet) in pets.iter().enumerate() {
        for day in 0..30i64 {
            let index = pet_index + day as usize;
            let (amount, currency) = amounts[index % amounts.len()];
            let category = &categories[index % categories.len()];

            create_expense(
                user.id,
                NewExpense {
                    pet_id: pet.id,
                    category_id: category.id,
                    amount: amount.parse::<Amount>()?,
                    currency,
                    date: today - Duration::days(day * 6 + pet_index as i64),
                    description: format!("{} for {}", category.name.as_ref(), pet.name.as_ref()),
                    receipt: None,
                },
                limits.max_expenses_per_pet,
                &conn,
            )?;
            expense_count += 1;
        }
    }

    println!(
        "Created {} pets and {expense_count} expenses. Success!",
        pets.len()
    );

    Ok(())
}
