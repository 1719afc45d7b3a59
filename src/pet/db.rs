//! Database operations for pets. Every query is scoped to the pet's owner.

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    auth::UserID,
    pet::{NewPet, Pet, PetId, PetName},
};

const PET_COLUMNS: &str = "id, owner_id, name, species, breed, birth_date, created_at";

/// Create a pet for `owner_id` unless they already have `max_pets` pets.
///
/// # Errors
///
/// Returns [Error::TooManyPets] if the owner is at the limit, or
/// [Error::SqlError] if there was an unexpected SQL error.
pub fn create_pet(
    owner_id: UserID,
    pet: NewPet,
    max_pets: u32,
    connection: &Connection,
) -> Result<Pet, Error> {
    if count_pets(owner_id, connection)? >= max_pets {
        return Err(Error::TooManyPets(max_pets));
    }

    connection
        .prepare(&format!(
            "INSERT INTO pet (owner_id, name, species, breed, birth_date, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING {PET_COLUMNS};"
        ))?
        .query_row(
            (
                owner_id.as_i64(),
                pet.name.as_ref(),
                pet.species.as_str(),
                &pet.breed,
                pet.birth_date,
                OffsetDateTime::now_utc(),
            ),
            map_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve a pet owned by `owner_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the pet does not exist or belongs to someone else.
pub fn get_pet(pet_id: PetId, owner_id: UserID, connection: &Connection) -> Result<Pet, Error> {
    connection
        .prepare(&format!(
            "SELECT {PET_COLUMNS} FROM pet WHERE id = :id AND owner_id = :owner_id;"
        ))?
        .query_row(
            &[(":id", &pet_id), (":owner_id", &owner_id.as_i64())],
            map_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve the pets owned by `owner_id` ordered by name.
pub fn get_pets(owner_id: UserID, connection: &Connection) -> Result<Vec<Pet>, Error> {
    connection
        .prepare(&format!(
            "SELECT {PET_COLUMNS} FROM pet WHERE owner_id = :owner_id
            ORDER BY name COLLATE NOCASE ASC, id ASC;"
        ))?
        .query_map(&[(":owner_id", &owner_id.as_i64())], map_row)?
        .map(|maybe_pet| maybe_pet.map_err(|error| error.into()))
        .collect()
}

/// Get the number of pets owned by `owner_id`.
pub fn count_pets(owner_id: UserID, connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM pet WHERE owner_id = ?1",
            [owner_id.as_i64()],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Update a pet owned by `owner_id`.
///
/// # Errors
///
/// Returns [Error::UpdateMissingPet] if no pet owned by `owner_id` has the ID `pet_id`.
pub fn update_pet(
    pet_id: PetId,
    owner_id: UserID,
    pet: NewPet,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE pet SET name = ?1, species = ?2, breed = ?3, birth_date = ?4
        WHERE id = ?5 AND owner_id = ?6",
        (
            pet.name.as_ref(),
            pet.species.as_str(),
            &pet.breed,
            pet.birth_date,
            pet_id,
            owner_id.as_i64(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingPet);
    }

    Ok(())
}

/// Delete a pet owned by `owner_id` and, through the foreign key, its expenses.
///
/// # Errors
///
/// Returns [Error::DeleteMissingPet] if no pet owned by `owner_id` has the ID `pet_id`.
pub fn delete_pet(pet_id: PetId, owner_id: UserID, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM pet WHERE id = ?1 AND owner_id = ?2",
        (pet_id, owner_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingPet);
    }

    Ok(())
}

/// Create the pet table.
pub fn create_pet_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS pet (
            id INTEGER PRIMARY KEY,
            owner_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            species TEXT NOT NULL,
            breed TEXT NOT NULL DEFAULT '',
            birth_date TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY(owner_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_pet_owner ON pet(owner_id);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Pet, rusqlite::Error> {
    let raw_species: String = row.get(3)?;
    let species = raw_species.parse().map_err(|error: Error| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(error))
    })?;
    let name: String = row.get(2)?;

    Ok(Pet {
        id: row.get(0)?,
        owner_id: UserID::new(row.get(1)?),
        name: PetName::new_unchecked(&name),
        species,
        breed: row.get(4)?,
        birth_date: row.get(5)?,
        created_at: row.get(6)?,
    })
}

#[cfg(test)]
mod pet_db_tests {
    use time::macros::date;

    use crate::{
        Error,
        auth::UserID,
        pet::{NewPet, PetName, Species},
        test_utils::{create_test_user, get_test_connection},
    };

    use super::{count_pets, create_pet, delete_pet, get_pet, get_pets, update_pet};

    fn new_pet(name: &str) -> NewPet {
        NewPet {
            name: PetName::new_unchecked(name),
            species: Species::Cat,
            breed: "Siamese".to_owned(),
            birth_date: Some(date!(2021 - 04 - 12)),
        }
    }

    #[test]
    fn create_and_get_pet() {
        let connection = get_test_connection();
        let owner = create_test_user("alice", &connection);

        let pet = create_pet(owner.id, new_pet("Tom"), 50, &connection).unwrap();

        assert_eq!(pet.owner_id, owner.id);
        assert_eq!(pet.species, Species::Cat);
        assert_eq!(pet.birth_date, Some(date!(2021 - 04 - 12)));
        assert_eq!(get_pet(pet.id, owner.id, &connection), Ok(pet));
    }

    #[test]
    fn other_users_cannot_see_pet() {
        let connection = get_test_connection();
        let alice = create_test_user("alice", &connection);
        let bob = create_test_user("bob", &connection);
        let pet = create_pet(alice.id, new_pet("Tom"), 50, &connection).unwrap();

        assert_eq!(get_pet(pet.id, bob.id, &connection), Err(Error::NotFound));
        assert_eq!(get_pets(bob.id, &connection), Ok(vec![]));
        assert_eq!(
            update_pet(pet.id, bob.id, new_pet("Jerry"), &connection),
            Err(Error::UpdateMissingPet)
        );
        assert_eq!(
            delete_pet(pet.id, bob.id, &connection),
            Err(Error::DeleteMissingPet)
        );
    }

    #[test]
    fn enforces_pet_limit() {
        let connection = get_test_connection();
        let owner = create_test_user("alice", &connection);
        create_pet(owner.id, new_pet("Tom"), 2, &connection).unwrap();
        create_pet(owner.id, new_pet("Felix"), 2, &connection).unwrap();

        assert_eq!(
            create_pet(owner.id, new_pet("Garfield"), 2, &connection),
            Err(Error::TooManyPets(2))
        );
        assert_eq!(count_pets(owner.id, &connection), Ok(2));
    }

    #[test]
    fn lists_pets_by_name() {
        let connection = get_test_connection();
        let owner = create_test_user("alice", &connection);
        create_pet(owner.id, new_pet("tom"), 50, &connection).unwrap();
        create_pet(owner.id, new_pet("Felix"), 50, &connection).unwrap();

        let names: Vec<String> = get_pets(owner.id, &connection)
            .unwrap()
            .into_iter()
            .map(|pet| pet.name.to_string())
            .collect();

        assert_eq!(names, vec!["Felix", "tom"]);
    }

    #[test]
    fn update_pet_changes_fields() {
        let connection = get_test_connection();
        let owner = create_test_user("alice", &connection);
        let pet = create_pet(owner.id, new_pet("Tom"), 50, &connection).unwrap();
        let update = NewPet {
            name: PetName::new_unchecked("Thomas"),
            species: Species::Other,
            breed: String::new(),
            birth_date: None,
        };

        update_pet(pet.id, owner.id, update, &connection).unwrap();

        let updated = get_pet(pet.id, owner.id, &connection).unwrap();
        assert_eq!(updated.name.as_ref(), "Thomas");
        assert_eq!(updated.species, Species::Other);
        assert_eq!(updated.breed, "");
        assert_eq!(updated.birth_date, None);
        assert_eq!(updated.created_at, pet.created_at);
    }

    #[test]
    fn count_pets_for_unknown_user_is_zero() {
        let connection = get_test_connection();

        assert_eq!(count_pets(UserID::new(999), &connection), Ok(0));
    }
}
