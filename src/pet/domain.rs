//! Pet domain types and form validation.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{Error, auth::UserID, period::parse_optional_date};

pub type PetId = i64;

/// A validated, non-empty pet name of at most 100 characters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetName(String);

impl PetName {
    pub const MAX_LENGTH: usize = 100;

    /// Create a pet name.
    ///
    /// # Errors
    ///
    /// Returns [Error::EmptyPetName] if `name` is blank or
    /// [Error::TextTooLong] if it has more than [PetName::MAX_LENGTH] characters.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyPetName)
        } else if name.chars().count() > Self::MAX_LENGTH {
            Err(Error::TextTooLong {
                field: "Pet name",
                max: Self::MAX_LENGTH,
            })
        } else {
            Ok(Self(name.to_owned()))
        }
    }

    /// Create a pet name without validation.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for PetName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for PetName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The kinds of animal a pet can be.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Species {
    #[default]
    Dog,
    Cat,
    Bird,
    Fish,
    Rodent,
    Reptile,
    Other,
}

impl Species {
    pub const ALL: [Species; 7] = [
        Species::Dog,
        Species::Cat,
        Species::Bird,
        Species::Fish,
        Species::Rodent,
        Species::Reptile,
        Species::Other,
    ];

    /// The value stored in the database and sent in forms.
    pub fn as_str(self) -> &'static str {
        match self {
            Species::Dog => "dog",
            Species::Cat => "cat",
            Species::Bird => "bird",
            Species::Fish => "fish",
            Species::Rodent => "rodent",
            Species::Reptile => "reptile",
            Species::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Species::Dog => "Dog",
            Species::Cat => "Cat",
            Species::Bird => "Bird",
            Species::Fish => "Fish",
            Species::Rodent => "Rodent",
            Species::Reptile => "Reptile",
            Species::Other => "Other",
        }
    }
}

impl FromStr for Species {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim().to_lowercase();

        Species::ALL
            .into_iter()
            .find(|species| species.as_str() == raw)
            .ok_or_else(|| Error::InvalidSpecies(s.to_owned()))
    }
}

impl Display for Species {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A pet and its owner.
#[derive(Clone, Debug, PartialEq)]
pub struct Pet {
    pub id: PetId,
    pub owner_id: UserID,
    pub name: PetName,
    pub species: Species,
    /// Empty when the breed is unknown.
    pub breed: String,
    pub birth_date: Option<Date>,
    pub created_at: OffsetDateTime,
}

/// The validated fields of a pet, used to create or update one.
#[derive(Clone, Debug, PartialEq)]
pub struct NewPet {
    pub name: PetName,
    pub species: Species,
    pub breed: String,
    pub birth_date: Option<Date>,
}

/// The maximum number of characters in a breed.
pub const MAX_BREED_LENGTH: usize = 100;

/// The raw pet form fields.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct PetFormData {
    pub name: String,
    pub species: String,
    #[serde(default)]
    pub breed: String,
    /// An ISO date, or an empty string when the birth date is unknown.
    #[serde(default)]
    pub birth_date: String,
}

impl PetFormData {
    /// Validate the form, rejecting birth dates after `today`.
    pub fn validate(&self, today: Date) -> Result<NewPet, Error> {
        let name = PetName::new(&self.name)?;
        let species = Species::from_str(&self.species)?;
        let breed = self.breed.trim();

        if breed.chars().count() > MAX_BREED_LENGTH {
            return Err(Error::TextTooLong {
                field: "Breed",
                max: MAX_BREED_LENGTH,
            });
        }

        let birth_date = parse_optional_date(&self.birth_date)?;

        if let Some(birth_date) = birth_date
            && birth_date > today
        {
            return Err(Error::FutureDate(birth_date));
        }

        Ok(NewPet {
            name,
            species,
            breed: breed.to_owned(),
            birth_date,
        })
    }
}

impl From<&Pet> for PetFormData {
    fn from(pet: &Pet) -> Self {
        Self {
            name: pet.name.to_string(),
            species: pet.species.as_str().to_owned(),
            breed: pet.breed.clone(),
            birth_date: pet
                .birth_date
                .map(|date| date.to_string())
                .unwrap_or_default(),
        }
    }
}
