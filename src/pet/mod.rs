//! Pets owned by a user and the pages for managing them.

mod create;
mod db;
mod delete;
mod detail;
mod domain;
mod edit;
mod form;
mod list;

pub use create::{create_pet_endpoint, get_new_pet_page};
pub use db::{count_pets, create_pet, create_pet_table, delete_pet, get_pet, get_pets, update_pet};
pub use delete::delete_pet_endpoint;
pub use detail::get_pet_page;
pub use domain::{MAX_BREED_LENGTH, NewPet, Pet, PetFormData, PetId, PetName, Species};
pub use edit::{get_edit_pet_page, update_pet_endpoint};
pub use list::get_pets_page;
