//! Pet deletion endpoint.

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    endpoints,
    expense::{get_receipts_for_pet, remove_unused_receipts},
    pet::{PetId, delete_pet},
};

/// The state needed for deleting a pet.
#[derive(Debug, Clone)]
pub struct DeletePetState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The directory receipt images are stored in.
    pub media_dir: PathBuf,
}

impl FromRef<AppState> for DeletePetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            media_dir: state.media_dir.clone(),
        }
    }
}

/// Delete a pet with its expenses and receipt images, then go back to the pet list.
pub async fn delete_pet_endpoint(
    Path(pet_id): Path<PetId>,
    State(state): State<DeletePetState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let receipts = match get_receipts_for_pet(pet_id, user_id, &connection) {
        Ok(receipts) => receipts,
        Err(error) => {
            tracing::error!("Could not get the receipts of pet {pet_id}: {error}");
            return error.into_alert_response();
        }
    };

    match delete_pet(pet_id, user_id, &connection) {
        Ok(_) => {
            tracing::info!("User {user_id} deleted pet {pet_id}");
            remove_unused_receipts(&receipts, &state.media_dir, &connection);

            (
                HxRedirect(endpoints::PETS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(Error::DeleteMissingPet) => Error::DeleteMissingPet.into_alert_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while deleting pet {pet_id}: {error}");
            error.into_alert_response()
        }
    }
}
