//! Pet editing page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::html;
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    auth::UserID,
    endpoints,
    html::{FORM_CONTAINER_STYLE, base},
    navigation::NavBar,
    pet::{
        PetFormData, PetId,
        form::{PetFormAction, pet_form_view},
        get_pet, update_pet,
    },
    timezone::get_local_offset,
};

/// The state needed for editing a pet.
#[derive(Debug, Clone)]
pub struct EditPetState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Europe/Moscow".
    pub local_timezone: String,
}

impl FromRef<AppState> for EditPetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Render the pet editing page.
pub async fn get_edit_pet_page(
    Path(pet_id): Path<PetId>,
    State(state): State<EditPetState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let local_offset = get_local_offset(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;
    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let pet = get_pet(pet_id, user_id, &connection)?;
    let update_endpoint = endpoints::format_endpoint(endpoints::PET_API, pet_id);

    let nav_bar = NavBar::new(endpoints::PETS_VIEW).into_html();
    let form = pet_form_view(
        PetFormAction::Update {
            endpoint: &update_endpoint,
        },
        &PetFormData::from(&pet),
        today,
        "",
    );

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    Ok(base(&format!("Edit {}", pet.name), &[], &content).into_response())
}

/// Handle pet update form submission.
pub async fn update_pet_endpoint(
    Path(pet_id): Path<PetId>,
    State(state): State<EditPetState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<PetFormData>,
) -> Response {
    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        return Error::InvalidTimezoneError(state.local_timezone).into_alert_response();
    };
    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();

    let update_endpoint = endpoints::format_endpoint(endpoints::PET_API, pet_id);
    let render_error = |error: Error| {
        pet_form_view(
            PetFormAction::Update {
                endpoint: &update_endpoint,
            },
            &form,
            today,
            &format!("Error: {error}"),
        )
        .into_response()
    };

    let pet = match form.validate(today) {
        Ok(pet) => pet,
        Err(error) => return render_error(error),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_pet(pet_id, user_id, pet, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::format_endpoint(endpoints::PET_VIEW, pet_id)),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(Error::UpdateMissingPet) => Error::UpdateMissingPet.into_alert_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while updating pet {pet_id}: {error}");
            error.into_alert_response()
        }
    }
}
