//! Pet creation page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
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
        PetFormData, create_pet,
        form::{PetFormAction, pet_form_view},
    },
    timezone::get_local_offset,
};

/// The state needed for creating a pet.
#[derive(Debug, Clone)]
pub struct CreatePetState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Europe/Moscow".
    pub local_timezone: String,
    /// The maximum number of pets a user may have.
    pub max_pets: u32,
}

impl FromRef<AppState> for CreatePetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            max_pets: state.limits.max_pets_per_user,
        }
    }
}

/// Render the pet creation page.
pub async fn get_new_pet_page(State(state): State<CreatePetState>) -> Result<Response, Error> {
    let local_offset = get_local_offset(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;
    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();

    let nav_bar = NavBar::new(endpoints::PETS_VIEW).into_html();
    let form = pet_form_view(
        PetFormAction::Create {
            endpoint: endpoints::PETS_API,
        },
        &PetFormData::default(),
        today,
        "",
    );

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    Ok(base("Add Pet", &[], &content).into_response())
}

/// Handle pet creation form submission.
pub async fn create_pet_endpoint(
    State(state): State<CreatePetState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<PetFormData>,
) -> Response {
    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        return Error::InvalidTimezoneError(state.local_timezone).into_alert_response();
    };
    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();

    let render_error = |error: Error| {
        pet_form_view(
            PetFormAction::Create {
                endpoint: endpoints::PETS_API,
            },
            &form,
            today,
            &format!("Error: {error}"),
        )
        .into_response()
    };

    let new_pet = match form.validate(today) {
        Ok(new_pet) => new_pet,
        Err(error) => return render_error(error),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_pet(user_id, new_pet, state.max_pets, &connection) {
        Ok(pet) => {
            tracing::info!("User {user_id} added pet {} ({})", pet.name, pet.id);
            (
                HxRedirect(endpoints::PETS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error @ Error::TooManyPets(_)) => render_error(error),
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a pet: {error}");
            error.into_alert_response()
        }
    }
}
