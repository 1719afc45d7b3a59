//! Expense creation page and endpoint.

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use axum::{
    Extension,
    extract::{FromRef, Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::html;
use rusqlite::Connection;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    auth::UserID,
    endpoints,
    expense::{
        ExpenseFormData, create_expense,
        form::{
            ExpenseFormAction, ExpenseFormOptions, expense_form_view, get_form_choices,
            parse_expense_multipart,
        },
        remove_unused_receipts, store_receipt,
    },
    html::{FORM_CONTAINER_STYLE, base, nothing_here_yet},
    navigation::NavBar,
    pet::PetId,
    query::empty_string_as_none,
    timezone::get_local_offset,
};

/// The state needed for creating an expense.
#[derive(Debug, Clone)]
pub struct CreateExpenseState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Europe/Moscow".
    pub local_timezone: String,
    /// The directory receipt images are stored in.
    pub media_dir: PathBuf,
    /// The maximum number of expenses a pet may have.
    pub max_expenses: u32,
}

impl FromRef<AppState> for CreateExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            media_dir: state.media_dir.clone(),
            max_expenses: state.limits.max_expenses_per_pet,
        }
    }
}

/// The pet to select in the new expense form, e.g. when coming from a pet's page.
#[derive(Debug, Default, Deserialize)]
pub struct NewExpenseQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub pet_id: Option<PetId>,
}

/// Render the expense creation page.
pub async fn get_new_expense_page(
    State(state): State<CreateExpenseState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<NewExpenseQuery>,
) -> Result<Response, Error> {
    let local_offset = get_local_offset(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;
    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let (pets, categories) = get_form_choices(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to load expense form choices: {error}"))?;

    let nav_bar = NavBar::new(endpoints::EXPENSES_VIEW).into_html();

    if pets.is_empty() {
        let content = html! {
            (nav_bar)
            div class=(FORM_CONTAINER_STYLE)
            {
                (nothing_here_yet(endpoints::NEW_PET_VIEW, "Add a pet before recording expenses"))
            }
        };

        return Ok(base("Add Expense", &[], &content).into_response());
    }

    let form_data = ExpenseFormData {
        pet_id: query
            .pet_id
            .filter(|pet_id| pets.iter().any(|pet| pet.id == *pet_id))
            .map(|pet_id| pet_id.to_string())
            .unwrap_or_default(),
        date: today.to_string(),
        ..Default::default()
    };

    let form = expense_form_view(
        ExpenseFormAction::Create {
            endpoint: endpoints::EXPENSES_API,
        },
        &form_data,
        &ExpenseFormOptions {
            pets: &pets,
            categories: &categories,
            max_date: today,
            receipt_url: None,
        },
        "",
    );

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    Ok(base("Add Expense", &[], &content).into_response())
}

/// Handle expense creation form submission.
///
/// The receipt, if any, is written to the media directory before the expense
/// is stored and removed again if storing the expense fails.
pub async fn create_expense_endpoint(
    State(state): State<CreateExpenseState>,
    Extension(user_id): Extension<UserID>,
    multipart: Multipart,
) -> Response {
    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        return Error::InvalidTimezoneError(state.local_timezone).into_alert_response();
    };
    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();

    let (form, upload) = match parse_expense_multipart(multipart).await {
        Ok(parsed) => parsed,
        Err(error) => {
            tracing::warn!("Could not parse expense form: {error}");
            return error.into_alert_response();
        }
    };

    let choices = match state.db_connection.lock() {
        Ok(connection) => get_form_choices(user_id, &connection),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };
    let (pets, categories) = match choices {
        Ok(choices) => choices,
        Err(error) => {
            tracing::error!("Failed to load expense form choices: {error}");
            return error.into_alert_response();
        }
    };

    let render_error = |error: Error| {
        expense_form_view(
            ExpenseFormAction::Create {
                endpoint: endpoints::EXPENSES_API,
            },
            &form,
            &ExpenseFormOptions {
                pets: &pets,
                categories: &categories,
                max_date: today,
                receipt_url: None,
            },
            &format!("Error: {error}"),
        )
        .into_response()
    };

    let mut new_expense = match form.validate(today) {
        Ok(new_expense) => new_expense,
        Err(error) => return render_error(error),
    };

    if let Some(upload) = &upload {
        match store_receipt(upload, &state.media_dir).await {
            Ok(file_name) => new_expense.receipt = Some(file_name),
            Err(error @ (Error::UnsupportedReceiptType(_) | Error::ReceiptTooLarge)) => {
                return render_error(error);
            }
            Err(error) => {
                tracing::error!("Could not store receipt: {error}");
                return error.into_alert_response();
            }
        }
    }

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let stored_receipt = new_expense.receipt.clone();

    match create_expense(user_id, new_expense, state.max_expenses, &connection) {
        Ok(expense) => {
            tracing::info!("User {user_id} added expense {} to pet {}", expense.id, expense.pet_id);
            (
                HxRedirect(endpoints::format_endpoint(
                    endpoints::PET_VIEW,
                    expense.pet_id,
                )),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            if let Some(file_name) = stored_receipt {
                remove_unused_receipts(&[file_name], &state.media_dir, &connection);
            }

            match error {
                Error::InvalidPet | Error::InvalidCategory | Error::TooManyExpenses(_) => {
                    render_error(error)
                }
                error => {
                    tracing::error!(
                        "An unexpected error occurred while creating an expense: {error}"
                    );
                    error.into_alert_response()
                }
            }
        }
    }
}
