//! Expense editing page and endpoint.

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use axum::{
    Extension,
    extract::{FromRef, Multipart, Path, State},
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
    expense::{
        ExpenseFormData, ExpenseId,
        form::{
            ExpenseFormAction, ExpenseFormOptions, expense_form_view, get_form_choices,
            parse_expense_multipart,
        },
        get_expense, remove_unused_receipts, store_receipt, update_expense,
    },
    html::{FORM_CONTAINER_STYLE, base},
    navigation::NavBar,
    timezone::get_local_offset,
};

/// The state needed for editing an expense.
#[derive(Debug, Clone)]
pub struct EditExpenseState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Europe/Moscow".
    pub local_timezone: String,
    /// The directory receipt images are stored in.
    pub media_dir: PathBuf,
    /// The maximum number of expenses a pet may have.
    pub max_expenses: u32,
}

impl FromRef<AppState> for EditExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            media_dir: state.media_dir.clone(),
            max_expenses: state.limits.max_expenses_per_pet,
        }
    }
}

/// Render the expense editing page.
pub async fn get_edit_expense_page(
    Path(expense_id): Path<ExpenseId>,
    State(state): State<EditExpenseState>,
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

    let expense = get_expense(expense_id, user_id, &connection)?;
    let (pets, categories) = get_form_choices(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to load expense form choices: {error}"))?;

    let update_endpoint = endpoints::format_endpoint(endpoints::EXPENSE_API, expense_id);
    let receipt_url = expense
        .receipt
        .as_ref()
        .map(|_| endpoints::format_endpoint(endpoints::EXPENSE_RECEIPT, expense_id));

    let nav_bar = NavBar::new(endpoints::EXPENSES_VIEW).into_html();
    let form = expense_form_view(
        ExpenseFormAction::Update {
            endpoint: &update_endpoint,
        },
        &ExpenseFormData::from(&expense),
        &ExpenseFormOptions {
            pets: &pets,
            categories: &categories,
            max_date: today,
            receipt_url: receipt_url.as_deref(),
        },
        "",
    );

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    Ok(base("Edit Expense", &[], &content).into_response())
}

/// Handle expense update form submission.
///
/// A new receipt replaces the current one, an empty receipt field keeps it
/// and the `remove_receipt` checkbox clears it. Receipts no longer used by
/// any expense are deleted afterwards.
pub async fn update_expense_endpoint(
    Path(expense_id): Path<ExpenseId>,
    State(state): State<EditExpenseState>,
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

    let loaded = match state.db_connection.lock() {
        Ok(connection) => get_expense(expense_id, user_id, &connection).and_then(|expense| {
            get_form_choices(user_id, &connection).map(|choices| (expense, choices))
        }),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };
    let (current, (pets, categories)) = match loaded {
        Ok(loaded) => loaded,
        Err(Error::NotFound) => return Error::UpdateMissingExpense.into_alert_response(),
        Err(error) => {
            tracing::error!("Failed to load expense {expense_id}: {error}");
            return error.into_alert_response();
        }
    };

    let update_endpoint = endpoints::format_endpoint(endpoints::EXPENSE_API, expense_id);
    let receipt_url = current
        .receipt
        .as_ref()
        .map(|_| endpoints::format_endpoint(endpoints::EXPENSE_RECEIPT, expense_id));
    let render_error = |error: Error| {
        expense_form_view(
            ExpenseFormAction::Update {
                endpoint: &update_endpoint,
            },
            &form,
            &ExpenseFormOptions {
                pets: &pets,
                categories: &categories,
                max_date: today,
                receipt_url: receipt_url.as_deref(),
            },
            &format!("Error: {error}"),
        )
        .into_response()
    };

    let mut expense = match form.validate(today) {
        Ok(expense) => expense,
        Err(error) => return render_error(error),
    };

    expense.receipt = match &upload {
        Some(upload) => match store_receipt(upload, &state.media_dir).await {
            Ok(file_name) => Some(file_name),
            Err(error @ (Error::UnsupportedReceiptType(_) | Error::ReceiptTooLarge)) => {
                return render_error(error);
            }
            Err(error) => {
                tracing::error!("Could not store receipt: {error}");
                return error.into_alert_response();
            }
        },
        None if form.remove_receipt => None,
        None => current.receipt.clone(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let new_receipt = expense.receipt.clone();
    let pet_id = expense.pet_id;

    match update_expense(expense_id, user_id, expense, state.max_expenses, &connection) {
        Ok(()) => {
            if let Some(old_receipt) = current.receipt.filter(|old| Some(old) != new_receipt.as_ref())
            {
                remove_unused_receipts(&[old_receipt], &state.media_dir, &connection);
            }

            (
                HxRedirect(endpoints::format_endpoint(endpoints::PET_VIEW, pet_id)),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            if let Some(file_name) = new_receipt.filter(|new| Some(new) != current.receipt.as_ref())
            {
                remove_unused_receipts(&[file_name], &state.media_dir, &connection);
            }

            match error {
                Error::InvalidPet | Error::InvalidCategory | Error::TooManyExpenses(_) => {
                    render_error(error)
                }
                Error::UpdateMissingExpense => Error::UpdateMissingExpense.into_alert_response(),
                error => {
                    tracing::error!(
                        "An unexpected error occurred while updating expense {expense_id}: {error}"
                    );
                    error.into_alert_response()
                }
            }
        }
    }
}
