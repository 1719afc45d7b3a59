//! Downloading the user's expenses as a CSV file.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    auth::UserID,
    category::CategoryId,
    currency::Currency,
    expense::{ExpenseFilter, ExpenseListItem, get_filtered_expenses},
    period::Period,
    pet::PetId,
    query::empty_string_as_none,
    timezone::get_local_offset,
};

/// The fixed header row of the export.
pub const CSV_HEADER: [&str; 6] = ["date", "pet", "category", "amount", "currency", "description"];

/// The state needed for exporting expenses.
#[derive(Debug, Clone)]
pub struct ExportState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Europe/Moscow".
    pub local_timezone: String,
}

impl FromRef<AppState> for ExportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Which expenses to export. Everything is exported when no filter is given.
#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    pub period: Option<Period>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub pet_id: Option<PetId>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub category_id: Option<CategoryId>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub currency: Option<Currency>,
}

/// Send the user's expenses matching the query as `expenses.csv`, newest first.
pub async fn export_csv(
    State(state): State<ExportState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, Error> {
    let local_offset = get_local_offset(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;
    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();

    let filter = ExpenseFilter {
        pet_id: query.pet_id,
        category_id: query.category_id,
        currency: query.currency,
        date_range: query.period.unwrap_or(Period::All).date_range(today),
    };

    let items = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_filtered_expenses(user_id, &filter, &connection)
            .inspect_err(|error| tracing::error!("Could not get expenses to export: {error}"))?
    };

    let body = write_csv(&items)
        .inspect_err(|error| tracing::error!("Could not write expenses CSV: {error}"))?;

    tracing::debug!("User {user_id} exported {} expense(s)", items.len());

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"expenses.csv\"",
            ),
        ],
        body,
    )
        .into_response())
}

fn write_csv(items: &[ExpenseListItem]) -> Result<Vec<u8>, Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(CSV_HEADER)
        .map_err(|error| Error::CsvError(error.to_string()))?;

    for item in items {
        let expense = &item.expense;
        writer
            .write_record([
                expense.date.to_string().as_str(),
                item.pet_name.as_str(),
                item.category_name.as_str(),
                format!("{:.2}", expense.amount.value()).as_str(),
                expense.currency.code(),
                expense.description.as_str(),
            ])
            .map_err(|error| Error::CsvError(error.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|error| Error::CsvError(error.to_string()))
}
