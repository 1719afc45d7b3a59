//! Endpoints for deleting an exchange rate and switching it on or off.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::Alert,
    rate::{RateId, delete_exchange_rate, get_exchange_rate, list::rate_row, toggle_exchange_rate_active},
};

/// The state needed to change a stored exchange rate.
#[derive(Debug, Clone)]
pub struct RateEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RateEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Handle exchange rate deletion. Returns success alert or error.
pub async fn delete_rate_endpoint(
    Path(rate_id): Path<RateId>,
    State(state): State<RateEndpointState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_exchange_rate(rate_id, &connection) {
        Ok(_) => Alert::SuccessSimple {
            message: "Exchange rate deleted successfully".to_owned(),
        }
        .into_response(),
        Err(Error::DeleteMissingRate) => Error::DeleteMissingRate.into_alert_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while deleting rate {rate_id}: {error}");
            error.into_alert_response()
        }
    }
}

/// Flip whether a rate is used for conversions and return its updated table row.
pub async fn toggle_rate_active_endpoint(
    Path(rate_id): Path<RateId>,
    State(state): State<RateEndpointState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let result = toggle_exchange_rate_active(rate_id, &connection)
        .and_then(|_| get_exchange_rate(rate_id, &connection));

    match result {
        Ok(rate) => rate_row(&rate).into_response(),
        Err(Error::UpdateMissingRate) => Error::UpdateMissingRate.into_alert_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while toggling rate {rate_id}: {error}");
            error.into_alert_response()
        }
    }
}
