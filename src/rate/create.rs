//! Page and endpoint for adding an exchange rate.

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    AppState, Error,
    currency::{BASE_CURRENCY, Currency},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, base,
    },
    navigation::NavBar,
    rate::{NewExchangeRate, Rate, create_exchange_rate},
    timezone::get_local_offset,
};

/// The state needed for adding an exchange rate.
#[derive(Debug, Clone)]
pub struct CreateRateState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Europe/Moscow".
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateRateState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Form data for adding an exchange rate.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RateFormData {
    pub currency: String,
    pub rate: String,
    pub effective_date: Option<Date>,
    /// Present when the "active" checkbox is ticked.
    pub is_active: Option<String>,
}

/// Render the page for adding an exchange rate.
pub async fn get_new_rate_page(State(state): State<CreateRateState>) -> Result<Response, Error> {
    let local_offset = get_local_offset(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;
    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();

    let nav_bar = NavBar::new(endpoints::RATES_VIEW).into_html();
    let form = new_rate_form_view(
        &RateFormData {
            effective_date: Some(today),
            is_active: Some("on".to_owned()),
            ..Default::default()
        },
        "",
    );

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    Ok(base("Add Exchange Rate", &[], &content).into_response())
}

/// Handle the form for adding an exchange rate.
pub async fn create_rate_endpoint(
    State(state): State<CreateRateState>,
    Form(form): Form<RateFormData>,
) -> Response {
    let new_rate = match parse_rate_form(&form) {
        Ok(new_rate) => new_rate,
        Err(error) => {
            return new_rate_form_view(&form, &format!("Error: {error}")).into_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_exchange_rate(new_rate, &connection) {
        Ok(rate) => {
            tracing::info!(
                "Added {} rate {} effective from {}",
                rate.currency,
                rate.rate,
                rate.effective_date
            );
            (
                HxRedirect(endpoints::RATES_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while adding an exchange rate: {error}");
            error.into_alert_response()
        }
    }
}

fn parse_rate_form(form: &RateFormData) -> Result<NewExchangeRate, Error> {
    let currency = Currency::from_str(&form.currency)?;
    let rate = Rate::from_str(&form.rate)?;
    let effective_date = form
        .effective_date
        .ok_or_else(|| Error::InvalidDate(String::new()))?;

    NewExchangeRate::new(currency, rate, effective_date, form.is_active.is_some())
}

fn new_rate_form_view(form: &RateFormData, error_message: &str) -> Markup {
    let foreign_currencies = Currency::ALL
        .into_iter()
        .filter(|currency| !currency.is_base());

    html! {
        form
            hx-post=(endpoints::RATES_API)
            hx-target-error="#alert-container"
            hx-swap="outerHTML"
            class="w-full space-y-4 md:space-y-6"
        {
            h1 class="text-xl font-bold" { "Add Exchange Rate" }

            div
            {
                label for="currency" class=(FORM_LABEL_STYLE) { "Currency" }

                select id="currency" name="currency" required class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for currency in foreign_currencies {
                        option
                            value=(currency.code())
                            selected[form.currency == currency.code()]
                        {
                            (currency.code()) " - " (currency.name())
                        }
                    }
                }
            }

            div
            {
                label for="rate" class=(FORM_LABEL_STYLE)
                {
                    "Value of one unit in " (BASE_CURRENCY.code())
                }

                input
                    id="rate"
                    type="number"
                    name="rate"
                    min="0.000001"
                    max=(Rate::MAX.to_string())
                    step="0.000001"
                    placeholder="90.00"
                    value=(form.rate)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="effective_date" class=(FORM_LABEL_STYLE) { "Effective from" }

                input
                    id="effective_date"
                    type="date"
                    name="effective_date"
                    value=[form.effective_date.map(|date| date.to_string())]
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div class="flex items-center gap-2"
            {
                input
                    id="is_active"
                    type="checkbox"
                    name="is_active"
                    checked[form.is_active.is_some()];

                label for="is_active" class="text-sm" { "Use this rate for conversions" }
            }

            @if !error_message.is_empty() {
                p class=(FORM_ERROR_STYLE) { (error_message) }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add Rate" }
        }
    }
}
