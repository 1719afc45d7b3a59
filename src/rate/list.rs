//! Exchange rates listing page.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    currency::{BASE_CURRENCY, Currency},
    endpoints,
    html::{
        BUTTON_DELETE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, page_header,
    },
    navigation::NavBar,
    rate::{ExchangeRate, get_all_exchange_rates},
};

/// The state needed for the exchange rates page.
#[derive(Debug, Clone)]
pub struct RatesPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RatesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the stored exchange rates and the default rates.
pub async fn get_rates_page(State(state): State<RatesPageState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let rates = get_all_exchange_rates(&connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve exchange rates: {error}"))?;

    Ok(rates_view(&rates).into_response())
}

/// A table row for one rate, also returned after toggling the rate.
pub(crate) fn rate_row(rate: &ExchangeRate) -> Markup {
    let toggle_url = endpoints::format_endpoint(endpoints::RATE_ACTIVE_API, rate.id);
    let delete_url = endpoints::format_endpoint(endpoints::RATE_API, rate.id);
    let confirm_message = format!(
        "Are you sure you want to delete the {} rate from {}?",
        rate.currency, rate.effective_date
    );

    html! {
        tr class=(TABLE_ROW_STYLE) data-rate-id=(rate.id)
        {
            td class=(TABLE_CELL_STYLE) { (rate.currency.code()) }
            td class=(TABLE_CELL_STYLE) { "1 " (rate.currency.code()) " = " (rate.rate.to_string()) " " (BASE_CURRENCY.code()) }
            td class=(TABLE_CELL_STYLE) { (rate.effective_date.to_string()) }
            td class=(TABLE_CELL_STYLE)
            {
                @if rate.is_active { "Active" } @else { "Inactive" }
            }
            td class=(TABLE_CELL_STYLE)
            {
                div class="flex gap-4"
                {
                    button
                        type="button"
                        hx-put=(toggle_url)
                        hx-target="closest tr"
                        hx-target-error="#alert-container"
                        hx-swap="outerHTML"
                        class=(LINK_STYLE)
                    {
                        @if rate.is_active { "Deactivate" } @else { "Activate" }
                    }

                    button
                        type="button"
                        hx-delete=(delete_url)
                        hx-confirm=(confirm_message)
                        hx-target="closest tr"
                        hx-target-error="#alert-container"
                        hx-swap="delete"
                        class=(BUTTON_DELETE_STYLE)
                    {
                        "Delete"
                    }
                }
            }
        }
    }
}

fn rates_view(rates: &[ExchangeRate]) -> Markup {
    let nav_bar = NavBar::new(endpoints::RATES_VIEW).into_html();
    let foreign_currencies = Currency::ALL
        .into_iter()
        .filter(|currency| !currency.is_base());

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                (page_header("Exchange Rates", endpoints::NEW_RATE_VIEW, "Add Rate"))

                p class="text-sm text-gray-600 dark:text-gray-400"
                {
                    "Expenses are converted to " (BASE_CURRENCY.name()) " (" (BASE_CURRENCY.code()) ") "
                    "with the most recent active rate on or before the expense date. "
                    "Without such a rate the default rate is used."
                }

                div class="overflow-x-auto"
                {
                    table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Currency" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Rate" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Effective from" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for rate in rates {
                                (rate_row(rate))
                            }

                            @if rates.is_empty() {
                                tr
                                {
                                    td
                                        colspan="5"
                                        class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                                    {
                                        "No exchange rates stored, the default rates are used. "
                                        a href=(endpoints::NEW_RATE_VIEW) class=(LINK_STYLE)
                                        {
                                            "Add a rate"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }

                h2 class="text-lg font-bold" { "Default rates" }

                ul class="list-disc list-inside text-sm"
                {
                    @for currency in foreign_currencies {
                        li { "1 " (currency.code()) " = " (currency.default_rate()) " " (BASE_CURRENCY.code()) }
                    }
                }
            }
        }
    );

    base("Exchange Rates", &[], &content)
}
