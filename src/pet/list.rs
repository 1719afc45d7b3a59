//! Pets listing page.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::{
    AppState, Error,
    auth::UserID,
    currency::{BASE_CURRENCY, format_money},
    endpoints,
    expense::{ExpenseFilter, get_filtered_expenses},
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, edit_delete_action_links, page_header,
    },
    navigation::NavBar,
    pet::{Pet, PetId, get_pets},
    rate::load_rate_table_or_default,
};

/// The state needed for the pets listing page.
#[derive(Debug, Clone)]
pub struct PetsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for PetsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The number of expenses recorded for a pet and what they cost in the base currency.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct PetSpending {
    expense_count: u32,
    base_total: Decimal,
}

struct PetRow {
    pet: Pet,
    view_url: String,
    edit_url: String,
    delete_url: String,
    spending: PetSpending,
}

impl PetRow {
    fn confirm_message(&self) -> String {
        format!(
            "Are you sure you want to delete '{}'? This will also delete its {} expense(s).",
            self.pet.name, self.spending.expense_count
        )
    }
}

/// Render the user's pets with their expense counts and totals.
pub async fn get_pets_page(
    State(state): State<PetsPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let pets = get_pets(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve pets: {error}"))?;

    let rates = load_rate_table_or_default(&connection);
    let mut spending: HashMap<PetId, PetSpending> = HashMap::new();

    for item in get_filtered_expenses(user_id, &ExpenseFilter::default(), &connection)? {
        let expense = item.expense;
        let pet_spending = spending.entry(expense.pet_id).or_default();
        pet_spending.expense_count += 1;
        pet_spending.base_total +=
            rates.to_base(expense.amount.value(), expense.currency, expense.date);
    }

    let rows = pets
        .into_iter()
        .map(|pet| PetRow {
            view_url: endpoints::format_endpoint(endpoints::PET_VIEW, pet.id),
            edit_url: endpoints::format_endpoint(endpoints::EDIT_PET_VIEW, pet.id),
            delete_url: endpoints::format_endpoint(endpoints::PET_API, pet.id),
            spending: spending.get(&pet.id).copied().unwrap_or_default(),
            pet,
        })
        .collect::<Vec<_>>();

    Ok(pets_view(&rows).into_response())
}

fn pets_view(rows: &[PetRow]) -> Markup {
    let nav_bar = NavBar::new(endpoints::PETS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                (page_header("Pets", endpoints::NEW_PET_VIEW, "Add Pet"))

                table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Species" }
                            th scope="col" class="hidden md:table-cell px-6 py-4" { "Breed" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Expenses" }
                            th scope="col" class="px-6 py-4 text-right" { "Total" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                        }
                    }

                    tbody
                    {
                        @for row in rows {
                            tr class=(TABLE_ROW_STYLE) data-pet-row="true"
                            {
                                td class=(TABLE_CELL_STYLE)
                                {
                                    a href=(row.view_url) class=(LINK_STYLE) { (row.pet.name.as_ref()) }
                                }
                                td class=(TABLE_CELL_STYLE) { (row.pet.species.label()) }
                                td class="hidden md:table-cell px-6 py-4" { (row.pet.breed) }
                                td class=(TABLE_CELL_STYLE) { (row.spending.expense_count) }
                                td class="px-6 py-4 text-right tabular-nums"
                                {
                                    (format_money(row.spending.base_total, BASE_CURRENCY))
                                }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    (edit_delete_action_links(
                                        &row.edit_url,
                                        &row.delete_url,
                                        &row.confirm_message(),
                                        "closest tr",
                                        "delete",
                                    ))
                                }
                            }
                        }

                        @if rows.is_empty() {
                            tr
                            {
                                td
                                    colspan="6"
                                    class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                                {
                                    "No pets yet. "
                                    a href=(endpoints::NEW_PET_VIEW) class=(LINK_STYLE)
                                    {
                                        "Add your first pet"
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Pets", &[], &content)
}
