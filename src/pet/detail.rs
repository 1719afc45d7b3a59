//! The page for a single pet and its expenses.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    currency::{BASE_CURRENCY, CurrencyTotals, aggregate_totals, format_money},
    endpoints,
    expense::{ExpenseFilter, ExpenseListItem, PetColumn, expense_table, get_filtered_expenses},
    html::{
        CARD_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, base, edit_delete_action_links,
        nothing_here_yet,
    },
    navigation::NavBar,
    pet::{Pet, PetId, get_pet},
    rate::{RateTable, load_rate_table_or_default},
};

/// The state needed for the pet detail page.
#[derive(Debug, Clone)]
pub struct PetPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for PetPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render a pet with all of its expenses, newest first.
pub async fn get_pet_page(
    Path(pet_id): Path<PetId>,
    State(state): State<PetPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let (pet, items, rates) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let pet = get_pet(pet_id, user_id, &connection)?;
        let filter = ExpenseFilter {
            pet_id: Some(pet_id),
            ..Default::default()
        };
        let items = get_filtered_expenses(user_id, &filter, &connection).inspect_err(|error| {
            tracing::error!("Failed to retrieve expenses for pet {pet_id}: {error}")
        })?;

        (pet, items, load_rate_table_or_default(&connection))
    };

    let totals = aggregate_totals(
        items.iter().map(|item| {
            (
                item.expense.amount.value(),
                item.expense.currency,
                item.expense.date,
            )
        }),
        &rates,
    );

    Ok(pet_view(&pet, &items, &totals, &rates).into_response())
}

fn pet_view(
    pet: &Pet,
    items: &[ExpenseListItem],
    totals: &CurrencyTotals,
    rates: &RateTable,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::PETS_VIEW).into_html();
    let new_expense_url = format!("{}?pet_id={}", endpoints::NEW_EXPENSE_VIEW, pet.id);
    let edit_url = endpoints::format_endpoint(endpoints::EDIT_PET_VIEW, pet.id);
    let delete_url = endpoints::format_endpoint(endpoints::PET_API, pet.id);
    let confirm_message = format!(
        "Are you sure you want to delete '{}'? This will also delete its {} expense(s).",
        pet.name,
        items.len()
    );

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                div class="flex justify-between flex-wrap items-end w-full gap-2"
                {
                    h1 class="text-xl font-bold" { (pet.name.as_ref()) }

                    div class="flex gap-4 items-center"
                    {
                        a href=(new_expense_url) class=(LINK_STYLE) { "Add Expense" }
                        (edit_delete_action_links(
                            &edit_url,
                            &delete_url,
                            &confirm_message,
                            "body",
                            "none",
                        ))
                    }
                }

                dl class=(format!("{CARD_STYLE} grid grid-cols-2 md:grid-cols-4 gap-4")) data-pet-details="true"
                {
                    div
                    {
                        dt class="text-sm text-gray-500 dark:text-gray-400" { "Species" }
                        dd { (pet.species.label()) }
                    }
                    div
                    {
                        dt class="text-sm text-gray-500 dark:text-gray-400" { "Breed" }
                        dd { @if pet.breed.is_empty() { "Unknown" } @else { (pet.breed) } }
                    }
                    div
                    {
                        dt class="text-sm text-gray-500 dark:text-gray-400" { "Born" }
                        dd
                        {
                            @match pet.birth_date {
                                Some(birth_date) => (birth_date.to_string()),
                                None => "Unknown",
                            }
                        }
                    }
                    div
                    {
                        dt class="text-sm text-gray-500 dark:text-gray-400" { "Total spent" }
                        dd class="tabular-nums" data-pet-total="true"
                        {
                            (format_money(totals.base_total, BASE_CURRENCY))
                        }
                    }
                }

                @if items.is_empty() {
                    (nothing_here_yet(&new_expense_url, "Record this pet's first expense"))
                } @else {
                    (expense_table(items, rates, PetColumn::Hide))
                }
            }
        }
    );

    base(pet.name.as_ref(), &[], &content)
}

#[cfg(test)]
mod pet_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use scraper::Selector;
    use time::macros::date;

    use crate::{
        Error,
        expense::{NewExpense, create_expense},
        test_utils::{TestFixture, assert_valid_html, create_test_user, parse_html_document},
    };

    use super::{PetPageState, get_pet_page};

    #[tokio::test]
    async fn shows_expenses_newest_first_with_base_total() {
        let fixture = TestFixture::new();
        for (amount, currency, date) in [
            ("100", "USD", date!(2025 - 01 - 10)),
            ("50", "RUB", date!(2025 - 02 - 10)),
        ] {
            create_expense(
                fixture.user.id,
                NewExpense {
                    date,
                    ..fixture.new_expense(amount, currency)
                },
                1000,
                &fixture.connection,
            )
            .unwrap();
        }
        let pet_id = fixture.pet.id;
        let user_id = fixture.user.id;
        let state = PetPageState {
            db_connection: Arc::new(Mutex::new(fixture.connection)),
        };

        let response = get_pet_page(Path(pet_id), State(state), Extension(user_id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let dates = html
            .select(&Selector::parse("[data-expense-row] td:first-child").unwrap())
            .map(|cell| cell.text().collect::<String>().trim().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(dates, ["2025-02-10", "2025-01-10"]);

        let total = html
            .select(&Selector::parse("[data-pet-total]").unwrap())
            .next()
            .unwrap()
            .text()
            .collect::<String>();
        assert_eq!(total.trim(), "9,050.00 ₽");
    }

    #[tokio::test]
    async fn links_to_new_expense_for_pet() {
        let fixture = TestFixture::new();
        let pet_id = fixture.pet.id;
        let user_id = fixture.user.id;
        let state = PetPageState {
            db_connection: Arc::new(Mutex::new(fixture.connection)),
        };

        let response = get_pet_page(Path(pet_id), State(state), Extension(user_id))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        let expected_href = format!("/expenses/new?pet_id={pet_id}");
        let link = html
            .select(&Selector::parse("a").unwrap())
            .find(|link| link.value().attr("href") == Some(expected_href.as_str()));
        assert!(link.is_some(), "no link to {expected_href}");
    }

    #[tokio::test]
    async fn other_users_pet_is_not_found() {
        let fixture = TestFixture::new();
        let stranger = create_test_user("mallory", &fixture.connection);
        let pet_id = fixture.pet.id;
        let state = PetPageState {
            db_connection: Arc::new(Mutex::new(fixture.connection)),
        };

        let result = get_pet_page(Path(pet_id), State(state), Extension(stranger.id)).await;

        assert_eq!(result.err(), Some(Error::NotFound));
    }
}
