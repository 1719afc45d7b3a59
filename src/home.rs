//! The landing page for logged in users.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    auth::UserID,
    currency::{BASE_CURRENCY, format_money},
    endpoints,
    expense::{ExpenseFilter, ExpenseListItem, PetColumn, expense_table, get_filtered_expenses},
    html::{CARD_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, base, link},
    navigation::NavBar,
    period::month_to_date,
    pet::count_pets,
    rate::{RateTable, load_rate_table_or_default},
    timezone::get_local_offset,
};

/// How many of the latest expenses to list.
const RECENT_EXPENSE_COUNT: usize = 5;

/// The state needed for the home page.
#[derive(Debug, Clone)]
pub struct HomeState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Europe/Moscow".
    pub local_timezone: String,
}

impl FromRef<AppState> for HomeState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

struct HomeData {
    pet_count: u32,
    expense_count: usize,
    month_total: Decimal,
    all_time_total: Decimal,
    recent: Vec<ExpenseListItem>,
    rates: RateTable,
}

/// Display the user's pet count, spending totals and latest expenses.
pub async fn get_home_page(
    State(state): State<HomeState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let local_offset = get_local_offset(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;
    let month = month_to_date(OffsetDateTime::now_utc().to_offset(local_offset).date());

    let (pet_count, mut items, rates) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let pet_count = count_pets(user_id, &connection)?;
        let items = get_filtered_expenses(user_id, &ExpenseFilter::default(), &connection)
            .inspect_err(|error| tracing::error!("Could not get expenses: {error}"))?;

        (pet_count, items, load_rate_table_or_default(&connection))
    };

    let mut month_total = Decimal::ZERO;
    let mut all_time_total = Decimal::ZERO;

    for item in &items {
        let expense = &item.expense;
        let base_amount = rates.to_base(expense.amount.value(), expense.currency, expense.date);
        all_time_total = all_time_total.saturating_add(base_amount);

        if month.contains(expense.date) {
            month_total = month_total.saturating_add(base_amount);
        }
    }

    let expense_count = items.len();
    items.truncate(RECENT_EXPENSE_COUNT);

    Ok(home_view(HomeData {
        pet_count,
        expense_count,
        month_total,
        all_time_total,
        recent: items,
        rates,
    })
    .into_response())
}

fn stat_card(label: &str, value: &str, data_name: &str) -> Markup {
    html! {
        div class=(CARD_STYLE) data-stat=(data_name)
        {
            p class="text-sm text-gray-500 dark:text-gray-400" { (label) }
            p class="text-2xl font-bold tabular-nums" { (value) }
        }
    }
}

fn home_view(data: HomeData) -> Markup {
    let nav_bar = NavBar::new(endpoints::HOME_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-6 w-full lg:max-w-5xl"
            {
                h1 class="text-xl font-bold" { "Home" }

                @if data.pet_count == 0 {
                    div class="flex flex-col items-center gap-2 py-8" data-add-pet-invitation="true"
                    {
                        h2 class="text-xl font-bold" { "Welcome!" }
                        p
                        {
                            "Start tracking what your pets cost by "
                            (link(endpoints::NEW_PET_VIEW, "adding your first pet"))
                            "."
                        }
                    }
                } @else {
                    div class="grid grid-cols-2 md:grid-cols-4 gap-4"
                    {
                        (stat_card("Pets", &data.pet_count.to_string(), "pets"))
                        (stat_card("Expenses", &data.expense_count.to_string(), "expenses"))
                        (stat_card(
                            "This month",
                            &format_money(data.month_total, BASE_CURRENCY),
                            "month-total",
                        ))
                        (stat_card(
                            "All time",
                            &format_money(data.all_time_total, BASE_CURRENCY),
                            "all-time-total",
                        ))
                    }

                    div class="flex justify-between items-end"
                    {
                        h2 class="text-lg font-semibold" { "Recent expenses" }
                        a href=(endpoints::EXPENSES_VIEW) class=(LINK_STYLE) { "View all" }
                    }

                    @if data.recent.is_empty() {
                        p
                        {
                            "No expenses yet. "
                            (link(endpoints::NEW_EXPENSE_VIEW, "Record your first expense"))
                        }
                    } @else {
                        (expense_table(&data.recent, &data.rates, PetColumn::Show))
                    }
                }
            }
        }
    );

    base("Home", &[], &content)
}

#[cfg(test)]
mod home_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use scraper::{Html, Selector};
    use time::OffsetDateTime;

    use crate::{
        expense::{NewExpense, create_expense},
        test_utils::{TestFixture, assert_valid_html, create_test_user, parse_html_document},
        timezone::get_local_offset,
    };

    use super::{HomeState, get_home_page};

    const TIMEZONE: &str = "Europe/Moscow";

    fn get_state(fixture: TestFixture) -> HomeState {
        HomeState {
            db_connection: Arc::new(Mutex::new(fixture.connection)),
            local_timezone: TIMEZONE.to_owned(),
        }
    }

    fn stat(html: &Html, name: &str) -> String {
        html.select(&Selector::parse(&format!("[data-stat={name}] p:last-child")).unwrap())
            .next()
            .unwrap_or_else(|| panic!("no {name} stat"))
            .text()
            .collect::<String>()
            .trim()
            .to_owned()
    }

    #[tokio::test]
    async fn shows_counts_and_totals() {
        let fixture = TestFixture::new();
        let today = OffsetDateTime::now_utc()
            .to_offset(get_local_offset(TIMEZONE).unwrap())
            .date();
        create_expense(
            fixture.user.id,
            NewExpense {
                date: today,
                ..fixture.new_expense("10", "EUR")
            },
            1000,
            &fixture.connection,
        )
        .unwrap();
        fixture.create_expense("100", "USD");
        let user_id = fixture.user.id;

        let response = get_home_page(State(get_state(fixture)), Extension(user_id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert_eq!(stat(&html, "pets"), "1");
        assert_eq!(stat(&html, "expenses"), "2");
        assert_eq!(stat(&html, "month-total"), "1,000.00 ₽");
        assert_eq!(stat(&html, "all-time-total"), "10,000.00 ₽");
    }

    #[tokio::test]
    async fn lists_at_most_five_recent_expenses() {
        let fixture = TestFixture::new();
        for _ in 0..7 {
            fixture.create_expense("1", "RUB");
        }
        let user_id = fixture.user.id;

        let response = get_home_page(State(get_state(fixture)), Extension(user_id))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        let rows = html
            .select(&Selector::parse("[data-expense-row]").unwrap())
            .count();
        assert_eq!(rows, 5);
        assert_eq!(stat(&html, "expenses"), "7");
    }

    #[tokio::test]
    async fn invites_user_without_pets_to_add_one() {
        let fixture = TestFixture::new();
        let stranger = create_test_user("newbie", &fixture.connection);

        let response = get_home_page(State(get_state(fixture)), Extension(stranger.id))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        assert!(
            html.select(&Selector::parse("[data-add-pet-invitation]").unwrap())
                .next()
                .is_some()
        );
    }
}
