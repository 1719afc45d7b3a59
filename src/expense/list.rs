//! The paged and filterable expense list page.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::UserID,
    category::{CategoryId, ExpenseCategory, get_all_categories},
    currency::Currency,
    endpoints,
    expense::{
        ExpenseFilter, ExpenseListItem, count_filtered_expenses, get_expense_page,
        view::{PetColumn, expense_table},
    },
    html::{
        BUTTON_SECONDARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, base, nothing_here_yet, page_header,
    },
    navigation::NavBar,
    pagination::{
        Page, PageQuery, PaginationConfig, PaginationIndicator, create_pagination_indicators,
        pagination_view,
    },
    pet::{Pet, PetId, get_pets},
    query::empty_string_as_none,
    rate::{RateTable, load_rate_table_or_default},
};

/// The state needed for the expense list page.
#[derive(Debug, Clone)]
pub struct ExpensesPageState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// Configuration for pagination controls.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for ExpensesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// The filter values and page of the expense list.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ExpensesQuery {
    /// The page number to display. Starts from 1.
    pub page: Option<u64>,
    /// The maximum number of expenses to display per page.
    pub per_page: Option<u64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub pet_id: Option<PetId>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub category_id: Option<CategoryId>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub currency: Option<Currency>,
}

impl ExpensesQuery {
    fn filter(&self) -> ExpenseFilter {
        ExpenseFilter {
            pet_id: self.pet_id,
            category_id: self.category_id,
            currency: self.currency,
            date_range: None,
        }
    }
}

/// The filters written back into pagination and export links.
#[derive(Serialize)]
struct FilterParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pet_id: Option<PetId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category_id: Option<CategoryId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    currency: Option<Currency>,
}

impl From<&ExpenseFilter> for FilterParams {
    fn from(filter: &ExpenseFilter) -> Self {
        Self {
            pet_id: filter.pet_id,
            category_id: filter.category_id,
            currency: filter.currency,
        }
    }
}

fn filter_query_string(filter: &ExpenseFilter) -> String {
    serde_urlencoded::to_string(FilterParams::from(filter)).unwrap_or_else(|error| {
        tracing::error!("Could not encode expense filter: {error}");
        String::new()
    })
}

fn with_filters(base: String, filters: &str) -> String {
    if filters.is_empty() {
        base
    } else {
        format!("{base}&{filters}")
    }
}

struct ExpensesView<'a> {
    items: &'a [ExpenseListItem],
    rates: &'a RateTable,
    pets: &'a [Pet],
    categories: &'a [ExpenseCategory],
    filter: &'a ExpenseFilter,
    page: Page,
    pagination: &'a [PaginationIndicator],
    total_count: u64,
}

/// Render a page of the user's expenses, newest first.
pub async fn get_expenses_page(
    State(state): State<ExpensesPageState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<ExpensesQuery>,
) -> Result<Response, Error> {
    let page = Page::from_query(
        PageQuery {
            page: query.page,
            per_page: query.per_page,
        },
        &state.pagination_config,
    );
    let filter = query.filter();

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let total_count = count_filtered_expenses(user_id, &filter, &connection)
        .inspect_err(|error| tracing::error!("Failed to count expenses: {error}"))?;
    let items = get_expense_page(user_id, &filter, page.size, page.offset(), &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve expenses: {error}"))?;
    let pets = get_pets(user_id, &connection)?;
    let categories = get_all_categories(&connection)?;
    let rates = load_rate_table_or_default(&connection);

    let pagination = create_pagination_indicators(
        page.number,
        page.count(total_count),
        state.pagination_config.max_pages,
    );

    Ok(expenses_view(ExpensesView {
        items: &items,
        rates: &rates,
        pets: &pets,
        categories: &categories,
        filter: &filter,
        page,
        pagination: &pagination,
        total_count,
    })
    .into_response())
}

fn expenses_view(view: ExpensesView<'_>) -> Markup {
    let nav_bar = NavBar::new(endpoints::EXPENSES_VIEW).into_html();
    let filters = filter_query_string(view.filter);
    let export_url = with_filters(format!("{}?period=all", endpoints::EXPORT_CSV), &filters);
    let page_size = view.page.size;
    let page_url = |page: u64| {
        with_filters(
            format!(
                "{}?page={page}&per_page={page_size}",
                endpoints::EXPENSES_VIEW
            ),
            &filters,
        )
    };
    let is_filtered = view.filter != &ExpenseFilter::default();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-6xl"
            {
                (page_header("Expenses", endpoints::NEW_EXPENSE_VIEW, "Add Expense"))

                (filter_form(view.pets, view.categories, view.filter))

                div class="flex justify-between items-center text-sm"
                {
                    span { (view.total_count) " expense(s)" }
                    a href=(export_url) class=(LINK_STYLE) { "Export CSV" }
                }

                @if view.items.is_empty() {
                    @if is_filtered {
                        (nothing_here_yet(endpoints::EXPENSES_VIEW, "Clear the filters"))
                    } @else {
                        (nothing_here_yet(endpoints::NEW_EXPENSE_VIEW, "Record your first expense"))
                    }
                } @else {
                    (expense_table(view.items, view.rates, PetColumn::Show))
                    (pagination_view(view.pagination, page_url))
                }
            }
        }
    );

    base("Expenses", &[], &content)
}

fn filter_form(pets: &[Pet], categories: &[ExpenseCategory], filter: &ExpenseFilter) -> Markup {
    html! {
        form
            method="get"
            action=(endpoints::EXPENSES_VIEW)
            class="grid grid-cols-2 md:grid-cols-4 gap-4 items-end"
        {
            div
            {
                label for="filter_pet_id" class=(FORM_LABEL_STYLE) { "Pet" }
                select id="filter_pet_id" name="pet_id" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "All pets" }
                    @for pet in pets {
                        option value=(pet.id) selected[filter.pet_id == Some(pet.id)]
                        {
                            (pet.name.as_ref())
                        }
                    }
                }
            }

            div
            {
                label for="filter_category_id" class=(FORM_LABEL_STYLE) { "Category" }
                select id="filter_category_id" name="category_id" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "All categories" }
                    @for category in categories {
                        option
                            value=(category.id)
                            selected[filter.category_id == Some(category.id)]
                        {
                            (category.name.as_ref())
                        }
                    }
                }
            }

            div
            {
                label for="filter_currency" class=(FORM_LABEL_STYLE) { "Currency" }
                select id="filter_currency" name="currency" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "All currencies" }
                    @for currency in Currency::ALL {
                        option value=(currency.code()) selected[filter.currency == Some(currency)]
                        {
                            (currency.code())
                        }
                    }
                }
            }

            button type="submit" class=(BUTTON_SECONDARY_STYLE) { "Filter" }
        }
    }
}

#[cfg(test)]
mod expenses_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Query, State},
        http::StatusCode,
    };
    use scraper::{Html, Selector};

    use crate::{
        currency::Currency,
        pagination::PaginationConfig,
        test_utils::{TestFixture, assert_valid_html, create_test_user, parse_html_document},
    };

    use super::{ExpensesPageState, ExpensesQuery, get_expenses_page};

    fn get_state(fixture: TestFixture) -> ExpensesPageState {
        ExpensesPageState {
            db_connection: Arc::new(Mutex::new(fixture.connection)),
            pagination_config: PaginationConfig::default(),
        }
    }

    fn count_rows(html: &Html) -> usize {
        html.select(&Selector::parse("[data-expense-row]").unwrap())
            .count()
    }

    #[tokio::test]
    async fn pages_through_expenses() {
        let fixture = TestFixture::new();
        for _ in 0..5 {
            fixture.create_expense("1", "RUB");
        }
        let user_id = fixture.user.id;
        let state = get_state(fixture);

        let response = get_expenses_page(
            State(state.clone()),
            Extension(user_id),
            Query(ExpensesQuery {
                page: Some(2),
                per_page: Some(2),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert_eq!(count_rows(&html), 2);
        let current = html
            .select(&Selector::parse("nav[aria-label=Pagination] [aria-current=page]").unwrap())
            .next()
            .expect("pagination should mark the current page");
        assert_eq!(current.text().collect::<String>().trim(), "2");
    }

    #[tokio::test]
    async fn filters_by_currency() {
        let fixture = TestFixture::new();
        fixture.create_expense("1", "RUB");
        fixture.create_expense("2", "USD");
        fixture.create_expense("3", "USD");
        let user_id = fixture.user.id;

        let response = get_expenses_page(
            State(get_state(fixture)),
            Extension(user_id),
            Query(ExpensesQuery {
                currency: Some(Currency::Usd),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        let html = parse_html_document(response).await;
        assert_eq!(count_rows(&html), 2);
        let export_link = html
            .select(&Selector::parse("a[href^='/export/csv']").unwrap())
            .next()
            .unwrap();
        assert_eq!(
            export_link.value().attr("href"),
            Some("/export/csv?period=all&currency=USD")
        );
    }

    #[tokio::test]
    async fn does_not_show_other_users_expenses() {
        let fixture = TestFixture::new();
        fixture.create_expense("1", "RUB");
        let stranger = create_test_user("mallory", &fixture.connection);

        let response = get_expenses_page(
            State(get_state(fixture)),
            Extension(stranger.id),
            Query(ExpensesQuery::default()),
        )
        .await
        .unwrap();

        let html = parse_html_document(response).await;
        assert_eq!(count_rows(&html), 0);
    }
}
