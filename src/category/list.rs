//! Categories listing page.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    category::{ExpenseCategory, count_expenses_per_category, get_all_categories},
    endpoints,
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, category_badge, edit_delete_action_links, page_header,
    },
    navigation::NavBar,
};

/// The state needed for the categories listing page.
#[derive(Debug, Clone)]
pub struct CategoriesPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoriesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A category with the URLs and counts needed to render it.
struct CategoryRow {
    category: ExpenseCategory,
    edit_url: String,
    delete_url: String,
    expense_count: u32,
}

impl CategoryRow {
    fn confirm_message(&self) -> String {
        format!(
            "Are you sure you want to delete '{}'? This will also delete its {} expense(s).",
            self.category.name, self.expense_count
        )
    }
}

/// Render the categories listing page with expense counts.
pub async fn get_categories_page(
    State(state): State<CategoriesPageState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_all_categories(&connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;

    let expenses_per_category = count_expenses_per_category(&connection).inspect_err(|error| {
        tracing::error!("Could not count expenses per category: {error}")
    })?;

    let rows = categories
        .into_iter()
        .map(|category| CategoryRow {
            edit_url: endpoints::format_endpoint(endpoints::EDIT_CATEGORY_VIEW, category.id),
            delete_url: endpoints::format_endpoint(endpoints::CATEGORY_API, category.id),
            expense_count: expenses_per_category
                .get(&category.id)
                .copied()
                .unwrap_or_default(),
            category,
        })
        .collect::<Vec<_>>();

    Ok(categories_view(&rows).into_response())
}

fn categories_view(rows: &[CategoryRow]) -> Markup {
    let nav_bar = NavBar::new(endpoints::CATEGORIES_VIEW).into_html();

    let table_row = |row: &CategoryRow| {
        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE)
                {
                    (category_badge(row.category.name.as_ref(), row.category.color.as_ref()))
                }
                td class=(TABLE_CELL_STYLE) { (row.category.description) }
                td class=(TABLE_CELL_STYLE) { (row.expense_count) }
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
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                (page_header("Categories", endpoints::NEW_CATEGORY_VIEW, "Create Category"))

                ul class="lg:hidden space-y-4"
                {
                    @for row in rows {
                        li class="rounded border border-gray-200 bg-white px-4 py-3 shadow-sm dark:border-gray-700 dark:bg-gray-800"
                            data-category-card="true"
                        {
                            div class="flex items-start justify-between gap-3"
                            {
                                (category_badge(row.category.name.as_ref(), row.category.color.as_ref()))
                                span class="text-sm tabular-nums" { (row.expense_count) " expense(s)" }
                            }

                            @if !row.category.description.is_empty() {
                                p class="mt-1 text-sm text-gray-600 dark:text-gray-400" { (row.category.description) }
                            }

                            div class="mt-2 text-sm"
                            {
                                (edit_delete_action_links(
                                    &row.edit_url,
                                    &row.delete_url,
                                    &row.confirm_message(),
                                    "closest [data-category-card='true']",
                                    "outerHTML",
                                ))
                            }
                        }
                    }
                }

                section class="hidden lg:block"
                {
                    table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Expenses" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for row in rows {
                                (table_row(row))
                            }

                            @if rows.is_empty() {
                                tr
                                {
                                    td
                                        colspan="4"
                                        class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                                    {
                                        "No categories created yet. "
                                        a href=(endpoints::NEW_CATEGORY_VIEW) class=(LINK_STYLE)
                                        {
                                            "Create your first category"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Categories", &[], &content)
}
