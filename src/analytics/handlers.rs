//! The analytics page handler and its views.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    analytics::{
        aggregation::{ExpenseSummary, summarize_expenses},
        charts::{build_charts, charts_script, charts_view},
        tables::{breakdown_tables, currency_totals_view},
    },
    auth::UserID,
    endpoints,
    expense::{ExpenseFilter, get_filtered_expenses},
    html::{HeadElement, LINK_STYLE, PAGE_CONTAINER_STYLE, base, nothing_here_yet},
    navigation::NavBar,
    period::Period,
    rate::load_rate_table_or_default,
    timezone::get_local_offset,
};

/// The state needed for the analytics page.
#[derive(Debug, Clone)]
pub struct AnalyticsState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Europe/Moscow".
    pub local_timezone: String,
}

impl FromRef<AppState> for AnalyticsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// How the totals are presented.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyticsView {
    #[default]
    Table,
    Chart,
}

impl AnalyticsView {
    fn as_query_value(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Chart => "chart",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    pub period: Option<Period>,
    pub view: Option<AnalyticsView>,
}

/// Display the user's spending totals for a period as tables or charts.
pub async fn get_analytics_page(
    State(state): State<AnalyticsState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Response, Error> {
    let period = query.period.unwrap_or_else(Period::default_preset);
    let view = query.view.unwrap_or_default();

    let local_offset = get_local_offset(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;
    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();

    let (items, rates) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let filter = ExpenseFilter {
            date_range: period.date_range(today),
            ..Default::default()
        };
        let items = get_filtered_expenses(user_id, &filter, &connection).inspect_err(|error| {
            tracing::error!("Could not get expenses for {}: {error}", period.label())
        })?;

        (items, load_rate_table_or_default(&connection))
    };

    let summary = summarize_expenses(&items, &rates);

    Ok(analytics_view(&summary, period, view).into_response())
}

fn analytics_url(period: Period, view: AnalyticsView) -> String {
    format!(
        "{}?period={}&view={}",
        endpoints::ANALYTICS_VIEW,
        period.as_query_value(),
        view.as_query_value()
    )
}

fn option_link(url: &str, text: &str, is_current: bool) -> Markup {
    html! {
        @if is_current {
            span aria-current="true" class="font-semibold" { (text) }
        } @else {
            a href=(url) class=(LINK_STYLE) { (text) }
        }
    }
}

fn analytics_view(summary: &ExpenseSummary, period: Period, view: AnalyticsView) -> Markup {
    let nav_bar = NavBar::new(endpoints::ANALYTICS_VIEW).into_html();
    let export_url = format!(
        "{}?period={}",
        endpoints::EXPORT_CSV,
        period.as_query_value()
    );
    let charts = build_charts(summary, period.label());

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-6xl"
            {
                div class="flex justify-between flex-wrap items-end w-full gap-2"
                {
                    h1 class="text-xl font-bold" { "Analytics" }
                    a href=(export_url) class=(LINK_STYLE) { "Export CSV" }
                }

                nav class="flex flex-wrap gap-4 text-sm" data-period-options="true"
                {
                    @for option in Period::ALL {
                        (option_link(&analytics_url(option, view), option.label(), option == period))
                    }
                }

                nav class="flex gap-4 text-sm" data-view-options="true"
                {
                    (option_link(
                        &analytics_url(period, AnalyticsView::Table),
                        "Table",
                        view == AnalyticsView::Table,
                    ))
                    (option_link(
                        &analytics_url(period, AnalyticsView::Chart),
                        "Chart",
                        view == AnalyticsView::Chart,
                    ))
                }

                @if summary.is_empty() {
                    (nothing_here_yet(endpoints::NEW_EXPENSE_VIEW, "Record an expense"))
                } @else {
                    (currency_totals_view(&summary.totals))

                    @match view {
                        AnalyticsView::Table => (breakdown_tables(summary)),
                        AnalyticsView::Chart => (charts_view(&charts)),
                    }
                }
            }
        }
    );

    let scripts = if view == AnalyticsView::Chart && !summary.is_empty() {
        vec![
            HeadElement::ScriptLink("/static/echarts.6.0.0.min.js".to_owned()),
            charts_script(&charts),
        ]
    } else {
        Vec::new()
    };

    base("Analytics", &scripts, &content)
}

#[cfg(test)]
mod analytics_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Query, State},
        http::StatusCode,
    };
    use scraper::{Html, Selector};
    use time::{Duration, OffsetDateTime, macros::date};

    use crate::{
        currency::Currency,
        expense::{NewExpense, create_expense},
        period::Period,
        test_utils::{TestFixture, assert_valid_html, create_test_user, parse_html_document},
        timezone::get_local_offset,
    };

    use super::{AnalyticsQuery, AnalyticsState, AnalyticsView, get_analytics_page};

    const TIMEZONE: &str = "Europe/Moscow";

    fn get_state(fixture: TestFixture) -> AnalyticsState {
        AnalyticsState {
            db_connection: Arc::new(Mutex::new(fixture.connection)),
            local_timezone: TIMEZONE.to_owned(),
        }
    }

    fn base_total(html: &Html) -> String {
        html.select(&Selector::parse("[data-base-total] p:last-child").unwrap())
            .next()
            .expect("no base total")
            .text()
            .collect::<String>()
            .trim()
            .to_owned()
    }

    #[tokio::test]
    async fn all_time_totals_in_base_currency() {
        let fixture = TestFixture::new();
        fixture.create_expense("100", "USD");
        fixture.create_expense("10", "EUR");
        let user_id = fixture.user.id;

        let response = get_analytics_page(
            State(get_state(fixture)),
            Extension(user_id),
            Query(AnalyticsQuery {
                period: Some(Period::All),
                view: None,
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        // 100 USD at 90 plus 10 EUR at 100.
        assert_eq!(base_total(&html), "10,000.00 ₽");
        assert_eq!(
            html.select(&Selector::parse("[data-breakdown]").unwrap())
                .count(),
            3
        );
    }

    #[tokio::test]
    async fn month_period_excludes_older_expenses() {
        let fixture = TestFixture::new();
        let today = OffsetDateTime::now_utc()
            .to_offset(get_local_offset(TIMEZONE).unwrap())
            .date();
        for (amount, date) in [("25", today), ("75", today - Duration::days(60))] {
            create_expense(
                fixture.user.id,
                NewExpense {
                    date,
                    ..fixture.new_expense(amount, "RUB")
                },
                1000,
                &fixture.connection,
            )
            .unwrap();
        }
        let user_id = fixture.user.id;

        let response = get_analytics_page(
            State(get_state(fixture)),
            Extension(user_id),
            Query(AnalyticsQuery::default()),
        )
        .await
        .unwrap();

        let html = parse_html_document(response).await;
        assert_eq!(base_total(&html), "25.00 ₽");
    }

    #[tokio::test]
    async fn chart_view_renders_chart_containers() {
        let fixture = TestFixture::new();
        fixture.create_expense("100", "USD");
        let user_id = fixture.user.id;

        let response = get_analytics_page(
            State(get_state(fixture)),
            Extension(user_id),
            Query(AnalyticsQuery {
                period: Some(Period::All),
                view: Some(AnalyticsView::Chart),
            }),
        )
        .await
        .unwrap();

        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert_eq!(
            html.select(&Selector::parse("[data-chart]").unwrap())
                .count(),
            2
        );
    }

    #[tokio::test]
    async fn oversized_stored_rate_saturates_totals() {
        let fixture = TestFixture::new();
        fixture
            .connection
            .execute(
                "INSERT INTO exchange_rate (currency, rate, effective_date, is_active)
                VALUES (?1, ?2, ?3, 1)",
                (Currency::Usd, "10000000000000000000000", date!(2020 - 01 - 01)),
            )
            .unwrap();
        fixture.create_expense("99999999.99", "USD");
        fixture.create_expense("99999999.99", "USD");
        let user_id = fixture.user.id;
        let state = get_state(fixture);

        for _ in 0..2 {
            let response = get_analytics_page(
                State(state.clone()),
                Extension(user_id),
                Query(AnalyticsQuery {
                    period: Some(Period::All),
                    view: None,
                }),
            )
            .await
            .expect("a huge rate should not break the page");

            assert_eq!(response.status(), StatusCode::OK);
            let html = parse_html_document(response).await;
            assert_eq!(
                base_total(&html),
                "79,228,162,514,264,337,593,543,950,335.00 ₽"
            );
        }
    }

    #[tokio::test]
    async fn shows_nothing_here_yet_without_expenses() {
        let fixture = TestFixture::new();
        fixture.create_expense("100", "USD");
        let stranger = create_test_user("mallory", &fixture.connection);

        let response = get_analytics_page(
            State(get_state(fixture)),
            Extension(stranger.id),
            Query(AnalyticsQuery {
                period: Some(Period::All),
                view: None,
            }),
        )
        .await
        .unwrap();

        let html = parse_html_document(response).await;
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("Nothing here yet..."));
        assert!(
            html.select(&Selector::parse("[data-base-total]").unwrap())
                .next()
                .is_none()
        );
    }
}
