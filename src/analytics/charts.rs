//! ECharts options for the analytics chart view.
//!
//! The options are built server side with `charming` and handed to the
//! ECharts library by a small initialization script.

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{
        AxisLabel, AxisPointer, AxisPointerType, AxisType, Color, JsFunction, Orient, Tooltip,
        Trigger,
    },
    series::{Pie, bar::Bar},
};
use maud::{Markup, PreEscaped, html};
use rust_decimal::{Decimal, prelude::ToPrimitive};

use crate::{
    analytics::aggregation::{ExpenseSummary, month_label},
    currency::BASE_CURRENCY,
    html::HeadElement,
};

/// A chart with its HTML container ID and ECharts configuration.
pub(super) struct AnalyticsChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

pub(super) fn build_charts(summary: &ExpenseSummary, period_label: &str) -> [AnalyticsChart; 2] {
    [
        AnalyticsChart {
            id: "category-chart",
            options: category_chart(summary, period_label).to_string(),
        },
        AnalyticsChart {
            id: "monthly-chart",
            options: monthly_chart(summary, period_label).to_string(),
        },
    ]
}

/// The containers the chart script draws into.
pub(super) fn charts_view(charts: &[AnalyticsChart]) -> Markup {
    html!(
        section id="charts" class="w-full mx-auto mb-4"
        {
            div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
            {
                @for chart in charts {
                    div
                        id=(chart.id)
                        data-chart="true"
                        class="min-h-[380px] rounded dark:bg-gray-100"
                    {}
                }
            }
        }
    )
}

/// Initialize an ECharts instance for each chart once the page has loaded.
pub(super) fn charts_script(charts: &[AnalyticsChart]) -> HeadElement {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chart = echarts.init(document.getElementById("{}"));
                    chart.setOption({});
                    window.addEventListener('resize', chart.resize);

                    const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const updateTheme = () => {{
                        chart.setTheme(darkModeMediaQuery.matches ? 'dark' : 'default');
                    }};
                    darkModeMediaQuery.addEventListener('change', updateTheme);
                    updateTheme();
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    HeadElement::ScriptSource(PreEscaped(format!(
        "document.addEventListener('DOMContentLoaded', function() {{\n{script_content}\n}});"
    )))
}

fn category_chart(summary: &ExpenseSummary, period_label: &str) -> Chart {
    let colors: Vec<Color> = summary
        .by_category
        .iter()
        .map(|category| Color::from(category.color.as_str()))
        .collect();
    let data: Vec<(f64, String)> = summary
        .by_category
        .iter()
        .map(|category| (to_chart_value(category.total), category.name.clone()))
        .collect();

    Chart::new()
        .title(Title::new().text("Spending by category").subtext(period_label))
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Item)
                .value_formatter(currency_formatter()),
        )
        .legend(Legend::new().orient(Orient::Vertical).left("left").top("middle"))
        .color(colors)
        .series(
            Pie::new()
                .name("Categories")
                .radius(vec!["40%", "70%"])
                .data(data),
        )
}

fn monthly_chart(summary: &ExpenseSummary, period_label: &str) -> Chart {
    let labels: Vec<String> = summary
        .by_month
        .iter()
        .map(|month| month_label(month.month))
        .collect();
    let values: Vec<f64> = summary
        .by_month
        .iter()
        .map(|month| to_chart_value(month.total))
        .collect();

    Chart::new()
        .title(Title::new().text("Spending by month").subtext(period_label))
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Axis)
                .value_formatter(currency_formatter())
                .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow)),
        )
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(Bar::new().name("Spending").data(values))
}

fn to_chart_value(amount: Decimal) -> f64 {
    amount.round_dp(2).to_f64().unwrap_or_default()
}

fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        &format!(
            "const currencyFormatter = new Intl.NumberFormat('en-US', {{
                style: 'currency',
                currency: '{}'
            }});
            return (number) ? currencyFormatter.format(number) : \"-\";",
            BASE_CURRENCY.code()
        ),
    )
}

#[cfg(test)]
mod chart_tests {
    use rust_decimal::Decimal;
    use time::macros::date;

    use crate::analytics::aggregation::{CategoryTotal, ExpenseSummary, MonthTotal};

    use super::build_charts;

    fn summary() -> ExpenseSummary {
        ExpenseSummary {
            by_category: vec![CategoryTotal {
                name: "Veterinarian".to_owned(),
                color: "#ef4444".to_owned(),
                total: Decimal::new(123456, 2),
            }],
            by_month: vec![MonthTotal {
                month: date!(2025 - 04 - 01),
                total: Decimal::new(123456, 2),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn category_chart_uses_category_colors_and_names() {
        let [category_chart, _] = build_charts(&summary(), "All time");

        assert_eq!(category_chart.id, "category-chart");
        assert!(category_chart.options.contains("Veterinarian"));
        assert!(category_chart.options.contains("#ef4444"));
        assert!(category_chart.options.contains("1234.56"));
    }

    #[test]
    fn monthly_chart_labels_months() {
        let [_, monthly_chart] = build_charts(&summary(), "All time");

        assert_eq!(monthly_chart.id, "monthly-chart");
        assert!(monthly_chart.options.contains("Apr 2025"));
    }
}
