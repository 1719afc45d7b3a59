//! Table views for the analytics totals.

use maud::{Markup, html};
use rust_decimal::Decimal;

use crate::{
    analytics::aggregation::{ExpenseSummary, month_label},
    currency::{BASE_CURRENCY, CurrencyTotals, format_money},
    html::{CARD_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, category_badge},
};

const AMOUNT_CELL_STYLE: &str = "px-6 py-4 text-right tabular-nums whitespace-nowrap";

/// The original currency sums next to the base currency grand total.
pub(super) fn currency_totals_view(totals: &CurrencyTotals) -> Markup {
    html! {
        div class="grid grid-cols-2 md:grid-cols-4 gap-4 w-full" data-currency-totals="true"
        {
            @for (currency, total) in &totals.by_currency {
                div class=(CARD_STYLE)
                {
                    p class="text-sm text-gray-500 dark:text-gray-400" { (currency.name()) }
                    p class="text-lg font-semibold tabular-nums" { (format_money(*total, *currency)) }
                }
            }

            div class=(CARD_STYLE) data-base-total="true"
            {
                p class="text-sm text-gray-500 dark:text-gray-400"
                {
                    "Total in " (BASE_CURRENCY.code())
                }
                p class="text-lg font-bold tabular-nums"
                {
                    (format_money(totals.base_total, BASE_CURRENCY))
                }
            }
        }
    }
}

pub(super) fn breakdown_tables(summary: &ExpenseSummary) -> Markup {
    html! {
        div class="grid grid-cols-1 xl:grid-cols-3 gap-4 w-full"
        {
            (breakdown_table(
                "By category",
                "Category",
                "category",
                summary.by_category.iter().map(|category| {
                    (category_badge(&category.name, &category.color), category.total)
                }),
            ))

            (breakdown_table(
                "By pet",
                "Pet",
                "pet",
                summary.by_pet.iter().map(|pet| (html! { (pet.name) }, pet.total)),
            ))

            (breakdown_table(
                "By month",
                "Month",
                "month",
                summary
                    .by_month
                    .iter()
                    .map(|month| (html! { (month_label(month.month)) }, month.total)),
            ))
        }
    }
}

fn breakdown_table(
    title: &str,
    label_header: &str,
    data_name: &str,
    rows: impl Iterator<Item = (Markup, Decimal)>,
) -> Markup {
    html! {
        div
        {
            h3 class="text-lg font-semibold mb-2" { (title) }

            div class="overflow-x-auto rounded-lg shadow"
            {
                table
                    class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                    data-breakdown=(data_name)
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { (label_header) }
                            th scope="col" class="px-6 py-4 text-right"
                            {
                                "Total (" (BASE_CURRENCY.code()) ")"
                            }
                        }
                    }

                    tbody
                    {
                        @for (label, total) in rows {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                th scope="row" class=(TABLE_CELL_STYLE) { (label) }
                                td class=(AMOUNT_CELL_STYLE) { (format_money(total, BASE_CURRENCY)) }
                            }
                        }
                    }
                }
            }
        }
    }
}
