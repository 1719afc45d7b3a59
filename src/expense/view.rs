//! The expense table shown on the expense list, pet detail and home pages.

use maud::{Markup, html};
use unicode_segmentation::UnicodeSegmentation;

use crate::{
    currency::{BASE_CURRENCY, format_money},
    endpoints,
    expense::ExpenseListItem,
    html::{
        LINK_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, category_badge,
        edit_delete_action_links,
    },
    rate::RateTable,
};

/// The max number of graphemes to display in the expense table rows before
/// truncating and displaying ellipses.
const MAX_DESCRIPTION_GRAPHEMES: usize = 32;

/// Whether to show the pet column. Pages about a single pet hide it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PetColumn {
    Show,
    Hide,
}

pub(crate) fn expense_table(
    items: &[ExpenseListItem],
    rates: &RateTable,
    pet_column: PetColumn,
) -> Markup {
    let show_pet = pet_column == PetColumn::Show;

    html! {
        div class="w-full overflow-x-auto"
        {
            table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                        @if show_pet {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Pet" }
                        }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        th scope="col" class="hidden md:table-cell px-6 py-4" { "Description" }
                        th scope="col" class="px-6 py-4 text-right" { "Amount" }
                        th scope="col" class="px-6 py-4 text-right" { "In " (BASE_CURRENCY.code()) }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                    }
                }

                tbody
                {
                    @for item in items {
                        (expense_row(item, rates, show_pet))
                    }
                }
            }
        }
    }
}

fn expense_row(item: &ExpenseListItem, rates: &RateTable, show_pet: bool) -> Markup {
    let expense = &item.expense;
    let (description, tooltip) = format_description(&expense.description);
    let base_amount = rates.to_base(expense.amount.value(), expense.currency, expense.date);
    let edit_url = endpoints::format_endpoint(endpoints::EDIT_EXPENSE_VIEW, expense.id);
    let delete_url = endpoints::format_endpoint(endpoints::EXPENSE_API, expense.id);
    let confirm_message = format!(
        "Are you sure you want to delete the expense of {} on {}? This cannot be undone.",
        format_money(expense.amount.value(), expense.currency),
        expense.date
    );

    html! {
        tr class=(TABLE_ROW_STYLE) data-expense-row="true"
        {
            td class="px-6 py-4 whitespace-nowrap" { (expense.date.to_string()) }
            @if show_pet {
                td class=(TABLE_CELL_STYLE)
                {
                    a
                        href=(endpoints::format_endpoint(endpoints::PET_VIEW, expense.pet_id))
                        class=(LINK_STYLE)
                    {
                        (item.pet_name)
                    }
                }
            }
            td class=(TABLE_CELL_STYLE) { (category_badge(&item.category_name, &item.category_color)) }
            td class="hidden md:table-cell px-6 py-4" title=[tooltip]
            {
                (description)

                @if expense.receipt.is_some() {
                    " "
                    a
                        href=(endpoints::format_endpoint(endpoints::EXPENSE_RECEIPT, expense.id))
                        target="_blank"
                        class=(LINK_STYLE)
                    {
                        "(receipt)"
                    }
                }
            }
            td class="px-6 py-4 text-right tabular-nums whitespace-nowrap"
            {
                (format_money(expense.amount.value(), expense.currency))
            }
            td class="px-6 py-4 text-right tabular-nums whitespace-nowrap"
            {
                (format_money(base_amount, BASE_CURRENCY))
            }
            td class=(TABLE_CELL_STYLE)
            {
                (edit_delete_action_links(
                    &edit_url,
                    &delete_url,
                    &confirm_message,
                    "closest tr",
                    "delete",
                ))
            }
        }
    }
}

fn format_description(description: &str) -> (String, Option<&str>) {
    let description_length = description.graphemes(true).count();

    if description_length <= MAX_DESCRIPTION_GRAPHEMES {
        (description.to_owned(), None)
    } else {
        let truncated: String = description
            .graphemes(true)
            .take(MAX_DESCRIPTION_GRAPHEMES - 3)
            .collect();
        (truncated + "...", Some(description))
    }
}
