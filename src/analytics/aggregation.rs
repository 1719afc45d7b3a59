//! Expense totals for the analytics page.
//!
//! [summarize_expenses] walks the expenses once and produces every breakdown
//! the page shows: totals per original currency, the base currency grand
//! total and the base currency totals per category, pet and month.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use time::{Date, Month};

use crate::{
    category::CategoryId,
    currency::CurrencyTotals,
    expense::ExpenseListItem,
    pet::PetId,
    rate::RateTable,
};

/// The base currency total of one category.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct CategoryTotal {
    pub name: String,
    /// The category's `#rrggbb` display color.
    pub color: String,
    pub total: Decimal,
}

/// The base currency total of one pet.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct PetTotal {
    pub name: String,
    pub total: Decimal,
}

/// The base currency total of one calendar month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct MonthTotal {
    /// The first day of the month.
    pub month: Date,
    pub total: Decimal,
}

/// Every breakdown shown on the analytics page.
#[derive(Debug, Default, Clone, PartialEq)]
pub(super) struct ExpenseSummary {
    pub totals: CurrencyTotals,
    /// Largest total first.
    pub by_category: Vec<CategoryTotal>,
    /// Largest total first.
    pub by_pet: Vec<PetTotal>,
    /// Oldest month first.
    pub by_month: Vec<MonthTotal>,
}

impl CategoryTotal {
    fn add(&mut self, amount: Decimal) {
        self.total = self.total.saturating_add(amount);
    }
}

impl PetTotal {
    fn add(&mut self, amount: Decimal) {
        self.total = self.total.saturating_add(amount);
    }
}

impl ExpenseSummary {
    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}

/// Sum `items` per currency, category, pet and month in a single pass.
pub(super) fn summarize_expenses(items: &[ExpenseListItem], rates: &RateTable) -> ExpenseSummary {
    let mut totals = CurrencyTotals::default();
    let mut by_category: BTreeMap<CategoryId, CategoryTotal> = BTreeMap::new();
    let mut by_pet: BTreeMap<PetId, PetTotal> = BTreeMap::new();
    let mut by_month: BTreeMap<Date, Decimal> = BTreeMap::new();

    for item in items {
        let expense = &item.expense;
        let base_amount = totals.add(
            expense.amount.value(),
            expense.currency,
            expense.date,
            rates,
        );

        by_category
            .entry(expense.category_id)
            .or_insert_with(|| CategoryTotal {
                name: item.category_name.clone(),
                color: item.category_color.clone(),
                total: Decimal::ZERO,
            })
            .add(base_amount);

        by_pet
            .entry(expense.pet_id)
            .or_insert_with(|| PetTotal {
                name: item.pet_name.clone(),
                total: Decimal::ZERO,
            })
            .add(base_amount);

        let month_total = by_month.entry(first_of_month(expense.date)).or_default();
        *month_total = month_total.saturating_add(base_amount);
    }

    let mut by_category: Vec<_> = by_category.into_values().collect();
    by_category.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));

    let mut by_pet: Vec<_> = by_pet.into_values().collect();
    by_pet.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));

    ExpenseSummary {
        totals,
        by_category,
        by_pet,
        by_month: by_month
            .into_iter()
            .map(|(month, total)| MonthTotal { month, total })
            .collect(),
    }
}

fn first_of_month(date: Date) -> Date {
    Date::from_calendar_date(date.year(), date.month(), 1).unwrap_or(date)
}

/// Format a month as e.g. "Jan 2025".
pub(super) fn month_label(month: Date) -> String {
    let name = match month.month() {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    };

    format!("{name} {}", month.year())
}

#[cfg(test)]
mod aggregation_tests {
    use rust_decimal::Decimal;
    use time::{Date, macros::date};

    use crate::{
        currency::{Amount, Currency},
        expense::{Expense, ExpenseListItem},
        rate::RateTable,
    };

    use super::{month_label, summarize_expenses};

    fn item(
        amount: i64,
        currency: Currency,
        date: Date,
        pet: (i64, &str),
        category: (i64, &str),
    ) -> ExpenseListItem {
        ExpenseListItem {
            expense: Expense {
                id: 0,
                pet_id: pet.0,
                category_id: category.0,
                amount: Amount::new_unchecked(Decimal::from(amount)),
                currency,
                date,
                description: String::new(),
                receipt: None,
            },
            pet_name: pet.1.to_owned(),
            category_name: category.1.to_owned(),
            category_color: "#000000".to_owned(),
        }
    }

    #[test]
    fn converts_to_base_currency_with_default_rates() {
        let items = [item(
            100,
            Currency::Usd,
            date!(2025 - 01 - 15),
            (1, "Rex"),
            (1, "Food"),
        )];

        let summary = summarize_expenses(&items, &RateTable::default());

        assert_eq!(summary.totals.base_total, Decimal::from(9000));
        assert_eq!(
            summary.totals.by_currency.get(&Currency::Usd),
            Some(&Decimal::from(100))
        );
    }

    #[test]
    fn groups_by_category_pet_and_month() {
        let items = [
            item(10, Currency::Rub, date!(2025 - 01 - 03), (1, "Rex"), (1, "Food")),
            item(20, Currency::Rub, date!(2025 - 01 - 20), (2, "Tom"), (1, "Food")),
            item(5, Currency::Rub, date!(2025 - 03 - 01), (1, "Rex"), (2, "Toys")),
        ];

        let summary = summarize_expenses(&items, &RateTable::default());

        let categories: Vec<_> = summary
            .by_category
            .iter()
            .map(|category| (category.name.as_str(), category.total))
            .collect();
        assert_eq!(
            categories,
            [("Food", Decimal::from(30)), ("Toys", Decimal::from(5))]
        );

        let pets: Vec<_> = summary
            .by_pet
            .iter()
            .map(|pet| (pet.name.as_str(), pet.total))
            .collect();
        assert_eq!(pets, [("Tom", Decimal::from(20)), ("Rex", Decimal::from(15))]);

        let months: Vec<_> = summary
            .by_month
            .iter()
            .map(|month| (month.month, month.total))
            .collect();
        assert_eq!(
            months,
            [
                (date!(2025 - 01 - 01), Decimal::from(30)),
                (date!(2025 - 03 - 01), Decimal::from(5)),
            ]
        );
    }

    #[test]
    fn empty_input_gives_empty_summary() {
        let summary = summarize_expenses(&[], &RateTable::default());

        assert!(summary.is_empty());
        assert_eq!(summary.totals.base_total, Decimal::ZERO);
    }

    #[test]
    fn month_label_has_name_and_year() {
        assert_eq!(month_label(date!(2025 - 02 - 01)), "Feb 2025");
    }
}
