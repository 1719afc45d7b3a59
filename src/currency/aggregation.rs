//! Totals of money amounts across currencies.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use time::Date;

use crate::{currency::Currency, rate::RateTable};

/// The sum of a set of amounts per original currency and converted to the base currency.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CurrencyTotals {
    /// Raw sums in each currency that appeared at least once.
    pub by_currency: BTreeMap<Currency, Decimal>,
    /// The sum of every amount converted with the rate in effect on its date.
    pub base_total: Decimal,
}

impl CurrencyTotals {
    /// Add one amount and return its value in the base currency.
    ///
    /// Totals saturate at [Decimal::MAX] rather than overflowing.
    pub fn add(
        &mut self,
        amount: Decimal,
        currency: Currency,
        date: Date,
        rates: &RateTable,
    ) -> Decimal {
        let currency_total = self.by_currency.entry(currency).or_default();
        *currency_total = currency_total.saturating_add(amount);

        let base_amount = rates.to_base(amount, currency, date);
        self.base_total = self.base_total.saturating_add(base_amount);

        base_amount
    }

    pub fn is_empty(&self) -> bool {
        self.by_currency.is_empty()
    }
}

/// Sum `(amount, currency, date)` triples in a single pass.
pub fn aggregate_totals<I>(amounts: I, rates: &RateTable) -> CurrencyTotals
where
    I: IntoIterator<Item = (Decimal, Currency, Date)>,
{
    amounts
        .into_iter()
        .fold(CurrencyTotals::default(), |mut totals, (amount, currency, date)| {
            totals.add(amount, currency, date, rates);
            totals
        })
}

#[cfg(test)]
mod aggregation_tests {
    use rust_decimal::Decimal;
    use time::macros::date;

    use crate::{
        currency::Currency,
        rate::{ExchangeRate, Rate, RateTable},
    };

    use super::aggregate_totals;

    fn rate(currency: Currency, value: i64, effective_date: time::Date) -> ExchangeRate {
        ExchangeRate {
            id: 0,
            currency,
            rate: Rate::new(Decimal::from(value)).unwrap(),
            effective_date,
            is_active: true,
        }
    }

    #[test]
    fn converts_with_rate_on_expense_date() {
        let rates = RateTable::new(vec![rate(Currency::Usd, 90, date!(2025 - 01 - 01))]);

        let totals = aggregate_totals(
            vec![(Decimal::from(100), Currency::Usd, date!(2025 - 02 - 01))],
            &rates,
        );

        assert_eq!(totals.base_total, Decimal::from(9000));
        assert_eq!(totals.by_currency[&Currency::Usd], Decimal::from(100));
    }

    #[test]
    fn groups_raw_amounts_by_currency() {
        let rates = RateTable::default();

        let totals = aggregate_totals(
            vec![
                (Decimal::from(10), Currency::Rub, date!(2025 - 01 - 01)),
                (Decimal::from(5), Currency::Eur, date!(2025 - 01 - 02)),
                (Decimal::from(15), Currency::Rub, date!(2025 - 01 - 03)),
            ],
            &rates,
        );

        assert_eq!(totals.by_currency.len(), 2);
        assert_eq!(totals.by_currency[&Currency::Rub], Decimal::from(25));
        assert_eq!(totals.by_currency[&Currency::Eur], Decimal::from(5));
        // 25 * 1 + 5 * 100 with the default EUR rate.
        assert_eq!(totals.base_total, Decimal::from(525));
    }

    #[test]
    fn uses_different_rates_over_time() {
        let rates = RateTable::new(vec![
            rate(Currency::Usd, 80, date!(2024 - 01 - 01)),
            rate(Currency::Usd, 100, date!(2025 - 01 - 01)),
        ]);

        let totals = aggregate_totals(
            vec![
                (Decimal::ONE, Currency::Usd, date!(2024 - 06 - 01)),
                (Decimal::ONE, Currency::Usd, date!(2025 - 06 - 01)),
            ],
            &rates,
        );

        assert_eq!(totals.base_total, Decimal::from(180));
    }

    #[test]
    fn empty_input_gives_zero() {
        let totals = aggregate_totals(Vec::new(), &RateTable::default());

        assert!(totals.is_empty());
        assert_eq!(totals.base_total, Decimal::ZERO);
    }
}
