//! Exchange rate types and the in-memory rate lookup.

use std::{
    collections::HashMap,
    fmt::{self, Display},
    str::FromStr,
};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef},
};
use rust_decimal::Decimal;
use time::Date;

use crate::{
    Error,
    currency::{Currency, decimal_from_sql},
};

/// Database identifier for an exchange rate.
pub type RateId = i64;

/// How many units of the base currency one unit of another currency is worth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Rate(Decimal);

impl Rate {
    /// The largest rate that can be stored.
    pub const MAX: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);
    const DECIMAL_PLACES: u32 = 6;

    /// Create a rate.
    ///
    /// # Errors
    ///
    /// Returns [Error::NonPositiveRate] if `value` is zero or negative, or
    /// [Error::RateOutOfRange] if it is larger than [Rate::MAX] or has more
    /// than six decimal places.
    pub fn new(value: Decimal) -> Result<Self, Error> {
        let value = value.normalize();

        if value <= Decimal::ZERO {
            Err(Error::NonPositiveRate)
        } else if value > Self::MAX || value.scale() > Self::DECIMAL_PLACES {
            Err(Error::RateOutOfRange)
        } else {
            Ok(Self(value))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl FromStr for Rate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value =
            Decimal::from_str(trimmed).map_err(|_| Error::InvalidAmount(trimmed.to_owned()))?;

        Rate::new(value)
    }
}

impl Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToSql for Rate {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.to_string()))
    }
}

impl FromSql for Rate {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        decimal_from_sql(value).map(Rate)
    }
}

/// A stored rate for converting `currency` to the base currency from `effective_date` onwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRate {
    pub id: RateId,
    pub currency: Currency,
    pub rate: Rate,
    pub effective_date: Date,
    /// Inactive rates are kept for reference but ignored by lookups.
    pub is_active: bool,
}

/// The fields needed to store a new exchange rate.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExchangeRate {
    pub currency: Currency,
    pub rate: Rate,
    pub effective_date: Date,
    pub is_active: bool,
}

impl NewExchangeRate {
    /// # Errors
    ///
    /// Returns [Error::BaseCurrencyRate] if `currency` is the base currency,
    /// which always converts at exactly 1.
    pub fn new(
        currency: Currency,
        rate: Rate,
        effective_date: Date,
        is_active: bool,
    ) -> Result<Self, Error> {
        if currency.is_base() {
            return Err(Error::BaseCurrencyRate);
        }

        Ok(Self {
            currency,
            rate,
            effective_date,
            is_active,
        })
    }
}

/// Active exchange rates indexed by currency for converting many amounts at once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    /// Sorted by effective date then ID, so later entries win ties.
    rates: HashMap<Currency, Vec<(Date, RateId, Decimal)>>,
}

impl RateTable {
    /// Build a table from `rates`, skipping inactive ones.
    pub fn new(rates: impl IntoIterator<Item = ExchangeRate>) -> Self {
        let mut table: HashMap<Currency, Vec<(Date, RateId, Decimal)>> = HashMap::new();

        for rate in rates.into_iter().filter(|rate| rate.is_active) {
            table.entry(rate.currency).or_default().push((
                rate.effective_date,
                rate.id,
                rate.rate.value(),
            ));
        }

        for entries in table.values_mut() {
            entries.sort_unstable_by_key(|(date, id, _)| (*date, *id));
        }

        Self { rates: table }
    }

    /// The most recent active rate for `currency` effective on or before `date`.
    ///
    /// Falls back to the currency's default rate, and the base currency is always 1.
    pub fn rate_for(&self, currency: Currency, date: Date) -> Decimal {
        if currency.is_base() {
            return Decimal::ONE;
        }

        self.rates
            .get(&currency)
            .and_then(|entries| {
                let end = entries.partition_point(|(effective_date, _, _)| *effective_date <= date);
                end.checked_sub(1).map(|index| entries[index].2)
            })
            .unwrap_or_else(|| currency.default_rate())
    }

    /// Convert `amount` in `currency` on `date` to the base currency.
    ///
    /// Saturates at [Decimal::MAX] instead of overflowing, e.g. for a rate
    /// stored before rates were bounded.
    pub fn to_base(&self, amount: Decimal, currency: Currency, date: Date) -> Decimal {
        amount.saturating_mul(self.rate_for(currency, date))
    }
}
