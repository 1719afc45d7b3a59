//! Currencies, money amounts and how they are displayed.

use std::{
    fmt::{self, Display},
    str::FromStr,
    sync::OnceLock,
};

use numfmt::{Formatter, Precision};
use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};

use crate::Error;

/// The currencies an expense can be recorded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Rub,
    Usd,
    Eur,
}

/// The currency all totals are converted to.
pub const BASE_CURRENCY: Currency = Currency::Rub;

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Rub, Currency::Usd, Currency::Eur];

    /// The ISO 4217 code, e.g. "USD".
    pub fn code(self) -> &'static str {
        match self {
            Currency::Rub => "RUB",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Rub => "₽",
            Currency::Usd => "$",
            Currency::Eur => "€",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Currency::Rub => "Russian ruble",
            Currency::Usd => "US dollar",
            Currency::Eur => "Euro",
        }
    }

    pub fn is_base(self) -> bool {
        self == BASE_CURRENCY
    }

    /// The rate to the base currency used when no stored exchange rate applies.
    pub fn default_rate(self) -> Decimal {
        match self {
            Currency::Rub => Decimal::ONE,
            Currency::Usd => Decimal::from(90),
            Currency::Eur => Decimal::from(100),
        }
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();

        Currency::ALL
            .into_iter()
            .find(|currency| currency.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| Error::InvalidCurrency(code.to_owned()))
    }
}

impl ToSql for Currency {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.code()))
    }
}

impl FromSql for Currency {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// The amount of money spent on an expense.
///
/// Amounts are strictly positive with at most two decimal places and at most
/// ten digits in total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount(Decimal);

impl Amount {
    const DECIMAL_PLACES: u32 = 2;
    /// Ten digits with two after the decimal point leaves eight before it.
    const INTEGER_DIGITS: u32 = 8;

    /// Create an amount, rejecting values that are zero, negative, have more
    /// than two decimal places or are too large.
    pub fn new(value: Decimal) -> Result<Self, Error> {
        if value <= Decimal::ZERO {
            return Err(Error::NonPositiveAmount);
        }

        let upper_bound = Decimal::from(10_i64.pow(Self::INTEGER_DIGITS));

        if value.normalize().scale() > Self::DECIMAL_PLACES || value >= upper_bound {
            return Err(Error::AmountOutOfRange);
        }

        Ok(Self::new_unchecked(value))
    }

    /// Create an amount without validation.
    ///
    /// The caller should ensure the value is positive and has at most two decimal places.
    pub fn new_unchecked(mut value: Decimal) -> Self {
        value.rescale(Self::DECIMAL_PLACES);
        Self(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl FromStr for Amount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value =
            Decimal::from_str(trimmed).map_err(|_| Error::InvalidAmount(trimmed.to_owned()))?;

        Amount::new(value)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToSql for Amount {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.to_string()))
    }
}

impl FromSql for Amount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        decimal_from_sql(value).map(Amount::new_unchecked)
    }
}

/// Read a decimal stored as text.
pub(crate) fn decimal_from_sql(value: ValueRef<'_>) -> FromSqlResult<Decimal> {
    Decimal::from_str(value.as_str()?).map_err(|error| FromSqlError::Other(Box::new(error)))
}

/// Format `amount` rounded to two decimal places with thousands separators
/// and the currency symbol, e.g. "$1,234.50" or "1,234.50 ₽".
pub fn format_money(amount: Decimal, currency: Currency) -> String {
    static FORMATTER: OnceLock<Formatter> = OnceLock::new();

    let formatter = FORMATTER.get_or_init(|| {
        Formatter::new()
            .separator(',')
            .expect("comma is a valid separator")
            .precision(Precision::Decimals(0))
    });

    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded < Decimal::ZERO { "-" } else { "" };
    let absolute = rounded.abs();
    let whole = absolute.trunc();
    let cents = ((absolute - whole) * Decimal::ONE_HUNDRED)
        .to_u64()
        .unwrap_or_default();
    let number = format!("{sign}{}.{cents:02}", group_thousands(whole, formatter));

    if currency.is_base() {
        format!("{number} {}", currency.symbol())
    } else {
        format!("{}{number}", currency.symbol())
    }
}

/// Add thousands separators to a non-negative whole number.
///
/// numfmt goes through `f64` and switches to scientific notation from 1e12,
/// so it only ever sees the leading group of at most nine digits.
fn group_thousands(whole: Decimal, formatter: &Formatter) -> String {
    const CHUNK: u64 = 1_000_000_000;

    let chunk = Decimal::from(CHUNK);
    if whole < chunk {
        // Zero is hardcoded as "0" by numfmt, which is what we want here.
        return formatter.fmt_string(whole.to_u64().unwrap_or_default());
    }

    let low = (whole % chunk).to_u64().unwrap_or_default();
    format!(
        "{},{:03},{:03},{:03}",
        group_thousands((whole / chunk).trunc(), formatter),
        low / 1_000_000,
        low / 1_000 % 1_000,
        low % 1_000
    )
}


#[cfg(test)]
mod amount_tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use crate::Error;

    use super::Amount;

    #[test]
    fn parses_valid_amount() {
        let amount = Amount::from_str("12.5").unwrap();

        assert_eq!(amount.value(), Decimal::from_str("12.50").unwrap());
        assert_eq!(amount.to_string(), "12.50");
    }

    #[test]
    fn rejects_zero_and_negative() {
        assert_eq!(Amount::from_str("0"), Err(Error::NonPositiveAmount));
        assert_eq!(Amount::from_str("-3.50"), Err(Error::NonPositiveAmount));
    }

    #[test]
    fn rejects_more_than_two_decimal_places() {
        assert_eq!(Amount::from_str("1.234"), Err(Error::AmountOutOfRange));
    }

    #[test]
    fn accepts_trailing_zeros_beyond_two_places() {
        assert!(Amount::from_str("1.2300").is_ok());
    }

    #[test]
    fn rejects_more_than_ten_digits() {
        assert_eq!(
            Amount::from_str("100000000.00"),
            Err(Error::AmountOutOfRange)
        );
        assert!(Amount::from_str("99999999.99").is_ok());
    }

    #[test]
    fn rejects_non_numbers() {
        assert_eq!(
            Amount::from_str("twelve"),
            Err(Error::InvalidAmount("twelve".to_owned()))
        );
    }

    #[test]
    fn stores_as_text_in_sqlite() {
        let connection = rusqlite::Connection::open_in_memory().unwrap();
        let amount = Amount::from_str("42.10").unwrap();

        let (stored, read_back): (String, Amount) = connection
            .query_row("SELECT ?1, ?1", [&amount], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();

        assert_eq!(stored, "42.10");
        assert_eq!(read_back, amount);
    }
}
