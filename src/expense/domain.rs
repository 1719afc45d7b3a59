//! Expense domain types and form validation.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    category::CategoryId,
    currency::{Amount, Currency},
    period::parse_optional_date,
    pet::PetId,
};

pub type ExpenseId = i64;

/// The maximum number of characters in an expense description.
pub const MAX_DESCRIPTION_LENGTH: usize = 1000;

/// Money spent on a pet.
#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    pub id: ExpenseId,
    pub pet_id: PetId,
    pub category_id: CategoryId,
    pub amount: Amount,
    pub currency: Currency,
    pub date: Date,
    pub description: String,
    /// The file name of the receipt image in the media directory.
    pub receipt: Option<String>,
}

/// The validated fields of an expense, used to create or update one.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub pet_id: PetId,
    pub category_id: CategoryId,
    pub amount: Amount,
    pub currency: Currency,
    pub date: Date,
    pub description: String,
    pub receipt: Option<String>,
}

/// The text fields of the expense form.
///
/// The form is sent as multipart data so that a receipt can be attached,
/// so every field arrives as a string.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseFormData {
    pub pet_id: String,
    pub category_id: String,
    pub amount: String,
    pub currency: String,
    pub date: String,
    pub description: String,
    /// Whether the "remove receipt" checkbox was ticked.
    pub remove_receipt: bool,
}

impl ExpenseFormData {
    /// Validate the form, rejecting dates after `today`.
    ///
    /// The returned expense has no receipt, the caller decides which receipt to keep.
    pub fn validate(&self, today: Date) -> Result<NewExpense, Error> {
        let pet_id = self.pet_id.trim().parse().map_err(|_| Error::InvalidPet)?;
        let category_id = self
            .category_id
            .trim()
            .parse()
            .map_err(|_| Error::InvalidCategory)?;
        let amount = Amount::from_str(&self.amount)?;
        let currency = Currency::from_str(&self.currency)?;
        let date = parse_optional_date(&self.date)?
            .ok_or_else(|| Error::InvalidDate(self.date.clone()))?;

        if date > today {
            return Err(Error::FutureDate(date));
        }

        let description = self.description.trim();

        if description.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(Error::TextTooLong {
                field: "Description",
                max: MAX_DESCRIPTION_LENGTH,
            });
        }

        Ok(NewExpense {
            pet_id,
            category_id,
            amount,
            currency,
            date,
            description: description.to_owned(),
            receipt: None,
        })
    }
}

impl From<&Expense> for ExpenseFormData {
    fn from(expense: &Expense) -> Self {
        Self {
            pet_id: expense.pet_id.to_string(),
            category_id: expense.category_id.to_string(),
            amount: expense.amount.to_string(),
            currency: expense.currency.code().to_owned(),
            date: expense.date.to_string(),
            description: expense.description.clone(),
            remove_receipt: false,
        }
    }
}

#[cfg(test)]
mod expense_domain_tests {
    use rust_decimal::Decimal;
    use time::macros::date;

    use crate::{Error, currency::Currency};

    use super::ExpenseFormData;

    fn form() -> ExpenseFormData {
        ExpenseFormData {
            pet_id: "1".to_owned(),
            category_id: "2".to_owned(),
            amount: " 1234.5 ".to_owned(),
            currency: "usd".to_owned(),
            date: "2025-03-01".to_owned(),
            description: "  Annual check-up ".to_owned(),
            remove_receipt: false,
        }
    }

    #[test]
    fn validate_parses_fields() {
        let expense = form().validate(date!(2025 - 03 - 01)).unwrap();

        assert_eq!(expense.pet_id, 1);
        assert_eq!(expense.category_id, 2);
        assert_eq!(expense.amount.value(), Decimal::new(123450, 2));
        assert_eq!(expense.currency, Currency::Usd);
        assert_eq!(expense.date, date!(2025 - 03 - 01));
        assert_eq!(expense.description, "Annual check-up");
        assert_eq!(expense.receipt, None);
    }

    #[test]
    fn validate_rejects_non_positive_amount() {
        let mut form = form();
        form.amount = "0".to_owned();

        assert_eq!(
            form.validate(date!(2025 - 03 - 01)),
            Err(Error::NonPositiveAmount)
        );

        form.amount = "-5".to_owned();

        assert_eq!(
            form.validate(date!(2025 - 03 - 01)),
            Err(Error::NonPositiveAmount)
        );
    }

    #[test]
    fn validate_rejects_future_date() {
        assert_eq!(
            form().validate(date!(2025 - 02 - 28)),
            Err(Error::FutureDate(date!(2025 - 03 - 01)))
        );
    }

    #[test]
    fn validate_rejects_missing_date() {
        let mut form = form();
        form.date = String::new();

        assert_eq!(
            form.validate(date!(2025 - 03 - 01)),
            Err(Error::InvalidDate(String::new()))
        );
    }

    #[test]
    fn validate_rejects_unknown_currency() {
        let mut form = form();
        form.currency = "GBP".to_owned();

        assert_eq!(
            form.validate(date!(2025 - 03 - 01)),
            Err(Error::InvalidCurrency("GBP".to_owned()))
        );
    }

    #[test]
    fn validate_rejects_missing_pet() {
        let mut form = form();
        form.pet_id = String::new();

        assert_eq!(form.validate(date!(2025 - 03 - 01)), Err(Error::InvalidPet));
    }

    #[test]
    fn validate_rejects_long_description() {
        let mut form = form();
        form.description = "a".repeat(1001);

        assert!(matches!(
            form.validate(date!(2025 - 03 - 01)),
            Err(Error::TextTooLong { .. })
        ));
    }
}
