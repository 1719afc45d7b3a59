//! Defines the app level error type and conversions to rendered HTML pages and alerts.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use time::Date;

use crate::{alert::Alert, internal_server_error::InternalServerError, not_found::NotFoundError};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an invalid combination of username and password.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The auth token cookie is missing from the cookie jar in the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// There was an error parsing the date in the cookie or creating the new
    /// expiry date time.
    ///
    /// Callers should pass in the original error as a string and the date
    /// string that caused the error.
    #[error("could not format expiry cookie date-time string \"{1}\": {0}")]
    InvalidDateFormat(String, String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The username is empty, too long or contains characters other than
    /// letters, digits and `@.+-_`.
    #[error("{0}")]
    InvalidUsername(String),

    /// The username is already used by another account.
    #[error("the username is already taken")]
    DuplicateUsername,

    /// An empty string was used to create a pet name.
    #[error("Pet name cannot be empty")]
    EmptyPetName,

    /// An empty string was used to create a category name.
    #[error("Category name cannot be empty")]
    EmptyCategoryName,

    /// A text field exceeded its maximum length.
    #[error("{field} must be at most {max} characters long")]
    TextTooLong {
        /// The user facing name of the field.
        field: &'static str,
        /// The maximum number of characters.
        max: usize,
    },

    /// The string is not one of the known pet species.
    #[error("\"{0}\" is not a valid species")]
    InvalidSpecies(String),

    /// The string is not a hex color of the form `#rrggbb`.
    #[error("\"{0}\" is not a valid color, expected a color like #a1b2c3")]
    InvalidColor(String),

    /// The category name is already used by another category.
    #[error("the category name is already taken")]
    DuplicateCategoryName,

    /// The string could not be parsed as a decimal amount.
    #[error("\"{0}\" is not a valid amount")]
    InvalidAmount(String),

    /// An amount of zero or less was used for an expense.
    #[error("amount must be greater than zero")]
    NonPositiveAmount,

    /// An amount had more than two decimal places or more than ten digits.
    #[error("amount must have at most 10 digits and 2 decimal places")]
    AmountOutOfRange,

    /// An exchange rate of zero or less was given.
    #[error("exchange rate must be greater than zero")]
    NonPositiveRate,

    /// An exchange rate was too large or too precise to store.
    #[error("exchange rate must be at most 1,000,000 with at most 6 decimal places")]
    RateOutOfRange,

    /// Tried to store an exchange rate for the base currency.
    #[error("the base currency always has a rate of 1")]
    BaseCurrencyRate,

    /// The string is not one of the supported currency codes.
    #[error("\"{0}\" is not a supported currency")]
    InvalidCurrency(String),

    /// A date in the future was used for an expense or birth date.
    ///
    /// Expenses record events that have already happened, therefore future
    /// dates are not allowed.
    #[error("{0} is a date in the future, which is not allowed")]
    FutureDate(Date),

    /// A date string could not be parsed.
    #[error("\"{0}\" is not a valid date")]
    InvalidDate(String),

    /// The pet ID does not refer to a pet owned by the current user.
    #[error("choose one of your pets")]
    InvalidPet,

    /// The category ID does not refer to a valid category.
    #[error("choose a valid category")]
    InvalidCategory,

    /// The user already has the maximum number of pets.
    #[error("you can have at most {0} pets")]
    TooManyPets(u32),

    /// The pet already has the maximum number of expenses.
    #[error("a pet can have at most {0} expenses")]
    TooManyExpenses(u32),

    /// The multipart form could not be parsed.
    #[error("Could not parse multipart form: {0}")]
    MultipartError(String),

    /// The uploaded receipt is not a JPEG, PNG, GIF or WebP image.
    #[error("receipts must be JPEG, PNG, GIF or WebP images, got \"{0}\"")]
    UnsupportedReceiptType(String),

    /// The uploaded receipt is larger than the size limit.
    #[error("receipts must be at most 5 MiB")]
    ReceiptTooLarge,

    /// A receipt file could not be read or written.
    #[error("could not access receipt file: {0}")]
    ReceiptIoError(String),

    /// The CSV export could not be written.
    #[error("could not write CSV: {0}")]
    CsvError(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to update a pet that does not exist
    #[error("tried to update a pet that is not in the database")]
    UpdateMissingPet,

    /// Tried to delete a pet that does not exist
    #[error("tried to delete a pet that is not in the database")]
    DeleteMissingPet,

    /// Tried to update an expense that does not exist
    #[error("tried to update an expense that is not in the database")]
    UpdateMissingExpense,

    /// Tried to delete an expense that does not exist
    #[error("tried to delete an expense that is not in the database")]
    DeleteMissingExpense,

    /// Tried to update a category that does not exist
    #[error("tried to update a category that is not in the database")]
    UpdateMissingCategory,

    /// Tried to delete a category that does not exist
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,

    /// Tried to delete a category that other users have expenses in
    #[error("tried to delete a category that other users have expenses in")]
    CategoryInUse,

    /// Tried to update an exchange rate that does not exist
    #[error("tried to update an exchange rate that is not in the database")]
    UpdateMissingRate,

    /// Tried to delete an exchange rate that does not exist
    #[error("tried to delete an exchange rate that is not in the database")]
    DeleteMissingRate,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.username") =>
            {
                Error::DuplicateUsername
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("expense_category.name") =>
            {
                Error::DuplicateCategoryName
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => NotFoundError.into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Invalid Timezone Settings".to_owned(),
                    details: format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                    ),
                },
            ),
            Error::MultipartError(reason) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Could not read the form".to_owned(),
                    details: reason,
                },
            ),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Not found".to_owned(),
                    details: "The requested item could not be found.".to_owned(),
                },
            ),
            Error::UpdateMissingPet => missing_alert("update", "pet", false),
            Error::DeleteMissingPet => missing_alert("delete", "pet", true),
            Error::UpdateMissingExpense => missing_alert("update", "expense", false),
            Error::DeleteMissingExpense => missing_alert("delete", "expense", true),
            Error::UpdateMissingCategory => missing_alert("update", "category", false),
            Error::DeleteMissingCategory => missing_alert("delete", "category", true),
            Error::CategoryInUse => (
                StatusCode::CONFLICT,
                Alert::Error {
                    message: "Could not delete category".to_owned(),
                    details: "Other users have expenses in this category.".to_owned(),
                },
            ),
            Error::UpdateMissingRate => missing_alert("update", "exchange rate", false),
            Error::DeleteMissingRate => missing_alert("delete", "exchange rate", true),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Something went wrong".to_owned(),
                    details:
                        "An unexpected error occurred, check the server logs for more details."
                            .to_owned(),
                },
            ),
        };

        (status_code, alert.into_html()).into_response()
    }
}

fn missing_alert(action: &str, item: &str, suggest_refresh: bool) -> (StatusCode, Alert) {
    let details = if suggest_refresh {
        format!(
            "The {item} could not be found. \
            Try refreshing the page to see if the {item} has already been deleted."
        )
    } else {
        format!("The {item} could not be found.")
    };

    (
        StatusCode::NOT_FOUND,
        Alert::Error {
            message: format!("Could not {action} {item}"),
            details,
        },
    )
}
