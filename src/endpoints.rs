//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/pets/{pet_id}', use [format_endpoint].

/// The root route which redirects to the home page or log in page.
pub const ROOT: &str = "/";
/// The landing page for logged in users.
pub const HOME_VIEW: &str = "/home";
/// The page listing the user's pets.
pub const PETS_VIEW: &str = "/pets";
/// The page for creating a new pet.
pub const NEW_PET_VIEW: &str = "/pets/new";
/// The page showing a single pet and its expenses.
pub const PET_VIEW: &str = "/pets/{pet_id}";
/// The page for editing a pet.
pub const EDIT_PET_VIEW: &str = "/pets/{pet_id}/edit";
/// The page listing the user's expenses.
pub const EXPENSES_VIEW: &str = "/expenses";
/// The page for creating a new expense.
pub const NEW_EXPENSE_VIEW: &str = "/expenses/new";
/// The page for editing an expense.
pub const EDIT_EXPENSE_VIEW: &str = "/expenses/{expense_id}/edit";
/// The receipt image attached to an expense.
pub const EXPENSE_RECEIPT: &str = "/expenses/{expense_id}/receipt";
/// The page with expense totals and charts.
pub const ANALYTICS_VIEW: &str = "/analytics";
/// Download the user's expenses as a CSV file.
pub const EXPORT_CSV: &str = "/export/csv";
/// The page listing the expense categories.
pub const CATEGORIES_VIEW: &str = "/categories";
/// The page for creating a new category.
pub const NEW_CATEGORY_VIEW: &str = "/categories/new";
/// The page for editing a category.
pub const EDIT_CATEGORY_VIEW: &str = "/categories/{category_id}/edit";
/// The page listing the exchange rates.
pub const RATES_VIEW: &str = "/rates";
/// The page for adding an exchange rate.
pub const NEW_RATE_VIEW: &str = "/rates/new";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route to create users.
pub const USERS: &str = "/api/users";
/// The route to create a pet.
pub const PETS_API: &str = "/api/pets";
/// The route to update or delete a pet.
pub const PET_API: &str = "/api/pets/{pet_id}";
/// The route to create an expense.
pub const EXPENSES_API: &str = "/api/expenses";
/// The route to update or delete an expense.
pub const EXPENSE_API: &str = "/api/expenses/{expense_id}";
/// The route to create a category.
pub const CATEGORIES_API: &str = "/api/categories";
/// The route to update or delete a category.
pub const CATEGORY_API: &str = "/api/categories/{category_id}";
/// The route to create an exchange rate.
pub const RATES_API: &str = "/api/rates";
/// The route to delete an exchange rate.
pub const RATE_API: &str = "/api/rates/{rate_id}";
/// The route to toggle whether an exchange rate is used.
pub const RATE_ACTIVE_API: &str = "/api/rates/{rate_id}/active";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/pets/{pet_id}', '{pet_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    #[track_caller]
    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok(), "{uri} is not a valid URI");
    }

    #[test]
    fn endpoints_are_valid_uris() {
        for endpoint in [
            endpoints::ROOT,
            endpoints::HOME_VIEW,
            endpoints::PETS_VIEW,
            endpoints::NEW_PET_VIEW,
            endpoints::PET_VIEW,
            endpoints::EDIT_PET_VIEW,
            endpoints::EXPENSES_VIEW,
            endpoints::NEW_EXPENSE_VIEW,
            endpoints::EDIT_EXPENSE_VIEW,
            endpoints::EXPENSE_RECEIPT,
            endpoints::ANALYTICS_VIEW,
            endpoints::EXPORT_CSV,
            endpoints::CATEGORIES_VIEW,
            endpoints::NEW_CATEGORY_VIEW,
            endpoints::EDIT_CATEGORY_VIEW,
            endpoints::RATES_VIEW,
            endpoints::NEW_RATE_VIEW,
            endpoints::REGISTER_VIEW,
            endpoints::LOG_IN_VIEW,
            endpoints::INTERNAL_ERROR_VIEW,
            endpoints::STATIC,
            endpoints::LOG_IN_API,
            endpoints::LOG_OUT,
            endpoints::USERS,
            endpoints::PETS_API,
            endpoints::PET_API,
            endpoints::EXPENSES_API,
            endpoints::EXPENSE_API,
            endpoints::CATEGORIES_API,
            endpoints::CATEGORY_API,
            endpoints::RATES_API,
            endpoints::RATE_API,
            endpoints::RATE_ACTIVE_API,
        ] {
            assert_endpoint_is_valid_uri(endpoint);
        }
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint("/pets/{pet_id}", 1);

        assert_eq!(formatted_path, "/pets/1");
        assert!(formatted_path.parse::<Uri>().is_ok());

        // Parameter with single word should also work.
        let formatted_path = format_endpoint("/pets/{pet}", 1);

        assert_eq!(formatted_path, "/pets/1");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint("/pets", 1);

        assert_eq!(formatted_path, "/pets");
    }

    #[test]
    fn parameter_in_middle() {
        let formatted_path = format_endpoint("/expenses/{expense_id}/receipt", 42);

        assert_eq!(formatted_path, "/expenses/42/receipt");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }
}
