//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    response::Redirect,
    routing::{delete, get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    analytics::get_analytics_page,
    auth::{
        auth_guard, auth_guard_hx, get_log_in_page, get_log_out, get_register_page, post_log_in,
        register_user,
    },
    category::{
        create_category_endpoint, delete_category_endpoint, get_categories_page,
        get_edit_category_page, get_new_category_page, update_category_endpoint,
    },
    endpoints,
    expense::{
        MAX_RECEIPT_SIZE, create_expense_endpoint, delete_expense_endpoint,
        get_edit_expense_page, get_expenses_page, get_new_expense_page, get_receipt,
        update_expense_endpoint,
    },
    export::export_csv,
    home::get_home_page,
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    pet::{
        create_pet_endpoint, delete_pet_endpoint, get_edit_pet_page, get_new_pet_page,
        get_pet_page, get_pets_page, update_pet_endpoint,
    },
    rate::{
        create_rate_endpoint, delete_rate_endpoint, get_new_rate_page, get_rates_page,
        toggle_rate_active_endpoint,
    },
};

/// The largest request body accepted by the expense endpoints, enough for a
/// receipt plus the other form fields.
const EXPENSE_BODY_LIMIT: usize = MAX_RECEIPT_SIZE + 1024 * 1024;

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(endpoints::USERS, post(register_user))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::HOME_VIEW, get(get_home_page))
        .route(endpoints::PETS_VIEW, get(get_pets_page))
        .route(endpoints::NEW_PET_VIEW, get(get_new_pet_page))
        .route(endpoints::PET_VIEW, get(get_pet_page))
        .route(endpoints::EDIT_PET_VIEW, get(get_edit_pet_page))
        .route(endpoints::EXPENSES_VIEW, get(get_expenses_page))
        .route(endpoints::NEW_EXPENSE_VIEW, get(get_new_expense_page))
        .route(endpoints::EDIT_EXPENSE_VIEW, get(get_edit_expense_page))
        .route(endpoints::EXPENSE_RECEIPT, get(get_receipt))
        .route(endpoints::ANALYTICS_VIEW, get(get_analytics_page))
        .route(endpoints::EXPORT_CSV, get(export_csv))
        .route(endpoints::CATEGORIES_VIEW, get(get_categories_page))
        .route(endpoints::NEW_CATEGORY_VIEW, get(get_new_category_page))
        .route(endpoints::EDIT_CATEGORY_VIEW, get(get_edit_category_page))
        .route(endpoints::RATES_VIEW, get(get_rates_page))
        .route(endpoints::NEW_RATE_VIEW, get(get_new_rate_page))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    let expense_api_routes = Router::new()
        .route(endpoints::EXPENSES_API, post(create_expense_endpoint))
        .route(
            endpoints::EXPENSE_API,
            put(update_expense_endpoint).delete(delete_expense_endpoint),
        )
        .layer(DefaultBodyLimit::max(EXPENSE_BODY_LIMIT));

    // These routes need to use the HX-REDIRECT header for auth redirects to work properly for HTMX requests.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(endpoints::PETS_API, post(create_pet_endpoint))
            .route(
                endpoints::PET_API,
                put(update_pet_endpoint).delete(delete_pet_endpoint),
            )
            .merge(expense_api_routes)
            .route(endpoints::CATEGORIES_API, post(create_category_endpoint))
            .route(
                endpoints::CATEGORY_API,
                put(update_category_endpoint).delete(delete_category_endpoint),
            )
            .route(endpoints::RATES_API, post(create_rate_endpoint))
            .route(endpoints::RATE_API, delete(delete_rate_endpoint))
            .route(
                endpoints::RATE_ACTIVE_API,
                put(toggle_rate_active_endpoint),
            )
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the home page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::HOME_VIEW)
}

#[cfg(test)]
mod router_tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{
        AppState, Limits, endpoints,
        routing::{build_router, get_index_page},
        test_utils::temp_media_dir,
    };

    fn get_test_server() -> TestServer {
        let state = AppState::new(
            Connection::open_in_memory().unwrap(),
            "42",
            "Europe/Moscow",
            Limits::default(),
            temp_media_dir("router"),
        )
        .unwrap();

        TestServer::try_new(build_router(state)).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn root_redirects_to_home() {
        let response = get_index_page().await.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let location = response.headers().get("location").unwrap();
        assert_eq!(location, endpoints::HOME_VIEW);
    }

    #[tokio::test]
    async fn protected_page_redirects_to_log_in() {
        let server = get_test_server();

        let response = server.get(endpoints::PETS_VIEW).await;

        response.assert_status(StatusCode::SEE_OTHER);
        let location = response.header("location");
        let location = location.to_str().unwrap();
        assert!(
            location.starts_with(endpoints::LOG_IN_VIEW),
            "got redirect to {location}"
        );
        assert!(location.contains("redirect_url="), "got {location}");
    }

    #[tokio::test]
    async fn protected_api_route_uses_hx_redirect() {
        let server = get_test_server();

        let response = server.delete("/api/pets/1").await;

        let location = response.header("hx-redirect");
        assert!(
            location.to_str().unwrap().starts_with(endpoints::LOG_IN_VIEW),
            "got {location:?}"
        );
    }

    #[tokio::test]
    async fn log_in_page_is_public() {
        let server = get_test_server();

        server.get(endpoints::LOG_IN_VIEW).await.assert_status_ok();
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let server = get_test_server();

        server
            .get("/definitely/not/a/page")
            .await
            .assert_status_not_found();
    }
}
