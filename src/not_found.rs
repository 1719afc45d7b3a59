//! The page shown for unknown routes and for resources the user cannot see.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::html::error_view;

/// Renders the 404 page.
pub struct NotFoundError;

impl IntoResponse for NotFoundError {
    fn into_response(self) -> Response {
        (
            StatusCode::NOT_FOUND,
            error_view(
                "Not Found",
                "404",
                "Something's missing.",
                "Sorry, we can't find that page. Check the address or go back to the homepage.",
            ),
        )
            .into_response()
    }
}

/// Route handler for the router fallback.
pub async fn get_404_not_found() -> Response {
    NotFoundError.into_response()
}
