//! Expense deletion endpoint.

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::Alert,
    auth::UserID,
    expense::{ExpenseId, delete_expense, get_expense, remove_unused_receipts},
};

/// The state needed for deleting an expense.
#[derive(Debug, Clone)]
pub struct DeleteExpenseState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The directory receipt images are stored in.
    pub media_dir: PathBuf,
}

impl FromRef<AppState> for DeleteExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            media_dir: state.media_dir.clone(),
        }
    }
}

/// Delete an expense and its receipt if no other expense uses it.
pub async fn delete_expense_endpoint(
    Path(expense_id): Path<ExpenseId>,
    State(state): State<DeleteExpenseState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let receipt = match get_expense(expense_id, user_id, &connection) {
        Ok(expense) => expense.receipt,
        Err(Error::NotFound) => return Error::DeleteMissingExpense.into_alert_response(),
        Err(error) => {
            tracing::error!("Could not get expense {expense_id}: {error}");
            return error.into_alert_response();
        }
    };

    match delete_expense(expense_id, user_id, &connection) {
        Ok(()) => {
            if let Some(receipt) = receipt {
                remove_unused_receipts(&[receipt], &state.media_dir, &connection);
            }

            Alert::SuccessSimple {
                message: "Expense deleted successfully".to_owned(),
            }
            .into_response()
        }
        Err(Error::DeleteMissingExpense) => Error::DeleteMissingExpense.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting expense {expense_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod delete_expense_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };

    use crate::{
        Error,
        expense::{NewExpense, create_expense, get_expense},
        test_utils::{
            TestFixture, assert_valid_html, create_test_user, parse_html_fragment,
            temp_media_dir,
        },
    };

    use super::{DeleteExpenseState, delete_expense_endpoint};

    #[tokio::test]
    async fn deletes_expense_and_receipt() {
        let fixture = TestFixture::new();
        let media_dir = temp_media_dir("delete_expense");
        std::fs::write(media_dir.join("receipt.png"), b"png").unwrap();
        let expense = create_expense(
            fixture.user.id,
            NewExpense {
                receipt: Some("receipt.png".to_owned()),
                ..fixture.new_expense("3.50", "EUR")
            },
            1000,
            &fixture.connection,
        )
        .unwrap();
        let user_id = fixture.user.id;
        let state = DeleteExpenseState {
            db_connection: Arc::new(Mutex::new(fixture.connection)),
            media_dir: media_dir.clone(),
        };

        let response =
            delete_expense_endpoint(Path(expense.id), State(state.clone()), Extension(user_id))
                .await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        assert_eq!(
            get_expense(expense.id, user_id, &state.db_connection.lock().unwrap()),
            Err(Error::NotFound)
        );
        assert!(!media_dir.join("receipt.png").exists());
    }

    #[tokio::test]
    async fn cannot_delete_other_users_expense() {
        let fixture = TestFixture::new();
        let expense = fixture.create_expense("3.50", "EUR");
        let stranger = create_test_user("mallory", &fixture.connection);
        let user_id = fixture.user.id;
        let state = DeleteExpenseState {
            db_connection: Arc::new(Mutex::new(fixture.connection)),
            media_dir: temp_media_dir("delete_expense_stranger"),
        };

        let response = delete_expense_endpoint(
            Path(expense.id),
            State(state.clone()),
            Extension(stranger.id),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(get_expense(expense.id, user_id, &state.db_connection.lock().unwrap()).is_ok());
    }
}
