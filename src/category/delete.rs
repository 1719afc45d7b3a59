//! Category deletion endpoint.

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
    category::{CategoryId, delete_category},
    expense::{
        count_other_users_expenses_in_category, get_receipts_for_category, remove_unused_receipts,
    },
};

/// The state needed for deleting a category.
#[derive(Debug, Clone)]
pub struct DeleteCategoryState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The directory receipt images are stored in.
    pub media_dir: PathBuf,
}

impl FromRef<AppState> for DeleteCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            media_dir: state.media_dir.clone(),
        }
    }
}

/// Delete a category along with the user's expenses in it.
///
/// Categories are shared, so the deletion is refused while other users have
/// expenses in the category.
pub async fn delete_category_endpoint(
    Path(category_id): Path<CategoryId>,
    State(state): State<DeleteCategoryState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match count_other_users_expenses_in_category(category_id, user_id, &connection) {
        Ok(0) => {}
        Ok(count) => {
            tracing::warn!(
                "User {user_id} tried to delete category {category_id}, \
                which has {count} expenses of other users"
            );
            return Error::CategoryInUse.into_alert_response();
        }
        Err(error) => {
            tracing::error!("Could not check who uses category {category_id}: {error}");
            return error.into_alert_response();
        }
    }

    let receipts = match get_receipts_for_category(category_id, user_id, &connection) {
        Ok(receipts) => receipts,
        Err(error) => {
            tracing::error!("Could not get the receipts in category {category_id}: {error}");
            return error.into_alert_response();
        }
    };

    match delete_category(category_id, &connection) {
        Ok(_) => {
            tracing::info!("User {user_id} deleted category {category_id}");
            remove_unused_receipts(&receipts, &state.media_dir, &connection);

            Alert::SuccessSimple {
                message: "Category deleted successfully".to_owned(),
            }
            .into_response()
        }
        Err(Error::DeleteMissingCategory) => Error::DeleteMissingCategory.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting category {category_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod delete_category_tests {
    use std::{
        path::PathBuf,
        sync::{Arc, Mutex},
    };

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use time::macros::date;

    use crate::{
        Error,
        category::get_category,
        currency::{Amount, Currency},
        expense::{NewExpense, create_expense, get_expense},
        pet::{NewPet, PetName, Species, create_pet},
        test_utils::{
            TestFixture, assert_valid_html, create_test_user, parse_html_fragment, temp_media_dir,
        },
    };

    use super::{DeleteCategoryState, delete_category_endpoint};

    fn get_state(fixture: TestFixture, media_dir: PathBuf) -> DeleteCategoryState {
        DeleteCategoryState {
            db_connection: Arc::new(Mutex::new(fixture.connection)),
            media_dir,
        }
    }

    #[tokio::test]
    async fn deleting_category_deletes_its_expenses_and_receipts() {
        let fixture = TestFixture::new();
        let expense = create_expense(
            fixture.user.id,
            NewExpense {
                receipt: Some("abc.png".to_owned()),
                ..fixture.new_expense("12.50", "USD")
            },
            1000,
            &fixture.connection,
        )
        .unwrap();
        let media_dir = temp_media_dir("delete_category");
        std::fs::write(media_dir.join("abc.png"), b"png").unwrap();
        let (category_id, user_id) = (fixture.category.id, fixture.user.id);
        let state = get_state(fixture, media_dir.clone());

        let response =
            delete_category_endpoint(Path(category_id), State(state.clone()), Extension(user_id))
                .await;

        assert_eq!(response.status(), StatusCode::OK);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_category(category_id, &connection), Err(Error::NotFound));
        assert_eq!(
            get_expense(expense.id, user_id, &connection),
            Err(Error::NotFound)
        );
        assert!(!media_dir.join("abc.png").exists());
    }

    #[tokio::test]
    async fn cannot_delete_category_with_other_users_expenses() {
        let fixture = TestFixture::new();
        let expense = fixture.create_expense("12.50", "USD");
        let stranger = create_test_user("mallory", &fixture.connection);
        let stranger_pet = create_pet(
            stranger.id,
            NewPet {
                name: PetName::new_unchecked("Whiskers"),
                species: Species::Cat,
                breed: String::new(),
                birth_date: None,
            },
            50,
            &fixture.connection,
        )
        .unwrap();
        let stranger_expense = create_expense(
            stranger.id,
            NewExpense {
                pet_id: stranger_pet.id,
                category_id: fixture.category.id,
                amount: Amount::new_unchecked("3.00".parse().unwrap()),
                currency: Currency::Rub,
                date: date!(2025 - 01 - 20),
                description: String::new(),
                receipt: None,
            },
            1000,
            &fixture.connection,
        )
        .unwrap();
        let (category_id, user_id) = (fixture.category.id, fixture.user.id);
        let state = get_state(fixture, temp_media_dir("delete_shared_category"));

        let response = delete_category_endpoint(
            Path(category_id),
            State(state.clone()),
            Extension(stranger.id),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let connection = state.db_connection.lock().unwrap();
        assert!(get_category(category_id, &connection).is_ok());
        assert!(get_expense(expense.id, user_id, &connection).is_ok());
        assert!(get_expense(stranger_expense.id, stranger.id, &connection).is_ok());
    }

    #[tokio::test]
    async fn delete_missing_category_returns_404_alert() {
        let fixture = TestFixture::new();
        let (category_id, user_id) = (fixture.category.id, fixture.user.id);
        let state = get_state(fixture, temp_media_dir("delete_missing_category"));

        let response =
            delete_category_endpoint(Path(category_id + 1), State(state), Extension(user_id))
                .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
    }
}
