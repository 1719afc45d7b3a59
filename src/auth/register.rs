//! The registration page and the endpoint that creates accounts.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    auth::{PasswordHash, Username, ValidatedPassword, create_user, set_auth_cookie},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        base,
        loading_spinner, log_in_register, password_input, username_input,
    },
    internal_server_error::get_internal_server_error_redirect,
    timezone::get_local_offset,
};

/// Client-side minimum length. The server checks strength with zxcvbn on top of this.
const PASSWORD_INPUT_MIN_LENGTH: u8 = 14;

#[derive(Default)]
struct RegistrationErrors {
    username: Option<String>,
    password: Option<String>,
    confirm_password: Option<String>,
}

fn confirm_password_input(error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label for="confirm-password" class=(FORM_LABEL_STYLE) { "Confirm Password" }

            input
                type="password"
                name="confirm_password"
                id="confirm-password"
                placeholder="••••••••"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                minlength=(PASSWORD_INPUT_MIN_LENGTH);

            @if let Some(error_message) = error_message
            {
                p class=(FORM_ERROR_STYLE) { (error_message) }
            }
        }
    }
}

fn registration_form(username: &str, errors: RegistrationErrors) -> Markup {
    html! {
        form
            hx-post=(endpoints::USERS)
            hx-indicator="#indicator"
            hx-disabled-elt="#username, #password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            (username_input(username, errors.username.as_deref()))
            (password_input("", PASSWORD_INPUT_MIN_LENGTH, errors.password.as_deref()))
            (confirm_password_input(errors.confirm_password.as_deref()))

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator" { (loading_spinner()) }
                "Create Account"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "
                a href=(endpoints::LOG_IN_VIEW) tabindex="0" class=(LINK_STYLE) { "Log in here" }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let form = registration_form("", RegistrationErrors::default());
    let content = log_in_register("Create an account", &form);

    base("Register", &[], &content).into_response()
}

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Europe/Moscow".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

/// The raw data entered in the registration form.
#[derive(Serialize, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

/// Create an account, log the new user in and redirect to the home page.
///
/// Problems with the input are shown next to the offending field.
pub async fn register_user(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    Form(form): Form<RegisterForm>,
) -> Response {
    let render_error = |errors: RegistrationErrors| {
        registration_form(&form.username, errors).into_response()
    };

    let username = match Username::new(&form.username) {
        Ok(username) => username,
        Err(error) => {
            return render_error(RegistrationErrors {
                username: Some(error.to_string()),
                ..Default::default()
            });
        }
    };

    let password = match ValidatedPassword::new(&form.password) {
        Ok(password) => password,
        Err(error) => {
            return render_error(RegistrationErrors {
                password: Some(error.to_string()),
                ..Default::default()
            });
        }
    };

    if form.password != form.confirm_password {
        return render_error(RegistrationErrors {
            confirm_password: Some("Passwords do not match".to_owned()),
            ..Default::default()
        });
    }

    let password_hash = match PasswordHash::new(password, PasswordHash::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(error) => {
            tracing::error!("an error occurred while hashing a password: {error}");
            return get_internal_server_error_redirect();
        }
    };

    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        return Error::InvalidTimezoneError(state.local_timezone).into_response();
    };

    let user = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return get_internal_server_error_redirect();
            }
        };

        match create_user(username, password_hash, &connection) {
            Ok(user) => user,
            Err(Error::DuplicateUsername) => {
                return render_error(RegistrationErrors {
                    username: Some(Error::DuplicateUsername.to_string()),
                    ..Default::default()
                });
            }
            Err(error) => {
                tracing::error!("An unhandled error occurred while inserting a new user: {error}");
                return get_internal_server_error_redirect();
            }
        }
    };

    tracing::info!("Registered user {} ({})", user.username, user.id);

    match set_auth_cookie(jar, user.id, state.cookie_duration, local_offset) {
        Ok(jar) => (
            StatusCode::SEE_OTHER,
            HxRedirect(endpoints::HOME_VIEW.to_owned()),
            jar,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("An error occurred while setting the auth cookie: {error}");
            get_internal_server_error_redirect()
        }
    }
}

#[cfg(test)]
mod register_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Form, extract::State, http::StatusCode, response::Response};
    use axum_extra::extract::PrivateCookieJar;

    use crate::{
        app_state::create_cookie_key,
        auth::{DEFAULT_COOKIE_DURATION, count_users, get_user_by_username},
        endpoints,
        test_utils::{
            assert_form_input, assert_hx_endpoint, assert_hx_redirect, assert_valid_html,
            form_error_messages, get_test_connection, must_get_form, parse_html_document,
            parse_html_fragment,
        },
    };

    use super::{RegisterForm, RegistrationState, get_register_page, register_user};

    const PASSWORD: &str = "budgies chatter before sunrise";

    fn get_state() -> RegistrationState {
        RegistrationState {
            cookie_key: create_cookie_key("squeaky toy"),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(get_test_connection())),
        }
    }

    async fn register(
        state: RegistrationState,
        username: &str,
        password: &str,
        confirm_password: &str,
    ) -> Response {
        let jar = PrivateCookieJar::new(state.cookie_key.clone());
        register_user(
            State(state),
            jar,
            Form(RegisterForm {
                username: username.to_owned(),
                password: password.to_owned(),
                confirm_password: confirm_password.to_owned(),
            }),
        )
        .await
    }

    async fn error_messages(response: Response) -> Vec<String> {
        form_error_messages(&parse_html_fragment(response).await)
    }

    #[tokio::test]
    async fn page_has_registration_form() {
        let response = get_register_page().await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::USERS, "hx-post");
        assert_form_input(&form, "username", "text");
        assert_form_input(&form, "password", "password");
        assert_form_input(&form, "confirm_password", "password");
    }

    #[tokio::test]
    async fn creates_user_and_redirects_home() {
        let state = get_state();

        let response = register(state.clone(), " alice ", PASSWORD, PASSWORD).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::HOME_VIEW);
        let connection = state.db_connection.lock().unwrap();
        assert!(get_user_by_username("alice", &connection).is_ok());
    }

    #[tokio::test]
    async fn duplicate_username_is_a_form_error() {
        let state = get_state();
        register(state.clone(), "alice", PASSWORD, PASSWORD).await;

        let response = register(state.clone(), "alice", PASSWORD, PASSWORD).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            error_messages(response).await,
            vec!["the username is already taken"]
        );
        assert_eq!(count_users(&state.db_connection.lock().unwrap()), Ok(1));
    }

    #[tokio::test]
    async fn weak_password_is_a_form_error() {
        let response = register(get_state(), "alice", "password", "password").await;

        assert_eq!(response.status(), StatusCode::OK);
        let messages = error_messages(response).await;
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("password is too weak"));
    }

    #[tokio::test]
    async fn mismatched_passwords_are_a_form_error() {
        let response = register(get_state(), "alice", PASSWORD, "something else").await;

        assert_eq!(
            error_messages(response).await,
            vec!["Passwords do not match"]
        );
    }

    #[tokio::test]
    async fn invalid_username_is_a_form_error() {
        let state = get_state();

        let response = register(state.clone(), "alice smith", PASSWORD, PASSWORD).await;

        assert_eq!(error_messages(response).await.len(), 1);
        assert_eq!(count_users(&state.db_connection.lock().unwrap()), Ok(0));
    }
}
