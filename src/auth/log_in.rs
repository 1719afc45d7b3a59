//! The log-in page and the endpoint that checks credentials and sets the auth cookie.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Query, State},
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
    auth::{
        REMEMBER_ME_COOKIE_DURATION, get_user_by_username, invalidate_auth_cookie,
        normalize_redirect_url, set_auth_cookie,
    },
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, LINK_STYLE, base, loading_spinner, log_in_register, password_input,
        username_input,
    },
    timezone::get_local_offset,
};

pub(crate) const INVALID_CREDENTIALS_ERROR_MSG: &str = "Incorrect username or password.";
const INTERNAL_ERROR_MSG: &str = "An internal error occurred. Please try again later.";

fn log_in_form(username: &str, error_message: Option<&str>, redirect_url: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::LOG_IN_API)
            hx-indicator="#indicator"
            hx-disabled-elt="#username, #password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            @if let Some(redirect_url) = redirect_url {
                input type="hidden" name="redirect_url" value=(redirect_url);
            }

            (username_input(username, None))
            (password_input("", 0, error_message))

            div class="flex items-center gap-x-3"
            {
                input
                    type="checkbox"
                    name="remember_me"
                    id="remember_me"
                    tabindex="0"
                    class="rounded-xs";

                label
                    for="remember_me"
                    class="block text-sm font-medium text-gray-900 dark:text-white"
                {
                    "Keep me logged in for one week"
                }
            }

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator" { (loading_spinner()) }
                "Log in"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Don't have an account? "
                a href=(endpoints::REGISTER_VIEW) tabindex="0" class=(LINK_STYLE) { "Register here" }
            }
        }
    }
}

fn parse_redirect_url(raw_url: Option<&str>, source: &str) -> Option<String> {
    let redirect_url = raw_url.and_then(normalize_redirect_url);

    if let (None, Some(raw_url)) = (&redirect_url, raw_url) {
        tracing::warn!("Ignoring unsafe redirect URL from {source}: {raw_url}");
    }

    redirect_url
}

/// The query string of the log-in page.
#[derive(Deserialize)]
pub struct RedirectQuery {
    /// The page to return to after logging in.
    pub redirect_url: Option<String>,
}

/// Display the log-in page.
pub async fn get_log_in_page(Query(query): Query<RedirectQuery>) -> Response {
    let redirect_url = parse_redirect_url(query.redirect_url.as_deref(), "log-in query");
    let form = log_in_form("", None, redirect_url.as_deref());
    let content = log_in_register("Log in to your account", &form);

    base("Log In", &[], &content).into_response()
}

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Europe/Moscow".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

/// The raw data entered by the user in the log-in form.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInData {
    pub username: String,
    pub password: String,
    /// A checkbox: any value means "on", a missing field means "off".
    pub remember_me: Option<String>,
    pub redirect_url: Option<String>,
}

/// Check the submitted credentials and, if they match, set the auth cookie
/// and redirect to `redirect_url` or the home page.
///
/// Unknown usernames and wrong passwords get the same message so the form
/// does not reveal which usernames exist.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    Form(form): Form<LogInData>,
) -> Response {
    let redirect_url = parse_redirect_url(form.redirect_url.as_deref(), "log-in form");
    let redirect_url = redirect_url.as_deref();
    let render_error =
        |message: &str| log_in_form(&form.username, Some(message), redirect_url).into_response();

    let user = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return render_error(INTERNAL_ERROR_MSG);
            }
        };

        match get_user_by_username(&form.username, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => return render_error(INVALID_CREDENTIALS_ERROR_MSG),
            Err(error) => {
                tracing::error!("Unhandled error while looking up user: {error}");
                return render_error(INTERNAL_ERROR_MSG);
            }
        }
    };

    match user.password_hash.verify(&form.password) {
        Ok(true) => {}
        Ok(false) => return render_error(INVALID_CREDENTIALS_ERROR_MSG),
        Err(error) => {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            return render_error(INTERNAL_ERROR_MSG);
        }
    }

    let cookie_duration = if form.remember_me.is_some() {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };

    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        return Error::InvalidTimezoneError(state.local_timezone).into_response();
    };

    let redirect_url = redirect_url.unwrap_or(endpoints::HOME_VIEW).to_owned();

    match set_auth_cookie(jar.clone(), user.id, cookie_duration, local_offset) {
        Ok(jar) => (StatusCode::SEE_OTHER, HxRedirect(redirect_url), jar).into_response(),
        Err(error) => {
            tracing::error!("Error setting auth cookie: {error}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned()),
                invalidate_auth_cookie(jar),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod log_in_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Form, Router,
        extract::{Query, State},
        http::StatusCode,
        routing::post,
    };
    use axum_extra::extract::PrivateCookieJar;
    use axum_test::TestServer;
    use scraper::Selector;
    use time::{Duration, OffsetDateTime};

    use crate::{
        app_state::create_cookie_key,
        auth::{
            COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, PasswordHash, REMEMBER_ME_COOKIE_DURATION,
            Username, create_user,
        },
        endpoints,
        test_utils::{
            assert_form_input, assert_form_submit_button, assert_hx_endpoint, assert_hx_redirect,
            assert_valid_html, form_error_messages, get_test_connection, must_get_form,
            parse_html_document, parse_html_fragment,
        },
    };

    use super::{
        INVALID_CREDENTIALS_ERROR_MSG, LogInData, LoginState, RedirectQuery, get_log_in_page,
        post_log_in,
    };

    const PASSWORD: &str = "hamsters run all night long";

    fn get_state() -> LoginState {
        let connection = get_test_connection();
        create_user(
            Username::new_unchecked("alice"),
            PasswordHash::from_raw_password(PASSWORD, 4).unwrap(),
            &connection,
        )
        .unwrap();

        LoginState {
            cookie_key: create_cookie_key("treats"),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn form(username: &str, password: &str, redirect_url: Option<&str>) -> LogInData {
        LogInData {
            username: username.to_owned(),
            password: password.to_owned(),
            remember_me: None,
            redirect_url: redirect_url.map(str::to_owned),
        }
    }

    async fn log_in(state: LoginState, form: LogInData) -> axum::response::Response {
        let jar = PrivateCookieJar::new(state.cookie_key.clone());
        post_log_in(State(state), jar, Form(form)).await
    }

    #[tokio::test]
    async fn page_has_username_and_password_inputs() {
        let response = get_log_in_page(Query(RedirectQuery { redirect_url: None })).await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::LOG_IN_API, "hx-post");
        assert_form_input(&form, "username", "text");
        assert_form_input(&form, "password", "password");
        assert_form_submit_button(&form);
    }

    #[tokio::test]
    async fn page_keeps_safe_redirect_url_only() {
        let response = get_log_in_page(Query(RedirectQuery {
            redirect_url: Some("/pets/3".to_owned()),
        }))
        .await;
        let html = parse_html_document(response).await;
        let selector = Selector::parse("input[name=redirect_url]").unwrap();
        let input = html.select(&selector).next().unwrap();
        assert_eq!(input.value().attr("value"), Some("/pets/3"));

        let response = get_log_in_page(Query(RedirectQuery {
            redirect_url: Some("https://example.com".to_owned()),
        }))
        .await;
        let html = parse_html_document(response).await;
        assert_eq!(html.select(&selector).count(), 0);
    }

    #[tokio::test]
    async fn valid_credentials_redirect_home() {
        let response = log_in(get_state(), form("alice", PASSWORD, None)).await;

        assert_hx_redirect(&response, endpoints::HOME_VIEW);
        assert!(
            response
                .headers()
                .get_all("set-cookie")
                .iter()
                .any(|value| value.to_str().unwrap().starts_with(COOKIE_TOKEN))
        );
    }

    #[tokio::test]
    async fn valid_credentials_redirect_to_requested_page() {
        let response = log_in(get_state(), form("alice", PASSWORD, Some("/expenses?page=2"))).await;

        assert_hx_redirect(&response, "/expenses?page=2");
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_share_message() {
        for (username, password) in [("alice", "wrong password"), ("mallory", PASSWORD)] {
            let response = log_in(get_state(), form(username, password, None)).await;

            assert_eq!(response.status(), StatusCode::OK);
            let html = parse_html_fragment(response).await;
            assert_eq!(
                form_error_messages(&html),
                vec![INVALID_CREDENTIALS_ERROR_MSG.to_owned()]
            );
        }
    }

    #[tokio::test]
    async fn remember_me_sets_week_long_cookie() {
        let app = Router::new()
            .route(endpoints::LOG_IN_API, post(post_log_in))
            .with_state(get_state());
        let server = TestServer::try_new(app).unwrap();

        let response = server
            .post(endpoints::LOG_IN_API)
            .form(&[
                ("username", "alice"),
                ("password", PASSWORD),
                ("remember_me", "on"),
            ])
            .await;

        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        let expires = response.cookie(COOKIE_TOKEN).expires_datetime().unwrap();
        let want = OffsetDateTime::now_utc() + REMEMBER_ME_COOKIE_DURATION;
        assert!((expires - want).abs() < Duration::seconds(2));
    }

    #[tokio::test]
    async fn missing_fields_are_rejected() {
        let app = Router::new()
            .route(endpoints::LOG_IN_API, post(post_log_in))
            .with_state(get_state());
        let server = TestServer::try_new(app).unwrap();

        server
            .post(endpoints::LOG_IN_API)
            .form(&[("password", PASSWORD)])
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }
}
