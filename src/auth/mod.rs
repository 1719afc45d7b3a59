//! Accounts, log-in sessions and the middleware that guards the app's pages.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod redirect;
mod register;
mod token;
mod user;

pub use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub(crate) use cookie::REMEMBER_ME_COOKIE_DURATION;
pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{AuthState, auth_guard, auth_guard_hx};
pub use password::{PasswordHash, ValidatedPassword};
pub use redirect::normalize_redirect_url;
pub use register::{get_register_page, register_user};
pub use user::{
    User, UserID, Username, count_users, create_user, create_user_table, get_user_by_id,
    get_user_by_username, update_password,
};

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;
