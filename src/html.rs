//! Shared page layout, style constants and small markup helpers.
use maud::{DOCTYPE, Markup, PreEscaped, html};

pub const LINK_STYLE: &str = "text-amber-700 hover:text-amber-600 \
    dark:text-amber-400 dark:hover:text-amber-300 underline";

pub const BUTTON_PRIMARY_STYLE: &str = "w-full px-4 py-2 rounded text-white \
    bg-amber-600 dark:bg-amber-700 hover:enabled:bg-amber-700 \
    hover:enabled:dark:bg-amber-800 disabled:bg-amber-800";

pub const BUTTON_SECONDARY_STYLE: &str = "py-2 px-4 text-sm font-medium rounded \
    text-gray-900 bg-white border border-gray-200 hover:bg-gray-100 \
    hover:text-amber-700 dark:bg-gray-800 dark:text-gray-300 \
    dark:border-gray-600 dark:hover:bg-gray-700 dark:hover:text-white";

pub const BUTTON_DELETE_STYLE: &str = "text-red-600 hover:text-red-500 \
    dark:text-red-500 dark:hover:text-red-400 underline bg-transparent \
    border-none cursor-pointer";

pub const FORM_CONTAINER_STYLE: &str = "flex flex-col items-center px-6 py-8 \
    mx-auto lg:py-0 max-w-md text-gray-900 dark:text-white";
pub const FORM_LABEL_STYLE: &str = "block mb-2 text-sm font-medium text-gray-900 dark:text-white";
pub const FORM_TEXT_INPUT_STYLE: &str = "block w-full p-2.5 rounded text-sm \
    text-gray-900 dark:text-white bg-gray-50 dark:bg-gray-700 \
    border border-gray-300 dark:border-gray-600 dark:placeholder-gray-400 \
    focus:ring-amber-500 focus:border-amber-500";
pub const FORM_ERROR_STYLE: &str = "text-red-600 dark:text-red-400";

pub const TABLE_HEADER_STYLE: &str = "text-xs uppercase text-gray-700 \
    bg-amber-50 dark:bg-gray-700 dark:text-gray-400";
pub const TABLE_ROW_STYLE: &str = "bg-white border-b dark:bg-gray-800 dark:border-gray-700";
pub const TABLE_CELL_STYLE: &str = "px-6 py-4";

/// The category badge's background color is set inline from the category.
const CATEGORY_BADGE_STYLE: &str = "inline-flex items-center px-2.5 py-0.5 \
    text-xs font-semibold text-white rounded-full";

pub const PAGE_CONTAINER_STYLE: &str =
    "flex flex-col items-center px-6 py-8 mx-auto lg:py-5 text-gray-900 dark:text-white";

pub const CARD_STYLE: &str = "rounded-lg p-4 shadow bg-white dark:bg-gray-800 \
    border border-gray-200 dark:border-gray-700";

/// Extra scripts for the `<head>` of a page.
pub enum HeadElement {
    /// The file path or URL to a JavaScript script.
    ScriptLink(String),
    /// JavaScript source code.
    ScriptSource(PreEscaped<String>),
}

/// The page skeleton shared by every full page: head, scripts, body and the alert container.
pub fn base(title: &str, head_elements: &[HeadElement], content: &Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " - Pet Cost Tracker" }
                link rel="icon" type="image/png" href="/static/favicon-32x32.png" sizes="32x32";
                link rel="stylesheet" href="/static/main.css";

                script src="/static/htmx-2.0.8-min.js" integrity="sha384-/TgkGk7p307TH7EXJDuUlgG3Ce1UVolAOFopFekQkkXihi5u/6OCvVKyz1W+idaz" {}
                script src="/static/htmx-ext-response-targets-2.0.4.js" integrity="sha384-T41oglUPvXLGBVyRdZsVRxNWnOOqCynaPubjUVjxhsjFTKrFJGEMm3/0KGmNQ+Pg" {}

                // The spinner is only shown while its form's request is in flight.
                style {
                    (PreEscaped("#indicator.htmx-indicator { display: none; } \
                    #indicator.htmx-request.htmx-indicator, \
                    #indicator.htmx-request .htmx-indicator { display: inline; }"))
                }

                @for element in head_elements {
                    @match element {
                        HeadElement::ScriptLink(path) => script src=(path) {}
                        HeadElement::ScriptSource(source) => script { (source) }
                    }
                }

                script src="/static/app.js" defer {}
            }

            body
                hx-ext="response-targets"
                class="container max-w-full min-h-screen bg-stone-50 dark:bg-gray-900 pb-24 lg:pb-0"
            {
                (content)

                div
                    id="alert-container"
                    class="hidden fixed bottom-4 left-1/2 -translate-x-1/2 z-50 w-full max-w-md px-4"
                {}
            }
        }
    }
}

/// A full page for an HTTP error, e.g. "404" with a description and a hint for the user.
pub fn error_view(title: &str, header: &str, description: &str, fix: &str) -> Markup {
    let content = html!(
        section class="py-16 px-4 mx-auto max-w-screen-sm text-center" {
            h1 class="mb-4 text-7xl lg:text-9xl font-extrabold text-amber-600 dark:text-amber-500" {
                (header)
            }

            p class="mb-4 text-3xl md:text-4xl font-bold text-gray-900 dark:text-white" {
                (description)
            }

            p class="mb-8 text-xl text-gray-700 dark:text-gray-300" { (fix) }

            a
                href="/"
                class="inline-flex px-5 py-2.5 rounded text-sm font-medium text-white
                    bg-amber-600 hover:bg-amber-700"
            {
                "Back to Homepage"
            }
        }
    );

    base(title, &[], &content)
}

/// Wraps the log-in and registration forms in a centered card with the app name.
pub fn log_in_register(form_title: &str, form: &Markup) -> Markup {
    html! {
        div class="flex flex-col items-center justify-center px-6 py-8 mx-auto" {
            p class="mb-6 text-2xl font-semibold text-gray-900 dark:text-white" {
                "Pet Cost Tracker"
            }

            div class=(format!("{CARD_STYLE} w-full sm:max-w-md sm:p-8 space-y-6")) {
                h1 class="text-xl md:text-2xl font-bold text-gray-900 dark:text-white" {
                    (form_title)
                }

                (form)
            }
        }
    }
}

fn input_error(error_message: Option<&str>) -> Markup {
    html! {
        @if let Some(error_message) = error_message {
            p class=(FORM_ERROR_STYLE) { (error_message) }
        }
    }
}

/// The username field of the log-in and registration forms.
pub fn username_input(username: &str, error_message: Option<&str>) -> Markup {
    html! {
        div {
            label for="username" class=(FORM_LABEL_STYLE) { "Username" }

            input
                type="text"
                name="username"
                id="username"
                placeholder="alice"
                autocomplete="username"
                maxlength="150"
                value=(username)
                class=(FORM_TEXT_INPUT_STYLE)
                required
                autofocus;

            (input_error(error_message))
        }
    }
}

/// The password field of the log-in and registration forms.
pub fn password_input(password: &str, min_length: u8, error_message: Option<&str>) -> Markup {
    html! {
        div {
            label for="password" class=(FORM_LABEL_STYLE) { "Password" }

            input
                type="password"
                name="password"
                id="password"
                placeholder="••••••••"
                minlength=(min_length)
                value=(password)
                class=(FORM_TEXT_INPUT_STYLE)
                required;

            (input_error(error_message))
        }
    }
}

/// A small spinning ring shown on submit buttons while a request is pending.
pub fn loading_spinner() -> Markup {
    html! {
        svg
            aria-hidden="true"
            role="status"
            class="inline w-4 h-4 me-2 mb-1 animate-spin text-white"
            viewBox="0 0 24 24"
            fill="none"
            xmlns="http://www.w3.org/2000/svg"
        {
            circle cx="12" cy="12" r="10" stroke="#E5E7EB" stroke-width="4" {}
            path d="M22 12a10 10 0 0 0-10-10" stroke="currentColor" stroke-width="4" stroke-linecap="round" {}
        }
    }
}

/// An inline link, e.g. inside a `<p>`.
pub fn link(url: &str, text: &str) -> Markup {
    html! (
        a href=(url) class=(LINK_STYLE) { (text) }
    )
}

/// The header row of a list page: the page title and a link to the create page.
pub fn page_header(title: &str, create_url: &str, create_text: &str) -> Markup {
    html! {
        div class="flex justify-between flex-wrap items-end w-full mb-4 gap-2"
        {
            h1 class="text-xl font-bold" { (title) }

            a href=(create_url) class=(LINK_STYLE) { (create_text) }
        }
    }
}

/// A rounded badge filled with a category's display color.
pub fn category_badge(name: &str, color: &str) -> Markup {
    html! {
        span class=(CATEGORY_BADGE_STYLE) style=(format!("background-color: {color}")) { (name) }
    }
}

/// The "Edit" link and "Delete" button shown on each row of a list page.
///
/// The delete button asks for confirmation, sends a DELETE request to
/// `delete_url` and swaps `hx_target` with `hx_swap` on success. Errors are
/// shown in the alert container.
pub fn edit_delete_action_links(
    edit_url: &str,
    delete_url: &str,
    confirm_message: &str,
    hx_target: &str,
    hx_swap: &str,
) -> Markup {
    html! {
        div class="flex gap-4"
        {
            a href=(edit_url) class=(LINK_STYLE) { "Edit" }

            button
                type="button"
                hx-delete=(delete_url)
                hx-confirm=(confirm_message)
                hx-target=(hx_target)
                hx-target-error="#alert-container"
                hx-swap=(hx_swap)
                class=(BUTTON_DELETE_STYLE)
            {
                "Delete"
            }
        }
    }
}

/// The view shown in place of tables and charts when there is nothing to show.
pub fn nothing_here_yet(url: &str, text: &str) -> Markup {
    html! {
        div class="flex flex-col items-center gap-2 py-8"
        {
            h2 class="text-xl font-bold" { "Nothing here yet..." }
            p { (link(url, text)) }
        }
    }
}
