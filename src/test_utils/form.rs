use scraper::{ElementRef, Html, Selector};

use crate::html::FORM_ERROR_STYLE;

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|error| panic!("bad selector {css:?}: {error}"))
}

/// The input called `name` in `form`, checked to be of type `type_` and required.
#[track_caller]
fn required_input<'a>(form: &ElementRef<'a>, name: &str, type_: &str) -> ElementRef<'a> {
    let input = form
        .select(&selector(&format!("input[name=\"{name}\"]")))
        .next()
        .unwrap_or_else(|| panic!("No input found with name \"{name}\""));

    let got_type = input.value().attr("type").unwrap_or_default();
    assert_eq!(
        got_type, type_,
        "input {name} should have type \"{type_}\", got {got_type:?}"
    );
    assert!(
        input.value().attr("required").is_some(),
        "input {name} should be required"
    );

    input
}

#[track_caller]
pub(crate) fn must_get_form(html: &Html) -> ElementRef<'_> {
    html.select(&selector("form"))
        .next()
        .expect("No form found")
}

/// Check that `form` sends its data to `endpoint` via the HTMX `attribute`, e.g. "hx-post".
#[track_caller]
pub(crate) fn assert_hx_endpoint(form: &ElementRef<'_>, endpoint: &str, attribute: &str) {
    let got = form.value().attr(attribute);

    assert_eq!(
        got,
        Some(endpoint),
        "form should have {attribute}=\"{endpoint}\""
    );
}

#[track_caller]
pub(crate) fn assert_form_input(form: &ElementRef<'_>, name: &str, type_: &str) {
    required_input(form, name, type_);
}

#[track_caller]
pub(crate) fn assert_form_input_with_value(
    form: &ElementRef<'_>,
    name: &str,
    type_: &str,
    value: &str,
) {
    let input = required_input(form, name, type_);
    let got_value = input.value().attr("value").unwrap_or_default();

    assert_eq!(
        got_value, value,
        "input {name} should have value \"{value}\", got {got_value:?}"
    );
}

#[track_caller]
pub(crate) fn assert_form_submit_button(form: &ElementRef<'_>) {
    let has_submit_button = form
        .select(&selector("button"))
        .any(|button| button.value().attr("type") == Some("submit"));

    assert!(has_submit_button, "form should have a submit button");
}

/// Check the text of the first paragraph in `form`, where validation errors are shown.
#[track_caller]
pub(crate) fn assert_form_error_message(form: &ElementRef<'_>, want_error_message: &str) {
    let paragraph = form
        .select(&selector("p"))
        .next()
        .expect("No error message found");
    let got_error_message = paragraph.text().collect::<String>();

    assert_eq!(want_error_message, got_error_message.trim());
}

/// The text of every validation message in `html`, in document order.
pub(crate) fn form_error_messages(html: &Html) -> Vec<String> {
    html.select(&selector("p"))
        .filter(|paragraph| paragraph.value().attr("class") == Some(FORM_ERROR_STYLE))
        .map(|paragraph| paragraph.text().collect::<String>().trim().to_owned())
        .collect()
}
