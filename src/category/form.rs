//! The form shared by the create and edit category pages.

use maud::{Markup, html};

use crate::{
    category::CategoryFormData,
    html::{BUTTON_PRIMARY_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE},
};

/// How the form is submitted.
pub(crate) enum CategoryFormAction<'a> {
    Create { endpoint: &'a str },
    Update { endpoint: &'a str },
}

pub(crate) fn category_form_view(
    action: CategoryFormAction<'_>,
    form: &CategoryFormData,
    error_message: &str,
) -> Markup {
    let (hx_post, hx_put, submit_text) = match action {
        CategoryFormAction::Create { endpoint } => (Some(endpoint), None, "Create Category"),
        CategoryFormAction::Update { endpoint } => (None, Some(endpoint), "Save Category"),
    };
    let color = if form.color.is_empty() {
        "#6b7280"
    } else {
        &form.color
    };

    html! {
        form
            hx-post=[hx_post]
            hx-put=[hx_put]
            hx-target-error="#alert-container"
            hx-swap="outerHTML"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="name" class=(FORM_LABEL_STYLE) { "Category Name" }

                input
                    id="name"
                    type="text"
                    name="name"
                    placeholder="Category Name"
                    value=(form.name)
                    maxlength="100"
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description" }

                textarea
                    id="description"
                    name="description"
                    rows="2"
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    (form.description)
                }
            }

            div
            {
                label for="color" class=(FORM_LABEL_STYLE) { "Color" }

                input
                    id="color"
                    type="color"
                    name="color"
                    value=(color)
                    class="h-10 w-20 rounded border border-gray-300 dark:border-gray-600";
            }

            @if !error_message.is_empty() {
                p class=(FORM_ERROR_STYLE) { (error_message) }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_text) }
        }
    }
}
