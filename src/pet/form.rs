//! The form shared by the create and edit pet pages.

use maud::{Markup, html};
use time::Date;

use crate::{
    html::{BUTTON_PRIMARY_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE},
    pet::{MAX_BREED_LENGTH, PetFormData, PetName, Species},
};

/// How the form is submitted.
pub(crate) enum PetFormAction<'a> {
    Create { endpoint: &'a str },
    Update { endpoint: &'a str },
}

pub(crate) fn pet_form_view(
    action: PetFormAction<'_>,
    form: &PetFormData,
    max_date: Date,
    error_message: &str,
) -> Markup {
    let (hx_post, hx_put, submit_text) = match action {
        PetFormAction::Create { endpoint } => (Some(endpoint), None, "Add Pet"),
        PetFormAction::Update { endpoint } => (None, Some(endpoint), "Save Pet"),
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
                label for="name" class=(FORM_LABEL_STYLE) { "Name" }

                input
                    id="name"
                    type="text"
                    name="name"
                    placeholder="Name"
                    value=(form.name)
                    maxlength=(PetName::MAX_LENGTH)
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="species" class=(FORM_LABEL_STYLE) { "Species" }

                select id="species" name="species" required class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for species in Species::ALL {
                        option
                            value=(species.as_str())
                            selected[form.species.eq_ignore_ascii_case(species.as_str())]
                        {
                            (species.label())
                        }
                    }
                }
            }

            div
            {
                label for="breed" class=(FORM_LABEL_STYLE) { "Breed (optional)" }

                input
                    id="breed"
                    type="text"
                    name="breed"
                    placeholder="Breed"
                    value=(form.breed)
                    maxlength=(MAX_BREED_LENGTH)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="birth_date" class=(FORM_LABEL_STYLE) { "Birth Date (optional)" }

                input
                    id="birth_date"
                    type="date"
                    name="birth_date"
                    value=(form.birth_date)
                    max=(max_date.to_string())
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            @if !error_message.is_empty() {
                p class=(FORM_ERROR_STYLE) { (error_message) }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_text) }
        }
    }
}
