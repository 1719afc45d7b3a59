//! The expense form shared by the create and edit pages, and parsing of its
//! multipart submissions.

use axum::extract::{Multipart, multipart::Field};
use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    Error,
    auth::UserID,
    category::{ExpenseCategory, get_all_categories},
    currency::{BASE_CURRENCY, Currency},
    expense::{ExpenseFormData, MAX_DESCRIPTION_LENGTH, ReceiptUpload},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE,
    },
    pet::{Pet, get_pets},
};

const RECEIPT_ACCEPT: &str = "image/jpeg,image/png,image/gif,image/webp";

/// How the form is submitted.
pub(crate) enum ExpenseFormAction<'a> {
    Create { endpoint: &'a str },
    Update { endpoint: &'a str },
}

/// The choices offered by the select elements of the expense form.
pub(crate) struct ExpenseFormOptions<'a> {
    pub pets: &'a [Pet],
    pub categories: &'a [ExpenseCategory],
    /// The latest date that can be picked, i.e. today.
    pub max_date: Date,
    /// Where the current receipt can be viewed, if the expense has one.
    pub receipt_url: Option<&'a str>,
}

/// Load the pets and categories an expense of `user_id` can be assigned to.
pub(crate) fn get_form_choices(
    user_id: UserID,
    connection: &Connection,
) -> Result<(Vec<Pet>, Vec<ExpenseCategory>), Error> {
    Ok((
        get_pets(user_id, connection)?,
        get_all_categories(connection)?,
    ))
}

pub(crate) fn expense_form_view(
    action: ExpenseFormAction<'_>,
    form: &ExpenseFormData,
    options: &ExpenseFormOptions<'_>,
    error_message: &str,
) -> Markup {
    let (hx_post, hx_put, submit_text) = match action {
        ExpenseFormAction::Create { endpoint } => (Some(endpoint), None, "Add Expense"),
        ExpenseFormAction::Update { endpoint } => (None, Some(endpoint), "Save Expense"),
    };
    let currency = if form.currency.is_empty() {
        BASE_CURRENCY.code()
    } else {
        form.currency.as_str()
    };

    html! {
        form
            hx-post=[hx_post]
            hx-put=[hx_put]
            hx-encoding="multipart/form-data"
            enctype="multipart/form-data"
            hx-target-error="#alert-container"
            hx-swap="outerHTML"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="pet_id" class=(FORM_LABEL_STYLE) { "Pet" }

                select id="pet_id" name="pet_id" required class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for pet in options.pets {
                        @let value = pet.id.to_string();
                        option value=(value) selected[form.pet_id == value] { (pet.name.as_ref()) }
                    }
                }
            }

            div
            {
                label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }

                select id="category_id" name="category_id" required class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for category in options.categories {
                        @let value = category.id.to_string();
                        option value=(value) selected[form.category_id == value]
                        {
                            (category.name.as_ref())
                        }
                    }
                }
            }

            div class="grid grid-cols-3 gap-4"
            {
                div class="col-span-2"
                {
                    label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                    input
                        id="amount"
                        type="number"
                        name="amount"
                        step="0.01"
                        min="0.01"
                        placeholder="0.00"
                        value=(form.amount)
                        required
                        autofocus
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="currency" class=(FORM_LABEL_STYLE) { "Currency" }

                    select id="currency" name="currency" required class=(FORM_TEXT_INPUT_STYLE)
                    {
                        @for option in Currency::ALL {
                            option
                                value=(option.code())
                                selected[currency.eq_ignore_ascii_case(option.code())]
                            {
                                (option.code())
                            }
                        }
                    }
                }
            }

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                input
                    id="date"
                    type="date"
                    name="date"
                    value=(form.date)
                    max=(options.max_date.to_string())
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description (optional)" }

                textarea
                    id="description"
                    name="description"
                    rows="3"
                    maxlength=(MAX_DESCRIPTION_LENGTH)
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    (form.description)
                }
            }

            div
            {
                label for="receipt" class=(FORM_LABEL_STYLE) { "Receipt (optional)" }

                input
                    id="receipt"
                    type="file"
                    name="receipt"
                    accept=(RECEIPT_ACCEPT)
                    class=(FORM_TEXT_INPUT_STYLE);

                @if let Some(receipt_url) = options.receipt_url {
                    div class="flex items-center justify-between mt-2 text-sm"
                    {
                        a href=(receipt_url) target="_blank" class=(LINK_STYLE) { "View current receipt" }

                        label class="flex items-center gap-2"
                        {
                            input
                                type="checkbox"
                                name="remove_receipt"
                                value="true"
                                checked[form.remove_receipt];
                            "Remove receipt"
                        }
                    }
                }
            }

            @if !error_message.is_empty() {
                p class=(FORM_ERROR_STYLE) { (error_message) }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_text) }
        }
    }
}

/// Read the text fields and the optional receipt of a submitted expense form.
///
/// An empty `receipt` field, which browsers send when no file was chosen,
/// is treated as no receipt.
///
/// # Errors
///
/// Returns [Error::MultipartError] if the body is not valid multipart data.
pub(crate) async fn parse_expense_multipart(
    mut multipart: Multipart,
) -> Result<(ExpenseFormData, Option<ReceiptUpload>), Error> {
    let mut form = ExpenseFormData::default();
    let mut receipt = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| Error::MultipartError(error.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_owned();

        match name.as_str() {
            "receipt" => receipt = read_receipt_field(field).await?,
            "remove_receipt" => {
                form.remove_receipt = true;
            }
            _ => {
                let value = field
                    .text()
                    .await
                    .map_err(|error| Error::MultipartError(error.to_string()))?;

                match name.as_str() {
                    "pet_id" => form.pet_id = value,
                    "category_id" => form.category_id = value,
                    "amount" => form.amount = value,
                    "currency" => form.currency = value,
                    "date" => form.date = value,
                    "description" => form.description = value,
                    other => tracing::debug!("Ignoring unexpected expense form field {other:?}"),
                }
            }
        }
    }

    Ok((form, receipt))
}

async fn read_receipt_field(field: Field<'_>) -> Result<Option<ReceiptUpload>, Error> {
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_owned();
    let file_name = field.file_name().unwrap_or_default().to_owned();
    let bytes = field
        .bytes()
        .await
        .map_err(|error| Error::MultipartError(error.to_string()))?;

    if bytes.is_empty() {
        return Ok(None);
    }

    tracing::debug!(
        "Received receipt '{file_name}' ({content_type}) that is {} bytes",
        bytes.len()
    );

    Ok(Some(ReceiptUpload {
        content_type,
        bytes,
    }))
}
