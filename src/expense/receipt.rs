//! Receipt images attached to expenses.
//!
//! Receipts are stored in the media directory under the SHA-256 hash of their
//! contents, so uploading the same image twice stores a single file that may
//! be shared by several expenses. A file is only removed once no expense
//! refers to it.

use std::{
    path::{Path as FilePath, PathBuf},
    sync::{Arc, Mutex},
};

use axum::{
    Extension,
    body::Bytes,
    extract::{FromRef, Path, State},
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use sha2::{Digest, Sha256};

use crate::{
    AppState, Error,
    auth::UserID,
    expense::{ExpenseId, db::is_receipt_in_use, get_expense},
};

/// The largest receipt image that will be stored.
pub const MAX_RECEIPT_SIZE: usize = 5 * 1024 * 1024;

const RECEIPT_TYPES: [(&str, &str); 4] = [
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
];

/// An image file sent in the `receipt` field of the expense form.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptUpload {
    pub content_type: String,
    pub bytes: Bytes,
}

impl ReceiptUpload {
    /// Check the content type and size of the upload and return the file
    /// extension to store it under.
    ///
    /// # Errors
    ///
    /// Returns [Error::UnsupportedReceiptType] for anything other than JPEG,
    /// PNG, GIF or WebP images and [Error::ReceiptTooLarge] for files over
    /// [MAX_RECEIPT_SIZE].
    pub fn validate(&self) -> Result<&'static str, Error> {
        let extension = RECEIPT_TYPES
            .iter()
            .find(|(content_type, _)| self.content_type.eq_ignore_ascii_case(content_type))
            .map(|(_, extension)| *extension)
            .ok_or_else(|| Error::UnsupportedReceiptType(self.content_type.clone()))?;

        if self.bytes.len() > MAX_RECEIPT_SIZE {
            return Err(Error::ReceiptTooLarge);
        }

        Ok(extension)
    }

    /// The name the receipt is stored under: the hex SHA-256 digest of the
    /// contents followed by the extension.
    fn file_name(&self, extension: &str) -> String {
        format!("{:x}.{extension}", Sha256::digest(&self.bytes))
    }
}

/// Validate `upload` and write it to `media_dir`, returning the stored file name.
///
/// # Errors
///
/// Returns the validation errors of [ReceiptUpload::validate] or
/// [Error::ReceiptIoError] if the file could not be written.
pub async fn store_receipt(upload: &ReceiptUpload, media_dir: &FilePath) -> Result<String, Error> {
    let extension = upload.validate()?;
    let file_name = upload.file_name(extension);

    tokio::fs::create_dir_all(media_dir)
        .await
        .map_err(|error| Error::ReceiptIoError(error.to_string()))?;

    let path = media_dir.join(&file_name);

    if tokio::fs::try_exists(&path).await.unwrap_or(false) {
        tracing::debug!("Receipt {file_name} already exists, reusing it");
        return Ok(file_name);
    }

    tokio::fs::write(&path, &upload.bytes)
        .await
        .map_err(|error| Error::ReceiptIoError(error.to_string()))?;

    tracing::info!("Stored receipt {file_name} ({} bytes)", upload.bytes.len());

    Ok(file_name)
}

/// Delete the receipt files in `file_names` that no expense refers to anymore.
///
/// Failures are logged and otherwise ignored, a leftover file does no harm.
pub fn remove_unused_receipts(file_names: &[String], media_dir: &FilePath, connection: &Connection) {
    for file_name in file_names {
        match is_receipt_in_use(file_name, connection) {
            Ok(false) => {}
            Ok(true) => continue,
            Err(error) => {
                tracing::warn!("Could not check whether receipt {file_name} is in use: {error}");
                continue;
            }
        }

        if !is_safe_file_name(file_name) {
            tracing::warn!("Refusing to delete receipt with unexpected name {file_name:?}");
            continue;
        }

        match std::fs::remove_file(media_dir.join(file_name)) {
            Ok(()) => tracing::debug!("Removed unused receipt {file_name}"),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
            Err(error) => tracing::warn!("Could not remove receipt {file_name}: {error}"),
        }
    }
}

/// Stored receipt names are a hex digest and an extension.
fn is_safe_file_name(file_name: &str) -> bool {
    !file_name.is_empty()
        && !file_name.starts_with('.')
        && file_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.')
}

fn content_type_for(file_name: &str) -> &'static str {
    let extension = file_name.rsplit('.').next().unwrap_or_default();

    RECEIPT_TYPES
        .iter()
        .find(|(_, known)| extension.eq_ignore_ascii_case(known))
        .map(|(content_type, _)| *content_type)
        .unwrap_or("application/octet-stream")
}

/// The state needed to serve receipt images.
#[derive(Debug, Clone)]
pub struct ReceiptState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The directory receipt images are stored in.
    pub media_dir: PathBuf,
}

impl FromRef<AppState> for ReceiptState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            media_dir: state.media_dir.clone(),
        }
    }
}

/// Serve the receipt image of an expense to the owner of the expense.
pub async fn get_receipt(
    Path(expense_id): Path<ExpenseId>,
    State(state): State<ReceiptState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let receipt = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_expense(expense_id, user_id, &connection)?.receipt
    };

    let Some(file_name) = receipt.filter(|file_name| is_safe_file_name(file_name)) else {
        return Err(Error::NotFound);
    };

    let bytes = match tokio::fs::read(state.media_dir.join(&file_name)).await {
        Ok(bytes) => bytes,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!("Receipt {file_name} of expense {expense_id} is missing");
            return Err(Error::NotFound);
        }
        Err(error) => return Err(Error::ReceiptIoError(error.to_string())),
    };

    Ok(([(CONTENT_TYPE, content_type_for(&file_name))], bytes).into_response())
}
