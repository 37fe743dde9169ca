//! `multipart/form-data` book submissions: a `book` field holding the book as
//! a JSON string, plus an optional `image` file field.

use axum::extract::multipart::{Multipart, MultipartError};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::AppError;
use crate::uploads::Upload;

pub struct BookForm<T> {
    pub book: T,
    pub image: Option<Upload>,
}

impl<T: DeserializeOwned> BookForm<T> {
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut book = None;
        let mut image = None;

        while let Some(field) = multipart.next_field().await.map_err(malformed)? {
            let name = field.name().map(str::to_owned);
            match name.as_deref() {
                Some("book") => {
                    let text = field.text().await.map_err(malformed)?;
                    let parsed = serde_json::from_str::<T>(&text).map_err(|e| {
                        debug!("Undecodable book field: {e}");
                        AppError::validation("Malformed book payload")
                    })?;
                    book = Some(parsed);
                }
                Some("image") => {
                    let file_name = field.file_name().unwrap_or("image").to_string();
                    let bytes = field.bytes().await.map_err(malformed)?;
                    if !bytes.is_empty() {
                        image = Some(Upload {
                            file_name,
                            bytes: bytes.to_vec(),
                        });
                    }
                }
                other => debug!("Ignoring multipart field {other:?}"),
            }
        }

        let book = book.ok_or_else(|| AppError::validation("Missing book field"))?;
        Ok(Self { book, image })
    }
}

fn malformed(err: MultipartError) -> AppError {
    debug!("Malformed multipart body: {err}");
    AppError::validation("Malformed multipart body")
}
