//! Error types shared by the auth, rating and catalog layers.

use thiserror::Error;

use crate::store::StoreError;
use crate::uploads::ImageError;

/// Error type for every bookshelf operation.
///
/// The display string of the client-facing variants is the message sent in
/// the response body. Internal variants carry details for the logs only.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed input (bad email, missing field, undecodable payload).
    #[error("{0}")]
    Validation(String),
    #[error("Email already exists")]
    EmailTaken,
    #[error("You have already rated this book")]
    AlreadyRated,
    /// Missing, malformed or expired bearer token.
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Wrong email")]
    UnknownEmail,
    #[error("Wrong pass")]
    WrongPassword,
    /// Caller is not the owner of the resource.
    #[error("Forbidden")]
    Forbidden,
    #[error("Book not found")]
    NotFound,
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("image error: {0}")]
    Image(#[from] ImageError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    /// Map this error to an HTTP status code.
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Validation(_) => 400,
            AppError::EmailTaken => 400,
            AppError::AlreadyRated => 400,
            AppError::Unauthorized => 401,
            AppError::UnknownEmail => 401,
            AppError::WrongPassword => 401,
            AppError::Forbidden => 403,
            AppError::NotFound => 404,
            AppError::Store(_) => 500,
            AppError::Image(_) => 500,
            AppError::Internal(_) => 500,
        }
    }

    pub fn is_internal(&self) -> bool {
        self.status_code() >= 500
    }

    /// Message safe to show to the client.
    pub fn public_message(&self) -> String {
        if self.is_internal() {
            "Something went wrong".to_string()
        } else {
            self.to_string()
        }
    }
}

#[cfg(feature = "http")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        if self.is_internal() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, self.public_message()).into_response()
    }
}
