//! Route handlers. Each one maps its failures to an [`AppError`], which
//! renders as a status code plus a short plain-text message.

use std::sync::Arc;

use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::extract::AuthUser;
use super::multipart::BookForm;
use super::state::AppState;
use crate::auth::Login;
use crate::book::{Book, BookDraft, BookPatch, DEFAULT_TOP_RATED};
use crate::error::AppError;
use crate::store::RecordStore;

type AppStateRef<S> = State<Arc<AppState<S>>>;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    #[serde(alias = "grade")]
    pub rating: i64,
}

/// Run CPU-heavy or file-writing work (bcrypt, image encoding, store
/// mutations) off the async workers.
async fn blocking<T, F>(work: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal(format!("blocking task failed: {e}")))?
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload.map(|Json(body)| body).map_err(|e| {
        debug!("Rejected JSON body: {e}");
        AppError::validation("Malformed JSON body")
    })
}

fn multipart_body(payload: Result<Multipart, MultipartRejection>) -> Result<Multipart, AppError> {
    payload.map_err(|e| {
        debug!("Rejected multipart body: {e}");
        AppError::validation("Expected a multipart/form-data body")
    })
}

pub async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// `POST /api/auth/signup`
pub async fn signup<S: RecordStore + Clone + 'static>(
    State(state): AppStateRef<S>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<&'static str, AppError> {
    let credentials = json_body(payload)?;
    blocking(move || {
        state
            .auth
            .signup(&credentials.email, &credentials.password)
            .map(|_| ())
    })
    .await?;
    Ok("Sign up")
}

/// `POST /api/auth/login`
pub async fn login<S: RecordStore + Clone + 'static>(
    State(state): AppStateRef<S>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<Login>, AppError> {
    let credentials = json_body(payload)
        .map_err(|_| AppError::validation("Invalid email or password"))?;
    let login =
        blocking(move || state.auth.login(&credentials.email, &credentials.password)).await?;
    Ok(Json(login))
}

/// `GET /api/books`
pub async fn list_books<S: RecordStore + Clone + 'static>(
    State(state): AppStateRef<S>,
) -> Result<Json<Vec<Book>>, AppError> {
    Ok(Json(state.catalog.list()?))
}

/// `GET /api/books/bestrating`
pub async fn best_rating<S: RecordStore + Clone + 'static>(
    State(state): AppStateRef<S>,
) -> Result<Json<Vec<Book>>, AppError> {
    let books = state.ratings.top_rated(DEFAULT_TOP_RATED)?;
    Ok(Json(
        books.into_iter().map(|b| state.catalog.present(b)).collect(),
    ))
}

/// `GET /api/books/:id`
pub async fn get_book<S: RecordStore + Clone + 'static>(
    State(state): AppStateRef<S>,
    Path(id): Path<String>,
) -> Result<Json<Book>, AppError> {
    Ok(Json(state.catalog.get_by_id(&id)?))
}

/// `POST /api/books`
pub async fn create_book<S: RecordStore + Clone + 'static>(
    State(state): AppStateRef<S>,
    AuthUser(user_id): AuthUser,
    payload: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, AppError> {
    let form = BookForm::<BookDraft>::read(multipart_body(payload)?).await?;
    blocking(move || {
        state
            .catalog
            .create(&user_id, form.book, form.image.as_ref())
            .map(|_| ())
    })
    .await?;
    Ok(Json(json!({ "message": "Book posted" })))
}

/// `PUT /api/books/:id`
pub async fn update_book<S: RecordStore + Clone + 'static>(
    State(state): AppStateRef<S>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    payload: Result<Multipart, MultipartRejection>,
) -> Result<&'static str, AppError> {
    let form = BookForm::<BookPatch>::read(multipart_body(payload)?).await?;
    blocking(move || {
        state
            .catalog
            .update(&id, &user_id, form.book, form.image.as_ref())
    })
    .await?;
    Ok("Book updated")
}

/// `DELETE /api/books/:id`
pub async fn delete_book<S: RecordStore + Clone + 'static>(
    State(state): AppStateRef<S>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<&'static str, AppError> {
    blocking(move || state.catalog.delete(&id, &user_id)).await?;
    Ok("Book deleted")
}

/// `POST /api/books/:id/rating`
pub async fn rate_book<S: RecordStore + Clone + 'static>(
    State(state): AppStateRef<S>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<RateRequest>, JsonRejection>,
) -> Result<Json<Book>, AppError> {
    if id.is_empty() || id == "undefined" {
        return Err(AppError::validation("Book id is missing"));
    }
    let request = json_body(payload)?;

    let book = blocking({
        let state = state.clone();
        move || state.ratings.rate(&id, &user_id, request.rating)
    })
    .await?;
    Ok(Json(state.catalog.present(book)))
}
