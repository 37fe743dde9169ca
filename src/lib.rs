//! bookshelf: book catalog and rating backend.
//!
//! Users sign up and log in with an email and password and receive a bearer
//! token. Any authenticated user can add books (with an optional cover
//! image, re-encoded to WebP), only the owner may edit or delete them, and
//! every user may grade each book once. Each accepted grade recomputes the
//! book's integer average.
//!
//! ## Layout
//!
//! - [`store`]: typed record storage (in-memory or JSON snapshot file).
//! - [`auth`]: credentials, bearer tokens, the owner gate.
//! - [`book`]: the book model, [`Catalog`] and [`RatingEngine`].
//! - [`uploads`]: cover image processing.
//! - `http` (feature `http`, default): axum router and server.
//!
//! ## Quick Start
//!
//! ```ignore
//! use bookshelf::{http, Config, InMemoryStore};
//!
//! let config = Config::from_env()?;
//! let state = http::AppState::new(InMemoryStore::new(), config);
//! http::serve(state).await?;
//! ```

pub mod auth;
pub mod book;
pub mod config;
pub mod error;
pub mod store;
pub mod uploads;

#[cfg(feature = "http")]
pub mod http;

pub use auth::{authorize_owner, Auth, Claims, Login, TokenSigner, User};
pub use book::{Book, BookDraft, BookPatch, Catalog, Rating, RatingEngine};
pub use config::{Config, ConfigError};
pub use error::AppError;
pub use store::{
    Collection, CollectionsExt, InMemoryStore, JsonFileStore, Record, RecordStore, StoreError,
};
pub use uploads::{ImageError, ImageProcessor, Upload, WebpProcessor};
