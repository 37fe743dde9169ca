//! Books: the stored model, the catalog (CRUD behind owner checks) and the
//! rating engine.

mod catalog;
mod model;
pub mod rating;

pub use catalog::Catalog;
pub use model::{Book, BookDraft, BookPatch, Rating};
pub use rating::{average, RatingEngine, DEFAULT_TOP_RATED};
