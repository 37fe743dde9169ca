use std::sync::Arc;

use tracing::info;

use super::model::{Book, BookDraft, BookPatch};
use crate::auth::authorize_owner;
use crate::error::AppError;
use crate::store::{CollectionsExt, RecordStore};
use crate::uploads::{ImageProcessor, Upload};

/// Book CRUD with owner checks and cover processing.
#[derive(Clone)]
pub struct Catalog<S> {
    store: S,
    images: Arc<dyn ImageProcessor>,
    public_url: String,
}

impl<S: RecordStore> Catalog<S> {
    /// `public_url` is the base the image URLs in responses are built on.
    pub fn new(store: S, images: Arc<dyn ImageProcessor>, public_url: impl Into<String>) -> Self {
        Self {
            store,
            images,
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Rewrite the stored file name into an absolute image URL.
    pub fn present(&self, mut book: Book) -> Book {
        if !book.image_url.is_empty() {
            book.image_url = format!("{}/images/{}", self.public_url, book.image_url);
        }
        book
    }

    pub fn list(&self) -> Result<Vec<Book>, AppError> {
        let books = self.store.collection::<Book>().all()?;
        Ok(books.into_iter().map(|b| self.present(b)).collect())
    }

    pub fn get_by_id(&self, id: &str) -> Result<Book, AppError> {
        self.load(id).map(|b| self.present(b))
    }

    /// Store a new unrated book owned by `owner_id`. The returned book keeps
    /// the bare image file name.
    pub fn create(
        &self,
        owner_id: &str,
        draft: BookDraft,
        image: Option<&Upload>,
    ) -> Result<Book, AppError> {
        let mut book = Book::new(owner_id, draft);
        if let Some(upload) = image {
            book.image_url = self.images.process(upload)?;
        }

        self.store.collection::<Book>().insert(&book)?;

        info!(book_id = %book.id, owner_id, "Book created");
        Ok(book)
    }

    pub fn update(
        &self,
        id: &str,
        caller_id: &str,
        patch: BookPatch,
        image: Option<&Upload>,
    ) -> Result<(), AppError> {
        let book = self.load(id)?;
        authorize_owner(&book.user_id, caller_id)?;

        // Owners never change, so the cover is encoded outside the edit below.
        let image_name = image.map(|upload| self.images.process(upload)).transpose()?;

        self.store
            .collection::<Book>()
            .modify(id, &mut |book: &mut Book| {
                if let Some(name) = &image_name {
                    book.image_url = name.clone();
                }
                patch.apply(book);
                true
            })?
            .ok_or(AppError::NotFound)?;

        info!(book_id = id, "Book updated");
        Ok(())
    }

    pub fn delete(&self, id: &str, caller_id: &str) -> Result<(), AppError> {
        let book = self.load(id)?;
        authorize_owner(&book.user_id, caller_id)?;

        if !self.store.collection::<Book>().delete(id)? {
            return Err(AppError::NotFound);
        }

        info!(book_id = id, "Book deleted");
        Ok(())
    }

    fn load(&self, id: &str) -> Result<Book, AppError> {
        self.store
            .collection::<Book>()
            .get(id)?
            .ok_or(AppError::NotFound)
    }
}
