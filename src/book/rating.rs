//! One vote per user per book, with a stored integer average.
//!
//! `average_rating` is recomputed on every accepted vote and never on read.
//! The duplicate check, the append and the recompute run inside one
//! [`RecordStore::modify_record`] call, so concurrent votes on a book never
//! overwrite each other.

use std::cmp::Ordering;

use tracing::info;

use super::model::{Book, Rating};
use crate::error::AppError;
use crate::store::{CollectionsExt, RecordStore};

/// Number of books returned by the best-rating listing.
pub const DEFAULT_TOP_RATED: usize = 3;

/// Mean grade rounded half away from zero, `None` when there are no grades.
pub fn average(ratings: &[Rating]) -> Option<i64> {
    if ratings.is_empty() {
        return None;
    }
    // The mean of i64 values fits in i64; only the sum needs the wider type.
    let sum: i128 = ratings.iter().map(|r| i128::from(r.grade)).sum();
    let count = ratings.len() as i128;

    let (quotient, remainder) = (sum / count, sum % count);
    let rounded = if 2 * remainder.abs() >= count {
        quotient + sum.signum()
    } else {
        quotient
    };
    i64::try_from(rounded).ok()
}

#[derive(Debug, Clone)]
pub struct RatingEngine<S> {
    store: S,
}

impl<S: RecordStore> RatingEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Record `user_id`'s grade for a book and return the updated book.
    pub fn rate(&self, book_id: &str, user_id: &str, grade: i64) -> Result<Book, AppError> {
        let mut already_rated = false;
        let book = self
            .store
            .collection::<Book>()
            .modify(book_id, &mut |book: &mut Book| {
                if book.rated_by(user_id) {
                    already_rated = true;
                    return false;
                }
                book.ratings.push(Rating {
                    user_id: user_id.to_string(),
                    grade,
                });
                book.average_rating = average(&book.ratings);
                true
            })?
            .ok_or(AppError::NotFound)?;

        if already_rated {
            return Err(AppError::AlreadyRated);
        }

        info!(book_id, user_id, grade, "Rating recorded");
        Ok(book)
    }

    /// Up to `n` books by descending average. Unrated books come last.
    pub fn top_rated(&self, n: usize) -> Result<Vec<Book>, AppError> {
        let mut books = self.store.collection::<Book>().all()?;
        books.sort_by(|a, b| by_average_desc(a, b).then_with(|| a.id.cmp(&b.id)));
        books.truncate(n);
        Ok(books)
    }
}

fn by_average_desc(a: &Book, b: &Book) -> Ordering {
    match (a.average_rating, b.average_rating) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
