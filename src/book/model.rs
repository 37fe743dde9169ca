use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::store::Record;

/// One user's grade for one book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub user_id: String,
    pub grade: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(rename = "_id")]
    pub id: String,
    /// Owner, set at creation.
    pub user_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub year: i64,
    #[serde(default)]
    pub genre: String,
    /// Stored file name; read paths rewrite it to an absolute URL.
    #[serde(default)]
    pub image_url: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub ratings: Vec<Rating>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<i64>,
}

impl Book {
    /// A new, unrated book owned by `owner_id`.
    pub fn new(owner_id: impl Into<String>, draft: BookDraft) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: owner_id.into(),
            title: draft.title,
            author: draft.author,
            year: draft.year,
            genre: draft.genre,
            image_url: String::new(),
            ratings: Vec::new(),
            average_rating: None,
        }
    }

    pub fn rated_by(&self, user_id: &str) -> bool {
        self.ratings.iter().any(|r| r.user_id == user_id)
    }
}

impl Record for Book {
    const COLLECTION: &'static str = "books";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Fields accepted when creating a book.
///
/// Anything else a client sends (owner, ratings, average) is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default, deserialize_with = "lenient_year")]
    pub year: i64,
    #[serde(default)]
    pub genre: String,
}

/// Partial update. Empty strings and a zero year count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "lenient_optional_year")]
    pub year: Option<i64>,
    #[serde(default)]
    pub genre: Option<String>,
}

impl BookPatch {
    /// Copy the provided fields onto `book`. Ratings and owner are untouched.
    pub fn apply(&self, book: &mut Book) {
        if let Some(title) = self.title.as_deref().filter(|s| !s.is_empty()) {
            book.title = title.to_string();
        }
        if let Some(author) = self.author.as_deref().filter(|s| !s.is_empty()) {
            book.author = author.to_string();
        }
        if let Some(year) = self.year.filter(|y| *y != 0) {
            book.year = year;
        }
        if let Some(genre) = self.genre.as_deref().filter(|s| !s.is_empty()) {
            book.genre = genre.to_string();
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Rating>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Rating>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Clients send the year either as a number or as a numeric string.
fn year_from_value(value: Value) -> Result<Option<i64>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| format!("year must be an integer, got {n}")),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| format!("year must be an integer, got {s:?}")),
        other => Err(format!("year must be an integer, got {other}")),
    }
}

fn lenient_year<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_optional_year(deserializer)?.unwrap_or_default())
}

fn lenient_optional_year<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    year_from_value(Value::deserialize(deserializer)?).map_err(serde::de::Error::custom)
}
